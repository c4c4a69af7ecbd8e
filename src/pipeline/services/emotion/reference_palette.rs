use std::sync::{Arc, Mutex};

use crate::common::RgbColor;
use crate::error::DataLoadError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    color: RgbColor,
    emotion: String,
}

impl ReferenceEntry {
    pub fn new(color: RgbColor, emotion: impl Into<String>) -> Self {
        Self {
            color,
            emotion: emotion.into(),
        }
    }

    pub fn color(&self) -> RgbColor {
        self.color
    }

    pub fn emotion(&self) -> &str {
        &self.emotion
    }
}

/// Known colors and their emotion labels, in dataset order. Never empty.
#[derive(Debug, Clone)]
pub struct ReferencePalette {
    entries: Vec<ReferenceEntry>,
}

impl ReferencePalette {
    pub fn new(entries: Vec<ReferenceEntry>) -> Result<Self, DataLoadError> {
        if entries.is_empty() {
            return Err(DataLoadError::Empty);
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Linear scan for the closest entry; the earliest entry wins ties.
    pub fn nearest(&self, color: RgbColor) -> &ReferenceEntry {
        let mut best = &self.entries[0];
        let mut best_distance = color.distance_squared(best.color);
        for entry in &self.entries[1..] {
            let d = color.distance_squared(entry.color);
            if d < best_distance {
                best = entry;
                best_distance = d;
            }
        }
        best
    }
}

static SHARED: Mutex<Option<Arc<ReferencePalette>>> = Mutex::new(None);

/// Returns the process-wide palette, running `load` only if none has been installed yet.
///
/// A failed load leaves the slot empty so a later call may try again.
pub fn shared_or_load<F>(load: F) -> Result<Arc<ReferencePalette>, DataLoadError>
where
    F: FnOnce() -> Result<ReferencePalette, DataLoadError>,
{
    let mut slot = SHARED.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(palette) = slot.as_ref() {
        return Ok(Arc::clone(palette));
    }
    let palette = Arc::new(load()?);
    *slot = Some(Arc::clone(&palette));
    Ok(palette)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> ReferencePalette {
        ReferencePalette::new(vec![
            ReferenceEntry::new(RgbColor::new(255, 0, 0), "Passion"),
            ReferenceEntry::new(RgbColor::new(0, 0, 255), "Calm"),
            ReferenceEntry::new(RgbColor::new(0, 0, 255), "Sadness"),
            ReferenceEntry::new(RgbColor::new(255, 255, 0), "Joy"),
        ])
        .unwrap()
    }

    #[test]
    fn exact_match_wins() {
        assert_eq!(palette().nearest(RgbColor::new(255, 255, 0)).emotion(), "Joy");
    }

    #[test]
    fn duplicates_resolve_to_first_entry() {
        assert_eq!(palette().nearest(RgbColor::new(0, 0, 255)).emotion(), "Calm");
    }

    #[test]
    fn equidistant_query_resolves_in_table_order() {
        let palette = ReferencePalette::new(vec![
            ReferenceEntry::new(RgbColor::new(0, 0, 0), "Dark"),
            ReferenceEntry::new(RgbColor::new(20, 0, 0), "Ember"),
        ])
        .unwrap();
        assert_eq!(palette.nearest(RgbColor::new(10, 0, 0)).emotion(), "Dark");
    }

    #[test]
    fn empty_palette_is_a_load_error() {
        assert!(matches!(
            ReferencePalette::new(Vec::new()),
            Err(DataLoadError::Empty)
        ));
    }

    #[test]
    fn shared_palette_loads_once() {
        let first = shared_or_load(|| Ok(palette())).unwrap();
        let second = shared_or_load(|| panic!("palette loaded twice")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
