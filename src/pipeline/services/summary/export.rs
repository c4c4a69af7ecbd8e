use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::ExportError;

/// Writes `rows` as a comma separated file under `header`, replacing any existing file.
///
/// Missing parent directories are created. The header is written even when there are no rows.
pub fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<(), ExportError> {
    ensure_parent(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| ExportError::WriteError(e, path.to_path_buf()))?;

    writer
        .write_record(header)
        .map_err(|e| ExportError::WriteError(e, path.to_path_buf()))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| ExportError::WriteError(e, path.to_path_buf()))?;
    }
    writer
        .flush()
        .map_err(|e| ExportError::FlushError(e, path.to_path_buf()))?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn save_png(path: &Path, image: &image::RgbImage) -> Result<(), ExportError> {
    ensure_parent(path)?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| ExportError::ImageError(e, path.to_path_buf()))
}

fn ensure_parent(path: &Path) -> Result<(), ExportError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|e| ExportError::CreateDirError(e, parent.to_path_buf())),
        _ => Ok(()),
    }
}
