use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::PaletteConfig;
use crate::error::DataLoadError;
use crate::pipeline::services::emotion::dataset_loader::{json_records, records_to_table, RawTable};

/// Largest page the rows endpoint serves.
pub const MAX_PAGE_SIZE: usize = 100;

/// Where the reference palette is read from.
#[derive(Debug, Clone)]
pub enum DatasetSource {
    File(PathBuf),
    Hub(HubDataset),
}

impl DatasetSource {
    /// A configured local file takes precedence over the named dataset.
    pub fn from_config(config: &PaletteConfig) -> Self {
        match &config.path {
            Some(path) => DatasetSource::File(path.clone()),
            None => DatasetSource::Hub(HubDataset::from_config(config)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DatasetSource::File(path) => path.display().to_string(),
            DatasetSource::Hub(hub) => hub.name.clone(),
        }
    }
}

/// A named dataset split served page by page over the rows API.
#[derive(Debug, Clone)]
pub struct HubDataset {
    pub name: String,
    pub config: String,
    pub split: String,
    pub endpoint: String,
    pub page_size: usize,
    pub timeout: Duration,
}

impl HubDataset {
    pub fn from_config(config: &PaletteConfig) -> Self {
        Self {
            name: config.dataset.clone(),
            config: config.dataset_config.clone(),
            split: config.split.clone(),
            endpoint: config.rows_endpoint.clone(),
            page_size: config.page_size,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Downloads every row of the split and flattens the records into a table.
    pub fn fetch(&self) -> Result<RawTable, DataLoadError> {
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);

        let mut records = Vec::new();
        loop {
            let page = self.fetch_page(&agent, records.len(), page_size)?;
            let total = page.get("num_rows_total").and_then(Value::as_u64);
            let rows = json_records(page);
            let received = rows.len();
            records.extend(rows);
            debug!(
                "Fetched {} rows of {} ({} so far)",
                received,
                self.name,
                records.len()
            );

            let more = match total {
                Some(total) => (records.len() as u64) < total,
                None => received == page_size,
            };
            if received == 0 || !more {
                break;
            }
        }

        info!("Fetched {} rows from dataset {}", records.len(), self.name);
        records_to_table(records).map_err(|reason| self.fetch_error(reason))
    }

    fn fetch_page(&self, agent: &ureq::Agent, offset: usize, length: usize) -> Result<Value, DataLoadError> {
        let response = agent
            .get(&self.endpoint)
            .query("dataset", &self.name)
            .query("config", &self.config)
            .query("split", &self.split)
            .query("offset", &offset.to_string())
            .query("length", &length.to_string())
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => {
                    self.fetch_error(format!("{} answered with HTTP {}", self.endpoint, code))
                }
                other => self.fetch_error(other.to_string()),
            })?;

        let body = response
            .into_string()
            .map_err(|e| self.fetch_error(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| self.fetch_error(format!("invalid JSON page: {e}")))
    }

    fn fetch_error(&self, reason: String) -> DataLoadError {
        DataLoadError::FetchError(self.name.clone(), reason)
    }
}
