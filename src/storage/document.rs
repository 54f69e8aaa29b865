//! Document-collection store: each record is POSTed as one JSON document
//! to `{endpoint}/{collection}`.

use super::DurableStore;
use crate::error::StoreError;
use crate::scan::ScanRecord;
use std::time::Duration;

pub struct DocumentStore {
    client: reqwest::blocking::Client,
    url: String,
}

impl DocumentStore {
    pub fn new(endpoint: &str, collection: &str) -> Result<Self, StoreError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| StoreError::Remote(e.to_string()))?;
        Ok(Self {
            client,
            url: collection_url(endpoint, collection),
        })
    }
}

fn collection_url(endpoint: &str, collection: &str) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        collection.trim_start_matches('/')
    )
}

impl DurableStore for DocumentStore {
    fn append(&self, record: &ScanRecord) -> Result<(), StoreError> {
        let res = self
            .client
            .post(&self.url)
            .json(record)
            .send()
            .map_err(|e| StoreError::Remote(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().unwrap_or_default();
            return Err(StoreError::Remote(format!("{} {}", status, text)));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "document"
    }
}
