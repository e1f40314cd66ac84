//! Cloud backup through a spreadsheet script endpoint.
//!
//! The endpoint accepts the full snapshot as a plain-text JSON body on POST
//! and returns the last stored snapshot on GET.

use reqwest::{Client, ClientBuilder};
use tracing::{debug, info, warn};

use super::{BackupSnapshot, Result, StorageError};

/// Client for the spreadsheet-backed backup endpoint.
#[derive(Clone)]
pub struct CloudBackupClient {
    /// HTTP client
    client: Client,

    /// Script URL
    url: String,
}

impl CloudBackupClient {
    /// Create a new client for a script URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: ClientBuilder::new()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            url: url.into(),
        }
    }

    /// Script URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Upload a snapshot.
    pub async fn push(&self, snapshot: &BackupSnapshot) -> Result<()> {
        let body = serde_json::to_string(snapshot)?;
        debug!("Uploading backup ({} bytes)", body.len());

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(StorageError::Other(format!(
                "Backup endpoint error (status {}): {}",
                status, error_text
            )));
        }

        #[derive(serde::Deserialize)]
        struct Ack {
            status: Option<String>,
            message: Option<String>,
        }

        // The script answers {"status":"success"} or {"status":"error","message":..}.
        let text = response.text().await.unwrap_or_default();
        if let Ok(ack) = serde_json::from_str::<Ack>(&text) {
            if ack.status.as_deref() == Some("error") {
                return Err(StorageError::Other(
                    ack.message.unwrap_or_else(|| "backup rejected".to_string()),
                ));
            }
        }

        info!("Backup uploaded to cloud endpoint");
        Ok(())
    }

    /// Download the most recent snapshot.
    pub async fn pull(&self) -> Result<BackupSnapshot> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(StorageError::Other(format!(
                "Backup endpoint error (status {})",
                status
            )));
        }

        let text = response.text().await?;
        let snapshot = BackupSnapshot::from_json(&text)?;
        if snapshot.is_empty() {
            warn!("Cloud endpoint returned an empty backup");
            return Err(StorageError::NotFound("cloud backup".to_string()));
        }
        Ok(snapshot)
    }
}
