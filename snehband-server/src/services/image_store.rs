//! Profile photo uploads to the image CDN

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use snehband_common::config::CdnConfig;
use snehband_common::{Error, Result};
use tracing::{error, info};

const CDN_API_BASE: &str = "https://api.cloudinary.com/v1_1";
const USER_AGENT: &str = concat!("snehband-server/", env!("CARGO_PKG_VERSION"));

/// Stores an uploaded image and returns its public URL
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, file_name: &str, content_type: &str, bytes: Vec<u8>) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Signed uploads to the Cloudinary image API
pub struct CdnImageStore {
    http_client: reqwest::Client,
    upload_url: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

/// Hex SHA-256 over the sorted signed parameters followed by the API secret
pub fn upload_signature(folder: &str, timestamp: i64, api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("folder={}&timestamp={}{}", folder, timestamp, api_secret).as_bytes());
    format!("{:x}", hasher.finalize())
}

impl CdnImageStore {
    pub fn from_config(config: &CdnConfig) -> Result<Self> {
        let (Some(cloud_name), Some(api_key), Some(api_secret)) =
            (&config.cloud_name, &config.api_key, &config.api_secret)
        else {
            return Err(Error::Config("CDN credentials are incomplete".to_string()));
        };

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;

        info!(cloud_name = %cloud_name, folder = %config.folder, "Image CDN uploads enabled");
        Ok(Self {
            http_client,
            upload_url: format!("{}/{}/image/upload", CDN_API_BASE, cloud_name),
            api_key: api_key.clone(),
            api_secret: api_secret.clone(),
            folder: config.folder.clone(),
        })
    }
}

#[async_trait]
impl ImageStore for CdnImageStore {
    async fn upload(&self, file_name: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        let timestamp = chrono::Utc::now().timestamp();
        let signature = upload_signature(&self.folder, timestamp, &self.api_secret);

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| Error::InvalidInput(format!("Invalid content type: {}", e)))?;
        let form = Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", self.folder.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .http_client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("CDN upload request failed: {}", e);
                Error::Upstream(format!("Image upload failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "CDN rejected upload");
            return Err(Error::Upstream(format!("Image CDN returned {}", status)));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Unreadable CDN response: {}", e)))?;

        info!(url = %uploaded.secure_url, "Image uploaded");
        Ok(uploaded.secure_url)
    }
}

/// Used when no CDN is configured; every upload fails
pub struct DisabledImageStore;

#[async_trait]
impl ImageStore for DisabledImageStore {
    async fn upload(&self, _file_name: &str, _content_type: &str, _bytes: Vec<u8>) -> Result<String> {
        Err(Error::Config("Image uploads are not configured".to_string()))
    }
}
