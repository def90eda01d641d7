//! Content store client for movement evidence
//!
//! Uploads attachment bytes to the platform's content store and returns a
//! stable retrievable URL. Uploads happen before the ledger transaction is
//! opened and are never retried or cleaned up by the coordinator: a
//! transaction that fails after a successful upload leaves the file orphaned
//! in the store.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use uuid::Uuid;

use crate::config::ContentStoreConfig;
use crate::error::{AppError, AppResult};
use shared::types::Attachment;

type HmacSha256 = Hmac<Sha256>;

/// Content store client
#[derive(Clone)]
pub struct ContentStoreClient {
    client: Client,
    endpoint: String,
    bucket: String,
    public_base_url: String,
    signing_key: String,
}

impl ContentStoreClient {
    /// Create a new client from configuration
    pub fn new(config: &ContentStoreConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            signing_key: config.signing_key.clone(),
        }
    }

    /// Upload a file and return its evidence reference.
    ///
    /// The stored object key is unique per upload so evidence files never
    /// overwrite each other, even with repeated file names.
    pub async fn upload(
        &self,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<Attachment> {
        let key = format!("{}/{}", Uuid::new_v4(), sanitize_file_name(name));
        let url = format!("{}/{}/{}", self.endpoint, self.bucket, key);
        let signature = self.sign(&bytes)?;

        let response = self
            .client
            .put(&url)
            .header("content-type", content_type)
            .header("x-kardex-signature", signature)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::AttachmentUploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::AttachmentUploadFailed(format!(
                "content store returned {}",
                response.status()
            )));
        }

        tracing::debug!("Uploaded evidence file {} to {}", name, key);

        Ok(Attachment {
            name: name.to_string(),
            url: format!("{}/{}/{}", self.public_base_url, self.bucket, key),
        })
    }

    /// Sign the request body with the shared upload key
    fn sign(&self, body: &[u8]) -> AppResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.signing_key.as_bytes())
            .map_err(|_| AppError::AttachmentUploadFailed("invalid signing key".to_string()))?;
        mac.update(body);
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

/// Keep object keys URL-safe
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "attachment".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("nota fiscal 42.pdf"), "nota_fiscal_42.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name(""), "attachment");
    }
}
