//! Poster image storage
//!
//! Posters live in a bucket of a Supabase-compatible object store. Objects
//! are addressed by path inside the bucket; events only keep the public URL.

use super::{ClientError, error_message};
use reqwest::header::{self, HeaderValue};
use reqwest::{Client, Response};
use serde_json::json;
use std::path::Path;
use tracing::{debug, info, warn};

/// Folder inside the bucket that uploads go to
const UPLOAD_PREFIX: &str = "posters";

#[derive(Clone)]
pub struct PosterStore {
    http: Client,
    base_url: String,
    bucket: String,
    api_key: String,
}

impl PosterStore {
    /// Create a store for `bucket` on the storage service at `base_url`
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let bucket = bucket.into().trim_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("storage url is required".into()));
        }
        if bucket.is_empty() {
            return Err(ClientError::Configuration("storage bucket is required".into()));
        }

        let http = Client::builder()
            .user_agent(concat!("eventdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            bucket,
            api_key: api_key.into(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public URL of an object
    pub fn public_url(&self, object_path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            object_path.trim_start_matches('/')
        )
    }

    /// Object path behind a public URL of this bucket
    pub fn object_path(&self, public_url: &str) -> Option<String> {
        let prefix = self.public_url("");
        public_url
            .strip_prefix(&prefix)
            .filter(|path| !path.is_empty())
            .map(str::to_string)
    }

    /// Upload an image and return its object path
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ClientError> {
        let name = sanitize_file_name(file_name)
            .ok_or_else(|| ClientError::Storage(format!("invalid file name '{file_name}'")))?;
        let object_path = format!(
            "{UPLOAD_PREFIX}/{}_{name}",
            chrono::Utc::now().timestamp_millis()
        );

        let url = format!(
            "{}/storage/v1/object/{}/{object_path}",
            self.base_url, self.bucket
        );
        let response = self
            .authorized(self.http.post(url))
            .header(header::CONTENT_TYPE, HeaderValue::from_static(content_type_for(&name)))
            .body(bytes)
            .send()
            .await?;
        check(response, "upload").await?;

        info!(path = %object_path, "Poster uploaded");
        Ok(object_path)
    }

    /// Delete objects by path
    pub async fn remove(&self, object_paths: &[String]) -> Result<(), ClientError> {
        if object_paths.is_empty() {
            return Ok(());
        }

        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let response = self
            .authorized(self.http.delete(url))
            .json(&json!({ "prefixes": object_paths }))
            .send()
            .await?;
        check(response, "delete").await?;

        debug!(count = object_paths.len(), "Posters removed");
        Ok(())
    }

    /// Swap the poster at `existing_url` for a new upload and return the
    /// new public URL. Failing to delete the old object does not stop the
    /// upload; the orphan is only logged.
    pub async fn replace(
        &self,
        existing_url: Option<&str>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ClientError> {
        if let Some(old_path) = existing_url.and_then(|url| self.object_path(url)) {
            if let Err(e) = self.remove(std::slice::from_ref(&old_path)).await {
                warn!(path = %old_path, error = %e, "Failed to delete previous poster");
            }
        }

        let object_path = self.upload(file_name, bytes).await?;
        Ok(self.public_url(&object_path))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

async fn check(response: Response, operation: &str) -> Result<(), ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let message = error_message(response).await;
    Err(ClientError::Storage(format!(
        "{operation} failed ({status}): {message}"
    )))
}

/// Last path component with whitespace replaced, or None if nothing is left
fn sanitize_file_name(file_name: &str) -> Option<String> {
    let name = Path::new(file_name.trim()).file_name()?.to_str()?;
    let name: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if name.is_empty() { None } else { Some(name) }
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PosterStore {
        PosterStore::new("https://storage.example.com/", "posters", "anon-key").unwrap()
    }

    #[test]
    fn public_url_round_trips_to_object_path() {
        let store = store();
        let url = store.public_url("posters/1700000000000_flyer.png");

        assert_eq!(
            url,
            "https://storage.example.com/storage/v1/object/public/posters/posters/1700000000000_flyer.png"
        );
        assert_eq!(
            store.object_path(&url).as_deref(),
            Some("posters/1700000000000_flyer.png")
        );
    }

    #[test]
    fn foreign_urls_have_no_object_path() {
        let store = store();
        assert_eq!(store.object_path("https://cdn.example.com/flyer.png"), None);
        assert_eq!(store.object_path(&store.public_url("")), None);
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("/tmp/My Flyer.png").as_deref(), Some("My_Flyer.png"));
        assert_eq!(sanitize_file_name("poster.jpg").as_deref(), Some("poster.jpg"));
        assert_eq!(sanitize_file_name("/"), None);
        assert_eq!(sanitize_file_name(""), None);
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("a.PNG"), "image/png");
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("a.bin"), "application/octet-stream");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn requires_url_and_bucket() {
        assert!(matches!(
            PosterStore::new("", "posters", "k"),
            Err(ClientError::Configuration(_))
        ));
        assert!(matches!(
            PosterStore::new("https://s.example.com", "/", "k"),
            Err(ClientError::Configuration(_))
        ));
    }
}
