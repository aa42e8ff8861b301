//! Twitter publisher: upload the picture, then post it.
//!
//! Two signed requests per picture:
//!
//! 1. `POST media/upload.json` (v1.1, multipart) returns a `media_id_string`.
//! 2. `POST /2/tweets` with `{"media": {"media_ids": [id]}}` creates the post.
//!
//! Any non-success status is returned as an error carrying the response body.
//! Nothing is retried.

use anyhow::{Context, Result, bail};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::{Credentials, OAuthSigner, Publisher};
use crate::common::constants::*;
use crate::logger::Log;
use crate::{log_debug, log_info};

#[derive(Debug, Deserialize)]
struct MediaUpload {
    media_id_string: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    data: CreatedPostData,
}

#[derive(Debug, Deserialize)]
struct CreatedPostData {
    id: String,
}

pub struct TwitterPublisher {
    client: Client,
    signer: OAuthSigner,
    upload_url: String,
    post_url: String,
    log: Arc<dyn Log>,
}

impl TwitterPublisher {
    /// Build the signer and HTTP client. Performed once, before monitoring
    /// starts.
    pub fn authenticate(credentials: Credentials, log: Arc<dyn Log>) -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("birdorsquirrel/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            signer: OAuthSigner::new(credentials),
            upload_url: MEDIA_UPLOAD_URL.to_string(),
            post_url: CREATE_POST_URL.to_string(),
            log,
        })
    }

    fn upload_media(&self, image: &Path) -> Result<String> {
        let bytes = fs::read(image)
            .with_context(|| format!("Failed to read picture {}", image.display()))?;
        let file_name = image
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.jpg".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/jpeg")
            .context("Invalid media type")?;

        let authorization = self
            .signer
            .authorization_header("POST", &self.upload_url, &[])?;
        let response = self
            .client
            .post(&self.upload_url)
            .header(AUTHORIZATION, authorization)
            .multipart(Form::new().part("media", part))
            .send()
            .context("Media upload request failed")?;

        let upload: MediaUpload = check_status(response, "Media upload")?
            .json()
            .context("Unexpected media upload response")?;
        log_debug!(self.log, "Uploaded media {}", upload.media_id_string);
        Ok(upload.media_id_string)
    }

    fn create_post(&self, media_id: &str) -> Result<String> {
        let authorization = self
            .signer
            .authorization_header("POST", &self.post_url, &[])?;
        let body = serde_json::json!({ "media": { "media_ids": [media_id] } });

        let response = self
            .client
            .post(&self.post_url)
            .header(AUTHORIZATION, authorization)
            .json(&body)
            .send()
            .context("Create post request failed")?;

        let created: CreatedPost = check_status(response, "Create post")?
            .json()
            .context("Unexpected create post response")?;
        Ok(created.data.id)
    }
}

fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    bail!("{what} failed with HTTP {status}: {}", body.trim());
}

impl Publisher for TwitterPublisher {
    fn publish(&self, image: &Path) -> Result<()> {
        let media_id = self.upload_media(image)?;
        let post_id = self.create_post(&media_id)?;
        log_info!(self.log, "Tweet sent ({post_id}).");
        Ok(())
    }
}
