// Avatar upload endpoint (multipart POST, `{ success }` reply).

use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::loader::{Payload, decode_payload, read_body, report_failure};
use crate::validate::Shape;

/// Reply to an upload; carries nothing beyond the `success` sentinel.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UploadResult {}

impl Payload for UploadResult {
    const TYPE_NAME: &'static str = "UploadResult";

    fn shape() -> Shape {
        Shape::new(Self::TYPE_NAME)
    }
}

pub struct UploadClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl UploadClient {
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    /// Upload a new avatar for the volunteer owning `auth_token`.
    pub async fn upload_avatar(
        &self,
        auth_token: &SecretString,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), Error> {
        debug!(size = bytes.len(), "uploading avatar to {}", self.endpoint);

        let result = self.send(auth_token, file_name, bytes).await;
        if let Err(ref e) = result {
            report_failure(UploadResult::TYPE_NAME, e);
        }
        result
    }

    async fn send(
        &self,
        auth_token: &SecretString,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), Error> {
        let form = Form::new()
            .text("authToken", auth_token.expose_secret().to_owned())
            .part("photo", Part::bytes(bytes).file_name(file_name.to_owned()));

        let resp = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;
        let body = read_body(resp, &self.endpoint).await?;
        decode_payload::<UploadResult>(&body).map(|_| ())
    }
}
