// Login endpoint
//
// POST exchanges an e-mail address and access code for a token pair.
// GET with `authToken` re-validates a persisted pair and returns the same
// payload, which is what the user loader reads.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, NotLoaded};
use crate::loader::{Payload, RemoteDataLoader, decode_payload, read_body, report_failure};
use crate::validate::{FieldKind, Shape};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user_token: String,
    pub auth_token: String,
    /// Unix seconds after which the token pair is no longer accepted.
    pub expiration_time: i64,
    pub abilities: Vec<String>,
}

impl fmt::Debug for LoginData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginData")
            .field("user_token", &"[REDACTED]")
            .field("auth_token", &"[REDACTED]")
            .field("expiration_time", &self.expiration_time)
            .field("abilities", &self.abilities)
            .finish()
    }
}

impl Payload for LoginData {
    const TYPE_NAME: &'static str = "LoginData";

    fn shape() -> Shape {
        Shape::new(Self::TYPE_NAME)
            .field("userToken", FieldKind::String)
            .field("authToken", FieldKind::String)
            .field("expirationTime", FieldKind::Number)
            .array_of_kind("abilities", FieldKind::String)
    }
}

/// Loader for the identified user's login data.
pub type UserLoader = RemoteDataLoader<LoginData>;

impl RemoteDataLoader<LoginData> {
    pub fn abilities(&self) -> Result<Vec<String>, NotLoaded> {
        self.read(|d| d.abilities.clone())
    }

    pub fn expiration_time(&self) -> Result<i64, NotLoaded> {
        self.read(|d| d.expiration_time)
    }
}

/// Issues login requests.
pub struct LoginClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl LoginClient {
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Exchange credentials for a token pair.
    ///
    /// A wrong or expired access code comes back as [`Error::Rejected`].
    pub async fn login(&self, email: &str, access_code: &SecretString) -> Result<LoginData, Error> {
        debug!("logging in at {}", self.endpoint);

        let result = self.send(email, access_code).await;
        match result {
            Ok(ref data) => debug!(abilities = data.abilities.len(), "login successful"),
            Err(ref e) => report_failure(LoginData::TYPE_NAME, e),
        }
        result
    }

    async fn send(&self, email: &str, access_code: &SecretString) -> Result<LoginData, Error> {
        let form = [("email", email), ("accessCode", access_code.expose_secret())];
        let resp = self
            .http
            .post(self.endpoint.clone())
            .form(&form)
            .send()
            .await?;
        let body = read_body(resp, &self.endpoint).await?;
        decode_payload(&body)
    }
}
