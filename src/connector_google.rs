//! Google Play connector.
//!
//! Reads reviews through the Android Publisher API v3
//! (`GET /androidpublisher/v3/applications/{package}/reviews`).
//!
//! # Authentication
//!
//! A service-account JSON key (`GOOGLE_PLAY_JSON_KEY_PATH`) is used for the
//! OAuth 2.0 JWT-bearer flow:
//!
//! 1. Build a claim set for the `androidpublisher` scope.
//! 2. Sign it with the key's RSA private key (RS256).
//! 3. Exchange the assertion at the key's `token_uri` for an access token.
//!
//! A fresh token is requested on every fetch; runs are short-lived.
//!
//! Only the first page of the listing is read.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::config::GoogleConfig;
use crate::errors::{snippet, FetchError};
use crate::models::{Review, Store};
use crate::normalize;
use crate::traits::ReviewSource;

const SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

// ============ Wire types ============

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsListResponse {
    #[serde(default)]
    pub reviews: Vec<GoogleReview>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleReview {
    #[serde(default)]
    pub review_id: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub comments: Vec<GoogleComment>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleComment {
    #[serde(default)]
    pub user_comment: Option<UserComment>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserComment {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub last_modified: Option<ApiTimestamp>,
    #[serde(default)]
    pub star_rating: Option<u8>,
    #[serde(default)]
    pub reviewer_language: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub android_os_version: Option<i64>,
    #[serde(default)]
    pub app_version_code: Option<i64>,
    #[serde(default)]
    pub app_version_name: Option<String>,
    #[serde(default)]
    pub thumbs_up_count: Option<u32>,
    #[serde(default)]
    pub thumbs_down_count: Option<u32>,
    #[serde(default)]
    pub device_metadata: Option<DeviceMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetadata {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub screen_density_dpi: Option<u32>,
}

/// Protobuf-style timestamp. `seconds` is an int64 and therefore usually
/// arrives as a JSON string.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiTimestamp {
    #[serde(default, deserialize_with = "de_int64")]
    pub seconds: Option<i64>,
    #[serde(default)]
    pub nanos: Option<i64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Int64Repr {
    Number(i64),
    Text(String),
}

fn de_int64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Int64Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Int64Repr::Number(n)) => Ok(Some(n)),
        Some(Int64Repr::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

// ============ Auth ============

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

// ============ Connector ============

pub struct GoogleConnector {
    package_name: String,
    app_name: String,
    key_path: PathBuf,
    api_base: String,
    token_uri: Option<String>,
    client: reqwest::Client,
}

impl GoogleConnector {
    pub fn new(
        package_name: String,
        key_path: PathBuf,
        config: &GoogleConfig,
        client: reqwest::Client,
    ) -> Self {
        Self {
            package_name,
            app_name: config.app_name.clone(),
            key_path,
            api_base: config.api_base.clone(),
            token_uri: config.token_uri.clone(),
            client,
        }
    }

    pub fn reviews_url(&self) -> String {
        format!(
            "{}/androidpublisher/v3/applications/{}/reviews",
            self.api_base.trim_end_matches('/'),
            self.package_name
        )
    }

    async fn access_token(&self) -> Result<String, FetchError> {
        let raw = tokio::fs::read_to_string(&self.key_path).await?;
        let key: ServiceAccountKey = serde_json::from_str(&raw).map_err(|e| {
            FetchError::Auth(format!(
                "invalid service-account key {}: {}",
                self.key_path.display(),
                e
            ))
        })?;

        let token_uri = self
            .token_uri
            .as_deref()
            .or(key.token_uri.as_deref())
            .unwrap_or(DEFAULT_TOKEN_URI);

        let assertion = sign_assertion(&key, token_uri)?;

        let resp = self
            .client
            .post(token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Auth(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                snippet(&body)
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::Auth(format!("invalid token response: {e}")))?;
        Ok(token.access_token)
    }
}

fn sign_assertion(key: &ServiceAccountKey, audience: &str) -> Result<String, FetchError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        iss: &key.client_email,
        scope: SCOPE,
        aud: audience,
        iat: now,
        exp: now + 3600,
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| FetchError::Auth(format!("invalid service-account private key: {e}")))?;
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|e| FetchError::Auth(format!("failed to sign token request: {e}")))
}

#[async_trait]
impl ReviewSource for GoogleConnector {
    fn store(&self) -> Store {
        Store::Google
    }

    fn app_name(&self) -> &str {
        &self.app_name
    }

    async fn fetch(&self) -> Result<Vec<Review>, FetchError> {
        let token = self.access_token().await?;
        let url = self.reviews_url();
        debug!(%url, "fetching Google Play reviews");

        let resp = self.client.get(&url).bearer_auth(token).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        let body = resp.text().await?;
        let listing = parse_reviews(&body)?;
        debug!(count = listing.reviews.len(), "parsed Google Play reviews");

        Ok(listing
            .reviews
            .into_iter()
            .map(|r| normalize::google_review(r, &self.package_name))
            .collect())
    }
}

/// Parse a `reviews.list` response body. A body without `reviews` is empty.
pub fn parse_reviews(body: &str) -> Result<ReviewsListResponse, FetchError> {
    serde_json::from_str(body)
        .map_err(|e| FetchError::Parse(format!("invalid Google Play reviews response: {e}")))
}
