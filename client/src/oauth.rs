//! OAuth2 token management for the TickTick open platform.
//!
//! The token is cached on disk next to the `.env` file. The first run (and
//! any run after the token expires without a usable refresh token) needs a
//! manual authorization: the authorize URL is printed to stderr and the
//! redirected URL is pasted back on the console. An MCP host runs the
//! server non-interactively, so that first authorization should happen in a
//! plain terminal once; afterwards the cache carries it.

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use ticktick_core::error::{Result, TickTickError};

const AUTHORIZE_URL: &str = "https://ticktick.com/oauth/authorize";
const TOKEN_URL: &str = "https://ticktick.com/oauth/token";
const DEFAULT_SCOPE: &str = "tasks:write tasks:read";
const OAUTH_STATE: &str = "ticktick-mcp";

/// An OAuth2 access token as stored in the cache file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Unix timestamp of expiry, stamped when the token is cached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<i64>,
}

impl OAuthToken {
    /// Whether the token has passed its stamped expiry. Tokens without a
    /// stamp are assumed valid; the API will reject them if not.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expire_time.map(|t| now >= t).unwrap_or(false)
    }

    fn stamp_expiry(&mut self, now: i64) {
        if let Some(secs) = self.expires_in {
            self.expire_time = Some(now + secs);
        }
    }
}

/// Credentials and cache location for the OAuth2 flow.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub cache_path: PathBuf,
}

/// Drives the OAuth2 authorization code flow with an on-disk token cache.
pub struct OAuth2Session {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl OAuth2Session {
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ticktick-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TickTickError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    /// Produce a usable access token: cached if still valid, refreshed if
    /// possible, interactively authorized as the last resort.
    pub async fn access_token(&self) -> Result<OAuthToken> {
        let now = Utc::now().timestamp();

        if let Some(cached) = self.load_cached() {
            if !cached.is_expired(now) {
                info!(cache = %self.config.cache_path.display(), "using cached OAuth token");
                return Ok(cached);
            }
            if let Some(refresh_token) = cached.refresh_token.clone() {
                match self.refresh(&refresh_token).await {
                    Ok(token) => return Ok(token),
                    Err(e) => {
                        warn!(error = %e, "token refresh failed, falling back to manual authorization");
                    }
                }
            }
        }

        self.authorize_interactively().await
    }

    /// The URL the user must open to authorize the app.
    pub fn authorize_url(&self) -> Result<Url> {
        let mut url = Url::parse(AUTHORIZE_URL)
            .map_err(|e| TickTickError::Internal(format!("Bad authorize URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("scope", DEFAULT_SCOPE)
            .append_pair("state", OAUTH_STATE)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code");
        Ok(url)
    }

    fn load_cached(&self) -> Option<OAuthToken> {
        let path = &self.config.cache_path;
        if !path.is_file() {
            return None;
        }
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(token) => Some(token),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "token cache is unreadable, re-authorizing");
                    None
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read token cache");
                None
            }
        }
    }

    /// Cache writes are best-effort; a failure only costs a re-authorization
    /// next run.
    fn store(&self, token: &OAuthToken) {
        match serde_json::to_string_pretty(token) {
            Ok(serialized) => {
                if let Err(e) = std::fs::write(&self.config.cache_path, serialized) {
                    warn!(
                        path = %self.config.cache_path.display(),
                        error = %e,
                        "failed to write token cache"
                    );
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize token for cache"),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<OAuthToken> {
        info!("refreshing OAuth token");
        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("scope", DEFAULT_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| TickTickError::Auth(format!("Token refresh request failed: {e}")))?;

        self.read_token(response).await
    }

    async fn authorize_interactively(&self) -> Result<OAuthToken> {
        let url = self.authorize_url()?;
        eprintln!("Authorization required. Open this URL in a browser and approve access:");
        eprintln!("  {url}");
        eprintln!("After approving you will be redirected; paste the full redirected URL here:");

        let pasted = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin()
                .read_line(&mut line)
                .map(|_| line)
        })
        .await
        .map_err(|e| TickTickError::Internal(format!("Authorization prompt failed: {e}")))?
        .map_err(|e| TickTickError::Auth(format!("Could not read authorization input: {e}")))?;

        let code = extract_code(pasted.trim(), Some(OAUTH_STATE))?;

        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("scope", DEFAULT_SCOPE),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| TickTickError::Auth(format!("Token exchange request failed: {e}")))?;

        self.read_token(response).await
    }

    async fn read_token(&self, response: reqwest::Response) -> Result<OAuthToken> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TickTickError::Auth(format!("Failed to read token response: {e}")))?;
        if !status.is_success() {
            return Err(TickTickError::Auth(format!(
                "Token endpoint returned status {status}: {body}"
            )));
        }
        let mut token: OAuthToken = serde_json::from_str(&body)
            .map_err(|e| TickTickError::Auth(format!("Unexpected token response: {e}")))?;
        token.stamp_expiry(Utc::now().timestamp());
        self.store(&token);
        info!("obtained OAuth token");
        Ok(token)
    }
}

/// Pull the authorization code out of a pasted redirect URL, checking the
/// round-tripped state value when one is expected.
fn extract_code(redirected_url: &str, expected_state: Option<&str>) -> Result<String> {
    let url = Url::parse(redirected_url).map_err(|e| {
        TickTickError::Auth(format!("Could not parse the redirected URL: {e}"))
    })?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }

    if let (Some(expected), Some(got)) = (expected_state, state.as_deref()) {
        if expected != got {
            return Err(TickTickError::Auth(format!(
                "State mismatch in redirect: expected '{expected}', got '{got}'"
            )));
        }
    }

    code.ok_or_else(|| {
        TickTickError::Auth("Redirected URL carries no 'code' parameter".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(cache_path: PathBuf) -> OAuth2Session {
        OAuth2Session::new(OAuthConfig {
            client_id: "cid".into(),
            client_secret: "secret".into(),
            redirect_uri: "http://127.0.0.1:8080/cb".into(),
            cache_path,
        })
        .unwrap()
    }

    #[test]
    fn test_extract_code() {
        let code = extract_code(
            "http://127.0.0.1:8080/cb?code=abc123&state=ticktick-mcp",
            Some("ticktick-mcp"),
        )
        .unwrap();
        assert_eq!(code, "abc123");
    }

    #[test]
    fn test_extract_code_state_mismatch() {
        let err = extract_code(
            "http://127.0.0.1:8080/cb?code=abc123&state=evil",
            Some("ticktick-mcp"),
        )
        .unwrap_err();
        assert!(err.is_auth());
    }

    #[test]
    fn test_extract_code_missing() {
        let err = extract_code("http://127.0.0.1:8080/cb?state=ticktick-mcp", Some("ticktick-mcp"))
            .unwrap_err();
        assert!(err.is_auth());

        assert!(extract_code("not a url", None).is_err());
    }

    #[test]
    fn test_token_expiry() {
        let mut token = OAuthToken {
            access_token: "tok".into(),
            token_type: None,
            refresh_token: None,
            expires_in: Some(3600),
            scope: None,
            expire_time: None,
        };
        assert!(!token.is_expired(1_000_000));
        token.stamp_expiry(1_000_000);
        assert_eq!(token.expire_time, Some(1_003_600));
        assert!(!token.is_expired(1_003_599));
        assert!(token.is_expired(1_003_600));
    }

    #[test]
    fn test_authorize_url_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path().join(".token-oauth"));
        let url = session.authorize_url().unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "cid");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["state"], "ticktick-mcp");
        assert_eq!(pairs["redirect_uri"], "http://127.0.0.1:8080/cb");
    }

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(dir.path().join(".token-oauth"));

        assert!(session.load_cached().is_none());

        let token = OAuthToken {
            access_token: "tok".into(),
            token_type: Some("bearer".into()),
            refresh_token: Some("refresh".into()),
            expires_in: Some(3600),
            scope: Some(DEFAULT_SCOPE.into()),
            expire_time: Some(2_000_000),
        };
        session.store(&token);

        let loaded = session.load_cached().unwrap();
        assert_eq!(loaded, token);
    }

    #[test]
    fn test_corrupt_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".token-oauth");
        std::fs::write(&path, "not json").unwrap();
        let session = session(path);
        assert!(session.load_cached().is_none());
    }
}
