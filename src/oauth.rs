use anyhow::{Context, Error};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const SCOPE: &str =
    "https://www.googleapis.com/auth/youtube https://www.googleapis.com/auth/youtube.readonly";

pub const OAUTH_FILE_INSTRUCTIONS: &str = r"1. complete the Google OAuth consent flow for your client with the youtube scopes
2. save the access_token, refresh_token and expires_in values from the token response
3. run oauthfile with those values and redirect stdout to a file
4. pass that file as <oauth_file> to ytmusic_client";

/// OAuth credentials as stored in the file handed to `ytmusic_client`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Credentials {
    /// Builds credentials for a token that expires `expires_in` seconds from now.
    pub fn new(access_token: &str, refresh_token: &str, expires_in: i64) -> Credentials {
        Credentials {
            access_token: access_token.to_string(),
            refresh_token: Some(refresh_token.to_string()).filter(|s| !s.is_empty()),
            expires_at: Some(Utc::now().timestamp() + expires_in),
            token_type: default_token_type(),
            scope: Some(SCOPE.to_string()),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Credentials, Error> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("read oauth file {}", path.display()))?;
        let creds: Credentials = serde_json::from_str(&data)
            .with_context(|| format!("parse oauth file {}", path.display()))?;
        Ok(creds)
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(t) => t <= Utc::now().timestamp(),
            None => false,
        }
    }

    pub fn expiry_string(&self) -> String {
        match self.expires_at.and_then(|t| Utc.timestamp_opt(t, 0).single()) {
            Some(dt) => dt.to_rfc3339(),
            None => "never".to_string(),
        }
    }

    /// Value for the `authorization` header.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}
