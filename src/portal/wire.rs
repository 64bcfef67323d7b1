//! JSON shapes exchanged with the backend.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct SessionBody<'a> {
    pub session_id: &'a str,
}

#[derive(Serialize)]
pub struct LoginBody<'a> {
    pub session_id: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub captcha: &'a str,
}

#[derive(Debug, Serialize)]
pub struct FetchBody<'a> {
    pub session_id: &'a str,
    pub target: &'a str,
}

/// Every endpoint answers with a subset of these fields, keyed by `status`.
#[derive(Debug, Default, Deserialize)]
pub struct Reply {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub captcha_image_data: Option<String>,
    #[serde(default)]
    pub html_content: Option<String>,
}

impl Reply {
    /// Backend message, if it sent a non-empty one.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}
