//! HTTP client for the portal backend.

use crate::config::PortalConfig;
use crate::portal::decode;
use crate::portal::error::PortalError;
use crate::portal::types::{Captcha, LoginOutcome, LoginPayload, Section, SessionCheck};
use crate::portal::wire::{FetchBody, LoginBody, SessionBody};
use crate::session::SessionRef;
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

/// The five backend calls the controller relies on.
#[async_trait]
pub trait PortalBackend: Send + Sync {
    async fn start_login(&self) -> Result<Captcha, PortalError>;

    /// `None` asks the backend about the login it keeps itself (GET);
    /// `Some` validates a stored reference (POST).
    async fn check_session(&self, session: Option<&SessionRef>) -> Result<SessionCheck, PortalError>;

    async fn login_attempt(&self, payload: &LoginPayload) -> Result<LoginOutcome, PortalError>;

    async fn fetch_section(&self, session: &SessionRef, section: Section) -> Result<String, PortalError>;

    async fn logout(&self, session: &SessionRef) -> Result<(), PortalError>;
}

pub struct PortalClient {
    client: Client,
    base_url: String,
}

impl PortalClient {
    pub fn new(config: &PortalConfig) -> Result<Self, PortalError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn read(path: &str, response: Response) -> Result<(u16, String), PortalError> {
        let code = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(path, code, len = body.len(), "reply received");
        Ok((code, body))
    }
}

#[async_trait]
impl PortalBackend for PortalClient {
    async fn start_login(&self) -> Result<Captcha, PortalError> {
        let response = self.client.post(self.url("start-login")).send().await?;
        let (code, body) = Self::read("start-login", response).await?;
        decode::start_login(code, &body)
    }

    async fn check_session(&self, session: Option<&SessionRef>) -> Result<SessionCheck, PortalError> {
        let request = match session {
            Some(session) => self.client.post(self.url("check-session")).json(&SessionBody {
                session_id: session.as_str(),
            }),
            None => self.client.get(self.url("check-session")),
        };
        let response = request.send().await?;
        let (code, body) = Self::read("check-session", response).await?;
        decode::check_session(code, &body)
    }

    async fn login_attempt(&self, payload: &LoginPayload) -> Result<LoginOutcome, PortalError> {
        let body = LoginBody {
            session_id: payload.session.as_str(),
            username: &payload.username,
            password: &payload.password,
            captcha: &payload.captcha,
        };
        let response = self
            .client
            .post(self.url("login-attempt"))
            .json(&body)
            .send()
            .await?;
        let (code, body) = Self::read("login-attempt", response).await?;
        decode::login_attempt(code, &body)
    }

    async fn fetch_section(&self, session: &SessionRef, section: Section) -> Result<String, PortalError> {
        let body = FetchBody {
            session_id: session.as_str(),
            target: section.target(),
        };
        let response = self
            .client
            .post(self.url("fetch-data"))
            .json(&body)
            .send()
            .await?;
        let (code, body) = Self::read("fetch-data", response).await?;
        decode::fetch_data(code, &body)
    }

    async fn logout(&self, session: &SessionRef) -> Result<(), PortalError> {
        let response = self
            .client
            .post(self.url("logout"))
            .json(&SessionBody {
                session_id: session.as_str(),
            })
            .send()
            .await?;
        let (code, body) = Self::read("logout", response).await?;
        decode::logout(code, &body)
    }
}
