//! Turns an HTTP status and reply body into the typed result of each
//! endpoint. Kept free of I/O so every branch can be exercised directly.

use crate::portal::captcha::DataUri;
use crate::portal::error::PortalError;
use crate::portal::types::{Captcha, LoginOutcome, SessionCheck};
use crate::portal::wire::Reply;
use crate::session::SessionRef;

fn is_success(code: u16) -> bool {
    (200..300).contains(&code)
}

fn parse_reply(body: &str) -> Result<Reply, PortalError> {
    serde_json::from_str(body).map_err(|e| PortalError::Malformed(e.to_string()))
}

/// Message for a non-2xx reply: the backend's own text when the body is JSON
/// carrying one, `Server error: <code>` otherwise.
fn error_message(code: u16, body: &str) -> String {
    serde_json::from_str::<Reply>(body)
        .ok()
        .and_then(|reply| reply.message().map(str::to_string))
        .unwrap_or_else(|| format!("Server error: {}", code))
}

fn status_error(code: u16, body: &str) -> PortalError {
    PortalError::Status {
        code,
        message: error_message(code, body),
    }
}

fn require_session(reply: &Reply) -> Result<SessionRef, PortalError> {
    reply
        .session_id
        .as_deref()
        .map(SessionRef::new)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PortalError::Malformed("missing session_id".to_string()))
}

/// `/start-login`: a fresh CAPTCHA and the session it belongs to.
pub fn start_login(code: u16, body: &str) -> Result<Captcha, PortalError> {
    if !is_success(code) {
        return Err(status_error(code, body));
    }
    let reply = parse_reply(body)?;
    if reply.status != "captcha_ready" {
        return Err(PortalError::Rejected {
            message: reply
                .message()
                .unwrap_or("Failed to get CAPTCHA.")
                .to_string(),
        });
    }
    let session = require_session(&reply)?;
    let data = reply
        .captcha_image_data
        .as_deref()
        .ok_or_else(|| PortalError::Malformed("missing captcha_image_data".to_string()))?;
    let image = DataUri::parse(data)?;
    Ok(Captcha {
        session,
        image: Some(image),
    })
}

/// `/check-session`. Anything other than `success` means logged out.
///
/// A 4xx reply is the backend refusing the reference, so it counts as
/// expired. Only 5xx replies and transport failures leave it undecided.
pub fn check_session(code: u16, body: &str) -> Result<SessionCheck, PortalError> {
    if (400..500).contains(&code) {
        let message = serde_json::from_str::<Reply>(body)
            .ok()
            .and_then(|reply| reply.message().map(str::to_string));
        return Ok(SessionCheck::Expired { message });
    }
    if !is_success(code) {
        return Err(status_error(code, body));
    }
    let reply = parse_reply(body)?;
    if reply.status == "success" {
        let session = require_session(&reply)?;
        Ok(SessionCheck::Valid {
            message: reply.message().unwrap_or("Welcome back!").to_string(),
            session,
        })
    } else {
        Ok(SessionCheck::Expired {
            message: reply.message().map(str::to_string),
        })
    }
}

/// `/login-attempt`.
pub fn login_attempt(code: u16, body: &str) -> Result<LoginOutcome, PortalError> {
    if !is_success(code) {
        return Err(status_error(code, body));
    }
    let reply = parse_reply(body)?;
    match reply.status.as_str() {
        "success" => Ok(LoginOutcome::Success {
            message: reply.message().unwrap_or("Welcome!").to_string(),
            session: require_session(&reply)?,
        }),
        "captcha_invalid" => {
            let (message, captcha) = retry(&reply, "Invalid CAPTCHA. Please try again.")?;
            Ok(LoginOutcome::CaptchaInvalid { message, captcha })
        }
        "credentials_invalid" => {
            let (message, captcha) =
                retry(&reply, "Invalid Credentials or CAPTCHA. Please try again.")?;
            Ok(LoginOutcome::CredentialsInvalid { message, captcha })
        }
        _ => Ok(LoginOutcome::Failure {
            message: reply
                .message()
                .unwrap_or("An unknown login error occurred.")
                .to_string(),
        }),
    }
}

// A failed attempt must still hand over the new session; a broken or
// missing image only costs the picture.
fn retry(reply: &Reply, fallback: &str) -> Result<(String, Captcha), PortalError> {
    let session = require_session(reply)?;
    let image = match reply.captcha_image_data.as_deref() {
        Some(data) => match DataUri::parse(data) {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!(error = %e, "replacement captcha unusable");
                None
            }
        },
        None => None,
    };
    let message = reply.message().unwrap_or(fallback).to_string();
    Ok((message, Captcha { session, image }))
}

/// `/fetch-data`: the markup to show. HTTP 401 means the session is gone.
pub fn fetch_data(code: u16, body: &str) -> Result<String, PortalError> {
    if code == 401 {
        let message = serde_json::from_str::<Reply>(body)
            .ok()
            .and_then(|reply| reply.message().map(str::to_string))
            .unwrap_or_else(|| "Session expired. Please log in again.".to_string());
        return Err(PortalError::Unauthorized { message });
    }
    if !is_success(code) {
        return Err(status_error(code, body));
    }
    let reply = parse_reply(body)?;
    if reply.status != "success" {
        return Err(PortalError::Rejected {
            message: reply
                .message()
                .unwrap_or("The server could not fetch this page.")
                .to_string(),
        });
    }
    reply
        .html_content
        .ok_or_else(|| PortalError::Malformed("missing html_content".to_string()))
}

/// `/logout`. Only the status code matters.
pub fn logout(code: u16, body: &str) -> Result<(), PortalError> {
    if is_success(code) {
        Ok(())
    } else {
        Err(status_error(code, body))
    }
}
