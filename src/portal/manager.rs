//! Runs portal requests off the UI loop.
//!
//! Every request is spawned on its own task and its result is posted back as
//! an [`AppEvent::Portal`], so the controller only ever sees completed calls.
//! CAPTCHA images are written to disk here, on the blocking pool, before the
//! controller gets them.

use crate::app::event::{AppEvent, PortalEvent};
use crate::portal::captcha::CaptchaStore;
use crate::portal::client::PortalBackend;
use crate::portal::error::PortalError;
use crate::portal::types::{LoginPayload, Section};
use crate::session::SessionRef;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct PortalManager {
    backend: Arc<dyn PortalBackend>,
    captchas: Arc<CaptchaStore>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl PortalManager {
    pub fn new(
        backend: Arc<dyn PortalBackend>,
        captchas: CaptchaStore,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            backend,
            captchas: Arc::new(captchas),
            event_tx,
        }
    }

    /// Run filesystem work for the CAPTCHA store without stalling a runtime worker.
    async fn on_disk<T, F>(captchas: Arc<CaptchaStore>, f: F) -> Result<T, PortalError>
    where
        T: Send + 'static,
        F: FnOnce(&CaptchaStore) -> T + Send + 'static,
    {
        Ok(tokio::task::spawn_blocking(move || f(&captchas)).await?)
    }

    fn report(tx: &mpsc::UnboundedSender<AppEvent>, event: PortalEvent) {
        // The receiver only goes away on shutdown.
        let _ = tx.send(AppEvent::Portal(event));
    }

    pub fn check_session(&self, session: Option<SessionRef>) {
        let backend = self.backend.clone();
        let tx = self.event_tx.clone();
        tracing::info!(stored = session.is_some(), "checking session");
        tokio::spawn(async move {
            let result = backend.check_session(session.as_ref()).await;
            if let Err(ref e) = result {
                tracing::warn!(error = %e, "session check failed");
            }
            Self::report(&tx, PortalEvent::SessionChecked(result));
        });
    }

    pub fn start_login(&self) {
        let backend = self.backend.clone();
        let captchas = self.captchas.clone();
        let tx = self.event_tx.clone();
        tracing::info!("requesting captcha");
        tokio::spawn(async move {
            let result = match backend.start_login().await {
                Ok(captcha) => Self::on_disk(captchas, move |store| store.show(captcha)).await,
                Err(e) => Err(e),
            };
            if let Err(ref e) = result {
                tracing::warn!(error = %e, "captcha request failed");
            }
            Self::report(&tx, PortalEvent::CaptchaLoaded(result));
        });
    }

    pub fn submit_login(&self, payload: LoginPayload) {
        let backend = self.backend.clone();
        let captchas = self.captchas.clone();
        let tx = self.event_tx.clone();
        tracing::info!(username = %payload.username, "submitting login");
        tokio::spawn(async move {
            let result = match backend.login_attempt(&payload).await {
                Ok(outcome) => {
                    Self::on_disk(captchas, move |store| {
                        outcome.map_captcha(|captcha| store.show(captcha))
                    })
                    .await
                }
                Err(e) => Err(e),
            };
            if let Err(ref e) = result {
                tracing::warn!(error = %e, "login attempt failed");
            }
            Self::report(&tx, PortalEvent::LoginFinished(result));
        });
    }

    pub fn fetch_section(&self, section: Section, session: SessionRef) {
        let backend = self.backend.clone();
        let tx = self.event_tx.clone();
        tracing::info!(section = section.label(), "fetching section");
        tokio::spawn(async move {
            let result = backend.fetch_section(&session, section).await;
            match result {
                Ok(ref html) => tracing::debug!(len = html.len(), "section fetched"),
                Err(ref e) if e.is_unauthorized() => tracing::info!("section fetch unauthorized"),
                Err(ref e) => tracing::warn!(error = %e, "section fetch failed"),
            }
            Self::report(
                &tx,
                PortalEvent::SectionFetched {
                    section,
                    session,
                    result,
                },
            );
        });
    }

    /// Best-effort: the outcome is only logged.
    pub fn logout(&self, session: SessionRef) {
        let backend = self.backend.clone();
        tracing::info!("logging out");
        tokio::spawn(async move {
            match backend.logout(&session).await {
                Ok(()) => tracing::info!("backend session released"),
                Err(e) => tracing::warn!(error = %e, "logout request failed"),
            }
        });
    }

    pub fn open_captcha(&self, path: &Path) -> std::io::Result<()> {
        self.captchas.open(path)
    }
}
