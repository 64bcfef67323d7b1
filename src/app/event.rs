use crate::portal::captcha::CaptchaView;
use crate::portal::error::PortalError;
use crate::portal::types::{LoginOutcome, Section, SessionCheck};
use crate::session::SessionRef;
use crossterm::event::Event as CrosstermEvent;

#[derive(Debug)]
pub enum AppEvent {
    /// Terminal input event
    Terminal(CrosstermEvent),

    /// A backend call finished
    Portal(PortalEvent),

    /// Tick for UI refresh
    Tick,
}

#[derive(Debug)]
pub enum PortalEvent {
    SessionChecked(Result<SessionCheck, PortalError>),
    CaptchaLoaded(Result<CaptchaView, PortalError>),
    LoginFinished(Result<LoginOutcome<CaptchaView>, PortalError>),
    /// `session` is the reference the fetch was issued with.
    SectionFetched {
        section: Section,
        session: SessionRef,
        result: Result<String, PortalError>,
    },
}
