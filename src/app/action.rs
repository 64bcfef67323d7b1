use crate::portal::types::{LoginPayload, Section};
use crate::session::SessionRef;
use std::path::PathBuf;

/// Side effects requested by the controller, executed by the main loop.
#[derive(Debug)]
pub enum Action {
    CheckSession { session: Option<SessionRef> },
    StartLogin,
    SubmitLogin(LoginPayload),
    FetchSection { section: Section, session: SessionRef },
    Logout { session: SessionRef },
    OpenCaptcha { path: PathBuf },
    Quit,
}
