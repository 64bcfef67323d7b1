//! Typed results of the backend endpoints.

use crate::portal::captcha::DataUri;
use crate::session::SessionRef;
use std::fmt;

/// One category of academic data the dashboard can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Timetable,
    Grades,
    Attendance,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Timetable, Section::Grades, Section::Attendance];

    /// Backend route string sent as `target` to `/fetch-data`.
    pub fn target(self) -> &'static str {
        match self {
            Section::Timetable => "academics/common/StudentTimeTableChn",
            Section::Grades => "examinations/examGradeView/doStudentGradeView",
            Section::Attendance => "processViewStudentAttendance",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Section::Timetable => "Timetable",
            Section::Grades => "Grades",
            Section::Attendance => "Attendance",
        }
    }
}

/// A CAPTCHA challenge bound to the session it was issued for.
///
/// `image` is `None` when the backend answered without a usable picture
/// (it does this on some failed logins).
#[derive(Debug, Clone)]
pub struct Captcha {
    pub session: SessionRef,
    pub image: Option<DataUri>,
}

/// Result of `/check-session`.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCheck {
    Valid { message: String, session: SessionRef },
    Expired { message: Option<String> },
}

/// Result of `/login-attempt`.
///
/// Generic over the CAPTCHA so the manager can swap the decoded image for
/// the file it was written to before handing it to the controller.
#[derive(Debug, Clone)]
pub enum LoginOutcome<C = Captcha> {
    Success { message: String, session: SessionRef },
    CaptchaInvalid { message: String, captcha: C },
    CredentialsInvalid { message: String, captcha: C },
    Failure { message: String },
}

impl<C> LoginOutcome<C> {
    pub fn map_captcha<D>(self, f: impl FnOnce(C) -> D) -> LoginOutcome<D> {
        match self {
            LoginOutcome::Success { message, session } => LoginOutcome::Success { message, session },
            LoginOutcome::CaptchaInvalid { message, captcha } => LoginOutcome::CaptchaInvalid {
                message,
                captcha: f(captcha),
            },
            LoginOutcome::CredentialsInvalid { message, captcha } => {
                LoginOutcome::CredentialsInvalid {
                    message,
                    captcha: f(captcha),
                }
            }
            LoginOutcome::Failure { message } => LoginOutcome::Failure { message },
        }
    }
}

/// Credentials for one login attempt. Never stored.
#[derive(Clone)]
pub struct LoginPayload {
    pub session: SessionRef,
    pub username: String,
    pub password: String,
    pub captcha: String,
}

impl fmt::Debug for LoginPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginPayload")
            .field("session", &self.session)
            .field("username", &self.username)
            .field("password", &"***")
            .field("captcha", &"***")
            .finish()
    }
}
