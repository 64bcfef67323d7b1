use crate::app::action::Action;
use crate::app::event::{AppEvent, PortalEvent};
use crate::app::state::*;
use crate::app::view::{CaptchaSlot, DataArea, Screen};
use crate::config::SessionCheckMode;
use crate::portal::captcha::CaptchaView;
use crate::portal::error::PortalError;
use crate::portal::types::{LoginOutcome, LoginPayload, Section, SessionCheck};
use crate::session::SessionRef;
use crate::ui::markup;
use crossterm::event::{Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

const PAGE: usize = 10;

/// Decide the first screen. Called once before the event loop starts.
pub fn initialize(state: &mut AppState) -> Vec<Action> {
    match state.config.portal.session_check {
        SessionCheckMode::Stored => match state.session.recover() {
            Some(session) => {
                tracing::info!(session = ?session, "validating stored session");
                state.screen = Screen::Loading;
                state.dirty = true;
                vec![Action::CheckSession {
                    session: Some(session),
                }]
            }
            None => show_login_screen(state),
        },
        SessionCheckMode::Backend => {
            state.screen = Screen::Loading;
            state.dirty = true;
            vec![Action::CheckSession { session: None }]
        }
    }
}

pub fn handle_event(state: &mut AppState, event: AppEvent) -> Vec<Action> {
    match event {
        AppEvent::Terminal(cevent) => {
            state.dirty = true;
            handle_terminal(state, cevent)
        }
        AppEvent::Portal(event) => {
            state.dirty = true;
            handle_portal(state, event)
        }
        AppEvent::Tick => {
            state.tick_count = state.tick_count.wrapping_add(1);
            if state.is_animating() {
                state.dirty = true;
            }
            vec![]
        }
    }
}

fn handle_portal(state: &mut AppState, event: PortalEvent) -> Vec<Action> {
    match event {
        PortalEvent::SessionChecked(result) => session_checked(state, result),
        PortalEvent::CaptchaLoaded(result) => {
            captcha_loaded(state, result);
            vec![]
        }
        PortalEvent::LoginFinished(result) => login_finished(state, result),
        PortalEvent::SectionFetched {
            section,
            session,
            result,
        } => section_fetched(state, section, &session, result),
    }
}

fn session_checked(state: &mut AppState, result: Result<SessionCheck, PortalError>) -> Vec<Action> {
    if state.screen != Screen::Loading {
        tracing::debug!("ignoring late session check");
        return vec![];
    }
    match result {
        Ok(SessionCheck::Valid { message, session }) => {
            if let Err(e) = state.session.persist(session) {
                tracing::warn!(error = %e, "failed to store validated session");
            }
            show_dashboard(state, message);
            vec![]
        }
        Ok(SessionCheck::Expired { message }) => {
            tracing::info!(reason = message.as_deref().unwrap_or("none"), "stored session rejected");
            if let Err(e) = state.session.clear() {
                tracing::warn!(error = %e, "failed to remove stored session");
            }
            show_login_screen(state)
        }
        Err(e) => {
            // The stored login may still be good once the backend is reachable.
            state.session.forget_current();
            let actions = show_login_screen(state);
            state.error(format!("Connection Error: {}", e));
            actions
        }
    }
}

fn captcha_loaded(state: &mut AppState, result: Result<CaptchaView, PortalError>) {
    if state.screen != Screen::Login {
        tracing::debug!("ignoring captcha for inactive login screen");
        return;
    }
    match result {
        Ok(view) => {
            state.session.replace(view.session.clone());
            state.captcha = CaptchaSlot::from_view(view);
            if !state.login.username.text.is_empty() && !state.login.password.text.is_empty() {
                state.login.focus = LoginField::Captcha;
            }
        }
        Err(e) => {
            state.captcha = CaptchaSlot::Unavailable;
            state.error(e.to_string());
        }
    }
}

fn login_finished(
    state: &mut AppState,
    result: Result<LoginOutcome<CaptchaView>, PortalError>,
) -> Vec<Action> {
    if !state.login.busy || state.screen != Screen::Login {
        tracing::debug!("ignoring unexpected login result");
        return vec![];
    }
    state.login.busy = false;

    match result {
        Ok(LoginOutcome::Success { message, session }) => {
            tracing::info!("login succeeded");
            if let Err(e) = state.session.persist(session) {
                tracing::warn!(error = %e, "failed to store session");
                show_dashboard(state, message);
                state.error(format!("Logged in, but the session could not be saved: {}", e));
                return vec![];
            }
            show_dashboard(state, message);
        }
        Ok(LoginOutcome::CaptchaInvalid { message, captcha })
        | Ok(LoginOutcome::CredentialsInvalid { message, captcha }) => {
            tracing::info!(reason = %message, "login rejected");
            state.session.replace(captcha.session.clone());
            state.captcha = CaptchaSlot::from_view(captcha);
            state.login.captcha.clear();
            state.login.focus = LoginField::Captcha;
            state.error(message);
        }
        Ok(LoginOutcome::Failure { message }) => state.error(message),
        Err(e) => state.error(e.to_string()),
    }
    vec![]
}

fn section_fetched(
    state: &mut AppState,
    section: Section,
    session: &SessionRef,
    result: Result<String, PortalError>,
) -> Vec<Action> {
    // Issued for a login that has since ended; the button was reset with it.
    if state.session.current() != Some(session) {
        tracing::debug!(section = section.label(), "dropping section for a previous session");
        return vec![];
    }
    state.sections.finish(section);
    if state.screen != Screen::Dashboard {
        tracing::debug!(section = section.label(), "dropping section for inactive dashboard");
        return vec![];
    }

    match result {
        Ok(html) => {
            state.data = DataArea::Markup {
                section,
                lines: markup::to_lines(&html),
                fetched_at: state.timestamp(),
            };
            state.data_scroll = 0;
            vec![]
        }
        Err(PortalError::Unauthorized { message }) => {
            tracing::info!("session no longer valid, returning to login");
            if let Err(e) = state.session.clear() {
                tracing::warn!(error = %e, "failed to remove stored session");
            }
            leave_dashboard(state);
            let actions = show_login_screen(state);
            state.error(message);
            actions
        }
        Err(e) => {
            state.data = DataArea::Error(e.to_string());
            state.data_scroll = 0;
            vec![]
        }
    }
}

fn handle_terminal(state: &mut AppState, event: CEvent) -> Vec<Action> {
    match event {
        CEvent::Key(key) if key.kind != KeyEventKind::Release => handle_key(state, key),
        _ => vec![],
    }
}

fn handle_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    // Global keybindings
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
    {
        return vec![Action::Quit];
    }

    match state.screen {
        Screen::Loading => vec![],
        Screen::Login => handle_login_key(state, key),
        Screen::Dashboard => handle_dashboard_key(state, key),
    }
}

fn handle_login_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            state.login.focus = state.login.focus.next();
            vec![]
        }
        KeyCode::BackTab | KeyCode::Up => {
            state.login.focus = state.login.focus.prev();
            vec![]
        }
        KeyCode::Enter => submit_login(state),
        KeyCode::F(5) => request_captcha(state),
        KeyCode::Char('o') if ctrl => match state.captcha {
            CaptchaSlot::Ready(CaptchaView {
                path: Some(ref path),
                ..
            }) => vec![Action::OpenCaptcha { path: path.clone() }],
            _ => {
                state.error("No CAPTCHA image to open.");
                vec![]
            }
        },
        KeyCode::Char('w') if ctrl => {
            state.login.focused_mut().delete_word_back();
            vec![]
        }
        KeyCode::Char('u') if ctrl => {
            state.login.focused_mut().clear();
            vec![]
        }
        KeyCode::Char(_) if ctrl => vec![],
        KeyCode::Char(c) => {
            state.login.focused_mut().insert_char(c);
            vec![]
        }
        KeyCode::Backspace => {
            state.login.focused_mut().delete_back();
            vec![]
        }
        KeyCode::Delete => {
            state.login.focused_mut().delete_forward();
            vec![]
        }
        KeyCode::Left => {
            state.login.focused_mut().move_left();
            vec![]
        }
        KeyCode::Right => {
            state.login.focused_mut().move_right();
            vec![]
        }
        KeyCode::Home => {
            state.login.focused_mut().move_home();
            vec![]
        }
        KeyCode::End => {
            state.login.focused_mut().move_end();
            vec![]
        }
        _ => vec![],
    }
}

fn handle_dashboard_key(state: &mut AppState, key: KeyEvent) -> Vec<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return vec![];
    }
    match key.code {
        KeyCode::Char('1') | KeyCode::Char('t') => fetch_section(state, Section::Timetable),
        KeyCode::Char('2') | KeyCode::Char('g') => fetch_section(state, Section::Grades),
        KeyCode::Char('3') | KeyCode::Char('a') => fetch_section(state, Section::Attendance),
        KeyCode::Char('l') => logout(state),
        KeyCode::Char('q') | KeyCode::Esc => vec![Action::Quit],
        KeyCode::Up => {
            state.scroll_up(1);
            vec![]
        }
        KeyCode::Down => {
            state.scroll_down(1);
            vec![]
        }
        KeyCode::PageUp => {
            state.scroll_up(PAGE);
            vec![]
        }
        KeyCode::PageDown => {
            state.scroll_down(PAGE);
            vec![]
        }
        KeyCode::Home => {
            state.scroll_up(usize::MAX);
            vec![]
        }
        KeyCode::End => {
            state.scroll_to_end();
            vec![]
        }
        _ => vec![],
    }
}

/// Ask for a fresh CAPTCHA. The slot shows a spinner until it arrives; the
/// current session id stays in use until then.
pub fn request_captcha(state: &mut AppState) -> Vec<Action> {
    if state.login.busy || state.captcha == CaptchaSlot::Loading {
        return vec![];
    }
    state.captcha = CaptchaSlot::Loading;
    state.dirty = true;
    vec![Action::StartLogin]
}

pub fn submit_login(state: &mut AppState) -> Vec<Action> {
    if state.login.busy {
        return vec![];
    }
    let Some(session) = state.session.current().cloned() else {
        state.error("No CAPTCHA session. Press F5 to request a new CAPTCHA.");
        return vec![];
    };
    if let Some(empty) = LoginField::ALL
        .into_iter()
        .find(|field| state.login.field(*field).text.trim().is_empty())
    {
        state.login.focus = empty;
        state.error(format!("{} is required.", empty.label()));
        return vec![];
    }

    state.login.busy = true;
    state.status = None;
    state.dirty = true;
    vec![Action::SubmitLogin(LoginPayload {
        session,
        username: state.login.username.text.trim().to_string(),
        password: state.login.password.text.clone(),
        captcha: state.login.captcha.text.trim().to_string(),
    })]
}

pub fn fetch_section(state: &mut AppState, section: Section) -> Vec<Action> {
    if state.screen != Screen::Dashboard {
        return vec![];
    }
    let Some(session) = state.session.current().cloned() else {
        tracing::warn!("dashboard without a session, returning to login");
        leave_dashboard(state);
        return show_login_screen(state);
    };
    if !state.sections.begin(section) {
        return vec![];
    }
    state.dirty = true;
    vec![Action::FetchSection { section, session }]
}

/// Leave the dashboard immediately. The backend is told best-effort.
pub fn logout(state: &mut AppState) -> Vec<Action> {
    let session = state.session.current().cloned();
    if let Err(e) = state.session.clear() {
        tracing::warn!(error = %e, "failed to remove stored session");
    }
    leave_dashboard(state);

    let mut actions = Vec::new();
    if let Some(session) = session {
        actions.push(Action::Logout { session });
    }
    actions.extend(show_login_screen(state));
    actions
}

fn leave_dashboard(state: &mut AppState) {
    state.data = DataArea::Empty;
    state.data_scroll = 0;
    state.welcome.clear();
    state.sections.reset();
}

fn show_login_screen(state: &mut AppState) -> Vec<Action> {
    state.screen = Screen::Login;
    state.captcha = CaptchaSlot::Loading;
    state.login.busy = false;
    state.login.password.clear();
    state.login.captcha.clear();
    state.login.focus = if state.login.username.text.is_empty() {
        LoginField::Username
    } else {
        LoginField::Password
    };
    state.info("Please enter your credentials.");
    vec![Action::StartLogin]
}

fn show_dashboard(state: &mut AppState, welcome: String) {
    state.screen = Screen::Dashboard;
    state.welcome = welcome;
    state.captcha = CaptchaSlot::Hidden;
    state.status = None;
    state.login.password.clear();
    state.login.captcha.clear();
    state.data = DataArea::Empty;
    state.data_scroll = 0;
    state.sections.reset();
    state.dirty = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::session::{MemoryStore, Session, SessionStore};
    use std::path::PathBuf;

    fn state_with(mode: SessionCheckMode, stored: Option<&str>) -> AppState {
        let mut store = MemoryStore::default();
        if let Some(id) = stored {
            store.save(&SessionRef::new(id)).unwrap();
        }
        let mut config = AppConfig::default();
        config.portal.session_check = mode;
        AppState::new(config, Session::new(Box::new(store)))
    }

    fn view(id: &str) -> CaptchaView {
        CaptchaView {
            session: SessionRef::new(id),
            path: Some(PathBuf::from(format!("/tmp/{}.png", id))),
            mime: "image/png".into(),
            size: 42,
        }
    }

    fn portal(state: &mut AppState, event: PortalEvent) -> Vec<Action> {
        handle_event(state, AppEvent::Portal(event))
    }

    fn key(state: &mut AppState, code: KeyCode) -> Vec<Action> {
        handle_event(
            state,
            AppEvent::Terminal(CEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))),
        )
    }

    fn type_str(state: &mut AppState, text: &str) {
        for c in text.chars() {
            key(state, KeyCode::Char(c));
        }
    }

    /// Login screen with a ready CAPTCHA bound to `s1`.
    fn login_ready() -> AppState {
        let mut state = state_with(SessionCheckMode::Stored, None);
        initialize(&mut state);
        portal(&mut state, PortalEvent::CaptchaLoaded(Ok(view("s1"))));
        state
    }

    fn dashboard() -> AppState {
        let mut state = state_with(SessionCheckMode::Stored, Some("s9"));
        initialize(&mut state);
        portal(
            &mut state,
            PortalEvent::SessionChecked(Ok(SessionCheck::Valid {
                message: "Welcome back!".into(),
                session: SessionRef::new("s9"),
            })),
        );
        state
    }

    #[test]
    fn test_no_stored_session_goes_to_login() {
        let mut state = state_with(SessionCheckMode::Stored, None);
        let actions = initialize(&mut state);
        assert_eq!(state.screen, Screen::Login);
        assert_eq!(state.captcha, CaptchaSlot::Loading);
        assert!(matches!(actions.as_slice(), [Action::StartLogin]));
        assert_eq!(state.status.as_ref().unwrap().text, "Please enter your credentials.");
    }

    #[test]
    fn test_stored_session_validated_shows_dashboard() {
        let mut state = state_with(SessionCheckMode::Stored, Some("s9"));
        let actions = initialize(&mut state);
        assert_eq!(state.screen, Screen::Loading);
        match actions.as_slice() {
            [Action::CheckSession { session: Some(s) }] => assert_eq!(s.as_str(), "s9"),
            other => panic!("unexpected actions: {:?}", other),
        }

        let actions = portal(
            &mut state,
            PortalEvent::SessionChecked(Ok(SessionCheck::Valid {
                message: "Welcome back, John!".into(),
                session: SessionRef::new("s9"),
            })),
        );
        assert!(actions.is_empty());
        assert_eq!(state.screen, Screen::Dashboard);
        assert_eq!(state.welcome, "Welcome back, John!");
        assert_eq!(state.session.current().unwrap().as_str(), "s9");
    }

    #[test]
    fn test_backend_mode_always_asks_backend() {
        let mut state = state_with(SessionCheckMode::Backend, None);
        let actions = initialize(&mut state);
        assert_eq!(state.screen, Screen::Loading);
        assert!(matches!(
            actions.as_slice(),
            [Action::CheckSession { session: None }]
        ));
        portal(
            &mut state,
            PortalEvent::SessionChecked(Ok(SessionCheck::Valid {
                message: "Welcome back!".into(),
                session: SessionRef::new("b1"),
            })),
        );
        assert_eq!(state.screen, Screen::Dashboard);
        assert_eq!(state.session.current().unwrap().as_str(), "b1");
    }

    #[test]
    fn test_expired_session_is_removed() {
        let mut state = state_with(SessionCheckMode::Stored, Some("old"));
        initialize(&mut state);
        let actions = portal(
            &mut state,
            PortalEvent::SessionChecked(Ok(SessionCheck::Expired { message: None })),
        );
        assert!(matches!(actions.as_slice(), [Action::StartLogin]));
        assert_eq!(state.screen, Screen::Login);
        assert_eq!(state.session.stored().unwrap(), None);
        assert!(!state.status.as_ref().unwrap().is_error());
    }

    #[test]
    fn test_check_session_transport_error_shows_connection_error() {
        let mut state = state_with(SessionCheckMode::Stored, Some("s9"));
        initialize(&mut state);
        // Build a real transport error without a network round trip.
        let err = reqwest::Client::new().get("not a url").build().unwrap_err();
        let actions = portal(
            &mut state,
            PortalEvent::SessionChecked(Err(PortalError::Transport(err))),
        );
        assert!(matches!(actions.as_slice(), [Action::StartLogin]));
        assert_eq!(state.screen, Screen::Login);
        let status = state.status.as_ref().unwrap();
        assert!(status.is_error());
        assert!(status.text.starts_with("Connection Error: "));
        assert!(state.session.current().is_none());
        // Unreachable is not the same as rejected.
        assert!(state.session.stored().unwrap().is_some());
    }

    #[test]
    fn test_captcha_loaded_sets_current_session() {
        let state = login_ready();
        assert_eq!(state.session.current().unwrap().as_str(), "s1");
        assert!(matches!(state.captcha, CaptchaSlot::Ready(_)));
        assert_eq!(state.login.focus, LoginField::Username);
    }

    #[test]
    fn test_captcha_without_image_is_unavailable() {
        let mut state = state_with(SessionCheckMode::Stored, None);
        initialize(&mut state);
        let mut v = view("s1");
        v.path = None;
        portal(&mut state, PortalEvent::CaptchaLoaded(Ok(v)));
        assert_eq!(state.captcha, CaptchaSlot::Unavailable);
        assert_eq!(state.session.current().unwrap().as_str(), "s1");
    }

    #[test]
    fn test_captcha_failure_shows_error() {
        let mut state = state_with(SessionCheckMode::Stored, None);
        initialize(&mut state);
        portal(
            &mut state,
            PortalEvent::CaptchaLoaded(Err(PortalError::Rejected {
                message: "Failed to get CAPTCHA.".into(),
            })),
        );
        assert_eq!(state.captcha, CaptchaSlot::Unavailable);
        let status = state.status.as_ref().unwrap();
        assert!(status.is_error());
        assert_eq!(status.text, "Failed to get CAPTCHA.");

        // F5 asks again.
        let actions = key(&mut state, KeyCode::F(5));
        assert!(matches!(actions.as_slice(), [Action::StartLogin]));
        assert_eq!(state.captcha, CaptchaSlot::Loading);
        assert!(key(&mut state, KeyCode::F(5)).is_empty());
    }

    #[test]
    fn test_refresh_keeps_session_until_new_captcha_arrives() {
        let mut state = login_ready();
        let actions = key(&mut state, KeyCode::F(5));
        assert!(matches!(actions.as_slice(), [Action::StartLogin]));
        assert_eq!(state.captcha, CaptchaSlot::Loading);
        assert_eq!(state.session.current(), Some(&SessionRef::new("s1")));

        portal(&mut state, PortalEvent::CaptchaLoaded(Ok(view("s2"))));
        assert_eq!(state.session.current(), Some(&SessionRef::new("s2")));
    }

    #[test]
    fn test_submit_builds_payload_and_blocks_resubmit() {
        let mut state = login_ready();
        type_str(&mut state, "john");
        key(&mut state, KeyCode::Tab);
        type_str(&mut state, "hunter2");
        key(&mut state, KeyCode::Tab);
        type_str(&mut state, "AB12");

        let actions = key(&mut state, KeyCode::Enter);
        match actions.as_slice() {
            [Action::SubmitLogin(payload)] => {
                assert_eq!(payload.session.as_str(), "s1");
                assert_eq!(payload.username, "john");
                assert_eq!(payload.password, "hunter2");
                assert_eq!(payload.captcha, "AB12");
            }
            other => panic!("unexpected actions: {:?}", other),
        }
        assert!(state.login.busy);
        assert!(key(&mut state, KeyCode::Enter).is_empty());
    }

    #[test]
    fn test_submit_requires_all_fields() {
        let mut state = login_ready();
        type_str(&mut state, "john");
        let actions = key(&mut state, KeyCode::Enter);
        assert!(actions.is_empty());
        assert!(!state.login.busy);
        assert_eq!(state.login.focus, LoginField::Password);
        assert!(state.status.as_ref().unwrap().is_error());
    }

    #[test]
    fn test_submit_without_captcha_session_is_refused() {
        let mut state = state_with(SessionCheckMode::Stored, None);
        initialize(&mut state);
        let actions = key(&mut state, KeyCode::Enter);
        assert!(actions.is_empty());
        assert!(state.status.as_ref().unwrap().text.contains("F5"));
    }

    fn submit(state: &mut AppState) {
        state.login.username.text = "john".into();
        state.login.password.text = "hunter2".into();
        state.login.captcha.text = "WRONG".into();
        let actions = submit_login(state);
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_wrong_captcha_replaces_challenge_and_keeps_credentials() {
        let mut state = login_ready();
        submit(&mut state);
        portal(
            &mut state,
            PortalEvent::LoginFinished(Ok(LoginOutcome::CaptchaInvalid {
                message: "Invalid CAPTCHA. Please try again.".into(),
                captcha: view("s2"),
            })),
        );

        assert_eq!(state.screen, Screen::Login);
        assert!(!state.login.busy);
        assert_eq!(state.login.username.text, "john");
        assert_eq!(state.login.password.text, "hunter2");
        assert_eq!(state.login.captcha.text, "");
        assert_eq!(state.login.focus, LoginField::Captcha);
        assert_eq!(state.session.current().unwrap().as_str(), "s2");
        match &state.captcha {
            CaptchaSlot::Ready(v) => assert_eq!(v.session.as_str(), "s2"),
            other => panic!("unexpected captcha slot: {:?}", other),
        }
        let status = state.status.as_ref().unwrap();
        assert!(status.is_error());
        assert_eq!(status.text, "Invalid CAPTCHA. Please try again.");
    }

    #[test]
    fn test_successful_login_persists_and_enters_dashboard_once() {
        let mut state = login_ready();
        submit(&mut state);
        let success = || {
            PortalEvent::LoginFinished(Ok(LoginOutcome::Success {
                message: "Welcome, John!".into(),
                session: SessionRef::new("s1"),
            }))
        };
        portal(&mut state, success());
        assert_eq!(state.screen, Screen::Dashboard);
        assert_eq!(state.welcome, "Welcome, John!");
        assert_eq!(state.session.stored().unwrap().unwrap().as_str(), "s1");
        assert!(state.login.password.text.is_empty());

        // A duplicate reply must not re-enter the dashboard.
        state.welcome = "unchanged".into();
        let actions = portal(&mut state, success());
        assert!(actions.is_empty());
        assert_eq!(state.welcome, "unchanged");
    }

    #[test]
    fn test_login_failure_reenables_button() {
        let mut state = login_ready();
        submit(&mut state);
        portal(
            &mut state,
            PortalEvent::LoginFinished(Ok(LoginOutcome::Failure {
                message: "An unknown login error occurred.".into(),
            })),
        );
        assert!(!state.login.busy);
        assert_eq!(state.screen, Screen::Login);
        assert_eq!(state.status.as_ref().unwrap().text, "An unknown login error occurred.");
    }

    #[test]
    fn test_fetch_section_disables_button_until_done() {
        let mut state = dashboard();
        let actions = key(&mut state, KeyCode::Char('1'));
        match actions.as_slice() {
            [Action::FetchSection { section, session }] => {
                assert_eq!(*section, Section::Timetable);
                assert_eq!(session.as_str(), "s9");
            }
            other => panic!("unexpected actions: {:?}", other),
        }
        assert!(state.sections.is_busy(Section::Timetable));
        assert!(key(&mut state, KeyCode::Char('t')).is_empty());

        portal(
            &mut state,
            PortalEvent::SectionFetched {
                section: Section::Timetable,
                session: SessionRef::new("s9"),
                result: Ok("<table><tr><td>MON</td><td>CSE1001</td></tr></table>".into()),
            },
        );
        assert!(!state.sections.is_busy(Section::Timetable));
        match &state.data {
            DataArea::Markup { section, lines, .. } => {
                assert_eq!(*section, Section::Timetable);
                assert_eq!(lines.len(), 1);
            }
            other => panic!("unexpected data area: {:?}", other),
        }
    }

    #[test]
    fn test_fetch_unauthorized_returns_to_login() {
        let mut state = dashboard();
        key(&mut state, KeyCode::Char('g'));
        let actions = portal(
            &mut state,
            PortalEvent::SectionFetched {
                section: Section::Grades,
                session: SessionRef::new("s9"),
                result: Err(PortalError::Unauthorized {
                    message: "Session expired. Please log in again.".into(),
                }),
            },
        );
        assert!(matches!(actions.as_slice(), [Action::StartLogin]));
        assert_eq!(state.screen, Screen::Login);
        assert_eq!(state.data, DataArea::Empty);
        assert_eq!(state.session.stored().unwrap(), None);
        assert!(state.session.current().is_none());
        let status = state.status.as_ref().unwrap();
        assert!(status.is_error());
        assert_eq!(status.text, "Session expired. Please log in again.");
    }

    #[test]
    fn test_fetch_other_error_goes_to_data_area() {
        let mut state = dashboard();
        key(&mut state, KeyCode::Char('a'));
        portal(
            &mut state,
            PortalEvent::SectionFetched {
                section: Section::Attendance,
                session: SessionRef::new("s9"),
                result: Err(PortalError::Status {
                    code: 500,
                    message: "Server error: 500".into(),
                }),
            },
        );
        assert_eq!(state.screen, Screen::Dashboard);
        assert_eq!(state.data, DataArea::Error("Server error: 500".into()));
        assert!(!state.sections.any_busy());
    }

    #[test]
    fn test_logout_clears_everything_immediately() {
        let mut state = dashboard();
        key(&mut state, KeyCode::Char('1'));
        portal(
            &mut state,
            PortalEvent::SectionFetched {
                section: Section::Timetable,
                session: SessionRef::new("s9"),
                result: Ok("<p>MON</p>".into()),
            },
        );
        key(&mut state, KeyCode::Char('2'));

        let actions = key(&mut state, KeyCode::Char('l'));
        match actions.as_slice() {
            [Action::Logout { session }, Action::StartLogin] => assert_eq!(session.as_str(), "s9"),
            other => panic!("unexpected actions: {:?}", other),
        }
        assert_eq!(state.screen, Screen::Login);
        assert_eq!(state.data, DataArea::Empty);
        assert_eq!(state.session.stored().unwrap(), None);
        assert!(state.welcome.is_empty());

        // The grades request was still in flight; its reply is dropped.
        portal(
            &mut state,
            PortalEvent::SectionFetched {
                section: Section::Grades,
                session: SessionRef::new("s9"),
                result: Ok("<p>A+</p>".into()),
            },
        );
        assert_eq!(state.screen, Screen::Login);
        assert_eq!(state.data, DataArea::Empty);
    }

    #[test]
    fn test_quit_keys() {
        let mut state = login_ready();
        // 'q' is text on the login form.
        assert!(key(&mut state, KeyCode::Char('q')).is_empty());
        let ctrl_c = handle_event(
            &mut state,
            AppEvent::Terminal(CEvent::Key(KeyEvent::new(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL,
            ))),
        );
        assert!(matches!(ctrl_c.as_slice(), [Action::Quit]));

        let mut state = dashboard();
        assert!(matches!(key(&mut state, KeyCode::Char('q')).as_slice(), [Action::Quit]));
    }

    #[test]
    fn test_open_captcha() {
        let mut state = login_ready();
        let actions = handle_event(
            &mut state,
            AppEvent::Terminal(CEvent::Key(KeyEvent::new(
                KeyCode::Char('o'),
                KeyModifiers::CONTROL,
            ))),
        );
        match actions.as_slice() {
            [Action::OpenCaptcha { path }] => assert_eq!(path, &PathBuf::from("/tmp/s1.png")),
            other => panic!("unexpected actions: {:?}", other),
        }
        assert!(state.login.username.text.is_empty());
    }

    #[test]
    fn test_tick_only_redraws_while_animating() {
        let mut state = dashboard();
        state.dirty = false;
        handle_event(&mut state, AppEvent::Tick);
        assert!(!state.dirty);
        key(&mut state, KeyCode::Char('1'));
        state.dirty = false;
        handle_event(&mut state, AppEvent::Tick);
        assert!(state.dirty);
    }

    #[test]
    fn test_rejected_stored_session_is_removed() {
        let mut state = state_with(SessionCheckMode::Stored, Some("dead"));
        initialize(&mut state);
        let check = crate::portal::decode::check_session(
            401,
            r#"{"status":"failure","message":"Session expired."}"#,
        );
        let actions = portal(&mut state, PortalEvent::SessionChecked(check));
        assert!(matches!(actions.as_slice(), [Action::StartLogin]));
        assert_eq!(state.screen, Screen::Login);
        assert_eq!(state.session.stored().unwrap(), None);
        assert!(!state.status.as_ref().unwrap().is_error());
    }

    #[test]
    fn test_backend_outage_keeps_stored_session() {
        let mut state = state_with(SessionCheckMode::Stored, Some("s9"));
        initialize(&mut state);
        let check = crate::portal::decode::check_session(503, "Service Unavailable");
        portal(&mut state, PortalEvent::SessionChecked(check));
        assert_eq!(state.screen, Screen::Login);
        assert_eq!(
            state.status.as_ref().unwrap().text,
            "Connection Error: Server error: 503"
        );
        assert_eq!(state.session.stored().unwrap().unwrap().as_str(), "s9");
    }

    #[test]
    fn test_reply_from_previous_login_is_dropped() {
        let mut state = dashboard();
        key(&mut state, KeyCode::Char('g'));
        key(&mut state, KeyCode::Char('l'));

        // Log in again with a fresh session and start the same fetch.
        portal(&mut state, PortalEvent::CaptchaLoaded(Ok(view("new"))));
        submit(&mut state);
        portal(
            &mut state,
            PortalEvent::LoginFinished(Ok(LoginOutcome::Success {
                message: "Welcome, John!".into(),
                session: SessionRef::new("new"),
            })),
        );
        assert_eq!(state.screen, Screen::Dashboard);
        key(&mut state, KeyCode::Char('g'));

        let actions = portal(
            &mut state,
            PortalEvent::SectionFetched {
                section: Section::Grades,
                session: SessionRef::new("s9"),
                result: Err(PortalError::Unauthorized {
                    message: "Session expired. Please log in again.".into(),
                }),
            },
        );
        assert!(actions.is_empty());
        assert_eq!(state.screen, Screen::Dashboard);
        assert_eq!(state.session.stored().unwrap().unwrap().as_str(), "new");
        assert!(state.sections.is_busy(Section::Grades));
        assert_eq!(state.data, DataArea::Empty);

        portal(
            &mut state,
            PortalEvent::SectionFetched {
                section: Section::Grades,
                session: SessionRef::new("new"),
                result: Ok("<p>A+</p>".into()),
            },
        );
        assert!(!state.sections.is_busy(Section::Grades));
        assert!(matches!(state.data, DataArea::Markup { section: Section::Grades, .. }));
    }
}
