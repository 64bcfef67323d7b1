use crate::app::view::{CaptchaSlot, DataArea, Screen, SectionBar, StatusLine};
use crate::config::AppConfig;
use crate::session::Session;
use chrono::Local;

#[derive(Debug, Default)]
pub struct InputState {
    pub text: String,
    pub cursor: usize,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn delete_back(&mut self) {
        if self.cursor > 0 {
            let prev = self.text[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.text.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.text.len() {
            let next = self.text[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.text.len());
            self.text.drain(self.cursor..next);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.text[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.text.len() {
            self.cursor = self.text[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.text.len());
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn delete_word_back(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let mut pos = self.cursor;
        // Skip trailing whitespace
        while pos > 0 && self.text.as_bytes().get(pos - 1) == Some(&b' ') {
            pos -= 1;
        }
        // Skip word characters
        while pos > 0 && self.text.as_bytes().get(pos - 1) != Some(&b' ') {
            pos -= 1;
        }
        self.text.drain(pos..self.cursor);
        self.cursor = pos;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
    Captcha,
}

impl LoginField {
    pub const ALL: [LoginField; 3] = [LoginField::Username, LoginField::Password, LoginField::Captcha];

    pub fn label(self) -> &'static str {
        match self {
            LoginField::Username => "Username",
            LoginField::Password => "Password",
            LoginField::Captcha => "Captcha",
        }
    }

    pub fn next(self) -> Self {
        match self {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Captcha,
            LoginField::Captcha => LoginField::Username,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            LoginField::Username => LoginField::Captcha,
            LoginField::Password => LoginField::Username,
            LoginField::Captcha => LoginField::Password,
        }
    }
}

#[derive(Debug)]
pub struct LoginForm {
    pub username: InputState,
    pub password: InputState,
    pub captcha: InputState,
    pub focus: LoginField,
    /// Submit in flight; the login button shows "Processing..." and is disabled.
    pub busy: bool,
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            username: InputState::new(),
            password: InputState::new(),
            captcha: InputState::new(),
            focus: LoginField::Username,
            busy: false,
        }
    }

    pub fn field(&self, field: LoginField) -> &InputState {
        match field {
            LoginField::Username => &self.username,
            LoginField::Password => &self.password,
            LoginField::Captcha => &self.captcha,
        }
    }

    pub fn focused_mut(&mut self) -> &mut InputState {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
            LoginField::Captcha => &mut self.captcha,
        }
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub screen: Screen,
    pub session: Session,
    pub login: LoginForm,
    pub captcha: CaptchaSlot,
    pub status: Option<StatusLine>,
    pub welcome: String,
    pub sections: SectionBar,
    pub data: DataArea,
    pub data_scroll: usize,
    pub tick_count: u64,
    pub should_quit: bool,
    pub dirty: bool,
}

impl AppState {
    pub fn new(config: AppConfig, session: Session) -> Self {
        Self {
            config,
            screen: Screen::Loading,
            session,
            login: LoginForm::new(),
            captcha: CaptchaSlot::Hidden,
            status: None,
            welcome: String::new(),
            sections: SectionBar::default(),
            data: DataArea::Empty,
            data_scroll: 0,
            tick_count: 0,
            should_quit: false,
            dirty: true,
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine::info(text));
        self.dirty = true;
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine::error(text));
        self.dirty = true;
    }

    pub fn timestamp(&self) -> String {
        Local::now().format(&self.config.ui.timestamp_format).to_string()
    }

    /// Something on screen is waiting on the backend and needs the spinner.
    pub fn is_animating(&self) -> bool {
        match self.screen {
            Screen::Loading => true,
            Screen::Login => self.login.busy || self.captcha == CaptchaSlot::Loading,
            Screen::Dashboard => self.sections.any_busy(),
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.data_scroll = self.data_scroll.saturating_sub(lines);
        self.dirty = true;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        let max = self.data.line_count().saturating_sub(1);
        self.data_scroll = (self.data_scroll + lines).min(max);
        self.dirty = true;
    }

    pub fn scroll_to_end(&mut self) {
        self.data_scroll = self.data.line_count().saturating_sub(1);
        self.dirty = true;
    }
}
