use ratatui::layout::{Constraint, Direction, Flex, Layout, Rect};

pub struct AppLayout {
    pub content: Rect,
    pub status_bar: Rect,
}

pub fn compute_layout(area: Rect) -> AppLayout {
    // Main vertical split: content | status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    AppLayout {
        content: main_chunks[0],
        status_bar: main_chunks[1],
    }
}

pub struct LoginLayout {
    pub banner: Rect,
    pub username: Rect,
    pub password: Rect,
    pub captcha_image: Rect,
    pub captcha: Rect,
    pub button: Rect,
    pub hints: Rect,
}

/// Centered login card.
pub fn login_layout(area: Rect) -> LoginLayout {
    let [column] = Layout::horizontal([Constraint::Length(52)])
        .flex(Flex::Center)
        .areas(area);
    let [card] = Layout::vertical([Constraint::Length(20)])
        .flex(Flex::Center)
        .areas(column);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Banner
            Constraint::Length(3), // Username
            Constraint::Length(3), // Password
            Constraint::Length(3), // Captcha image
            Constraint::Length(3), // Captcha input
            Constraint::Length(3), // Button
            Constraint::Min(1),    // Hints
        ])
        .split(card);

    let [button] = Layout::horizontal([Constraint::Length(18)])
        .flex(Flex::Center)
        .areas(chunks[5]);

    LoginLayout {
        banner: chunks[0],
        username: chunks[1],
        password: chunks[2],
        captcha_image: chunks[3],
        captcha: chunks[4],
        button,
        hints: chunks[6],
    }
}

pub struct DashboardLayout {
    pub welcome: Rect,
    pub sections: Rect,
    pub data: Rect,
}

pub fn dashboard_layout(area: Rect) -> DashboardLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Welcome
            Constraint::Length(3), // Section buttons
            Constraint::Min(3),    // Data area
        ])
        .split(area);

    DashboardLayout {
        welcome: chunks[0],
        sections: chunks[1],
        data: chunks[2],
    }
}
