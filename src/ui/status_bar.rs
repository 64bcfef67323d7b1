use crate::app::state::AppState;
use crate::app::view::Screen;
use crate::ui::theme::{self, Theme};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use unicode_width::UnicodeWidthStr;

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut parts: Vec<Span> = Vec::new();

    // Spinner while something is in flight
    if state.is_animating() {
        parts.push(Span::styled(
            format!(" {} ", theme::spinner(state.tick_count)),
            Theme::spinner().bg(Color::DarkGray),
        ));
    }

    // Status text
    if let Some(ref status) = state.status {
        let style = if status.is_error() {
            Theme::error_message()
        } else {
            Theme::info_message()
        };
        parts.push(Span::styled(format!(" {} ", status.text), style.bg(Color::DarkGray)));
    }

    // Screen indicator
    let screen_name = match state.screen {
        Screen::Loading => "LOADING",
        Screen::Login => "LOGIN",
        Screen::Dashboard => "DASHBOARD",
    };
    // Pad to fill remaining space
    let used: usize = parts.iter().map(|s| s.content.width()).sum();
    let remaining = (area.width as usize).saturating_sub(used + screen_name.len() + 3);
    parts.push(Span::styled(" ".repeat(remaining), Theme::status_bar()));
    parts.push(Span::styled(
        format!(" [{}] ", screen_name),
        Style::default().fg(Theme::ACCENT_TEAL).bg(Color::DarkGray),
    ));

    let line = Line::from(parts);
    let paragraph = Paragraph::new(line).style(Theme::status_bar());
    frame.render_widget(paragraph, area);
}
