use crate::app::state::AppState;
use crate::ui::theme::{self, Theme};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub const LOGO: [&str; 5] = [
    r" ___         _        _ ___          _    ",
    r"| _ \___ _ _| |_ __ _| |   \ __ _ __| |_  ",
    r"|  _/ _ \ '_|  _/ _` | | |) / _` (_-< ' \ ",
    r"|_| \___/_|  \__\__,_|_|___/\__,_/__/_||_|",
    r"                                          ",
];

/// Animated banner shown while a stored session is being checked.
pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let tick = state.tick_count;
    let logo_h = LOGO.len() as u16;
    let total_h = logo_h + 2;
    let start_y = area.y + area.height.saturating_sub(total_h) / 2;

    for (i, line) in LOGO.iter().enumerate() {
        let y = start_y + i as u16;
        if y >= area.y + area.height {
            return;
        }
        let line_w = line.len() as u16;
        let x = area.x + area.width.saturating_sub(line_w) / 2;
        frame.render_widget(
            Paragraph::new(banner_line(line, tick)),
            Rect::new(x, y, line_w.min(area.width), 1),
        );
    }

    let msg_y = start_y + logo_h + 1;
    if msg_y < area.y + area.height {
        let line = Line::from(vec![
            Span::styled(format!("{} ", theme::spinner(tick)), Theme::spinner()),
            Span::styled("Checking session...", Style::default().fg(Theme::TEXT_SECONDARY)),
        ]);
        frame.render_widget(
            Paragraph::new(line).alignment(Alignment::Center),
            Rect::new(area.x, msg_y, area.width, 1),
        );
    }
}

/// One banner row, each glyph colored by its column.
pub fn banner_line(line: &str, tick: u64) -> Line<'static> {
    let spans: Vec<Span> = line
        .chars()
        .enumerate()
        .map(|(c, ch)| {
            if ch == ' ' {
                Span::raw(" ")
            } else {
                Span::styled(
                    ch.to_string(),
                    Style::default()
                        .fg(theme::wave_color(c as u16, tick))
                        .add_modifier(Modifier::BOLD),
                )
            }
        })
        .collect();
    Line::from(spans)
}
