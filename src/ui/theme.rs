use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

pub struct Theme;

impl Theme {
    pub const BG: Color = Color::Rgb(22, 24, 30);
    pub const BG_FOCUSED: Color = Color::Rgb(28, 31, 39);
    pub const TEXT_PRIMARY: Color = Color::Rgb(220, 223, 228);
    pub const TEXT_SECONDARY: Color = Color::Rgb(150, 156, 168);
    pub const TEXT_MUTED: Color = Color::Rgb(95, 100, 112);
    pub const ACCENT_TEAL: Color = Color::Rgb(80, 200, 210);
    pub const ACCENT_AMBER: Color = Color::Rgb(230, 180, 80);
    pub const ACCENT_ROSE: Color = Color::Rgb(225, 95, 110);
    pub const ACCENT_GREEN: Color = Color::Rgb(90, 210, 130);

    pub fn border() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::ACCENT_TEAL)
    }

    pub fn border_type() -> BorderType {
        BorderType::Plain
    }

    pub fn border_type_focused() -> BorderType {
        BorderType::Rounded
    }

    pub fn panel_bg() -> Style {
        Style::default().bg(Self::BG)
    }

    pub fn panel_bg_focused() -> Style {
        Style::default().bg(Self::BG_FOCUSED)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn label() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    pub fn hint() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::ACCENT_TEAL)
            .add_modifier(Modifier::BOLD)
    }

    pub fn input_text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    pub fn button() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Self::ACCENT_TEAL)
            .add_modifier(Modifier::BOLD)
    }

    pub fn button_disabled() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY).bg(Self::TEXT_MUTED)
    }

    pub fn welcome() -> Style {
        Style::default()
            .fg(Self::ACCENT_GREEN)
            .add_modifier(Modifier::BOLD)
    }

    pub fn spinner() -> Style {
        Style::default().fg(Self::ACCENT_AMBER)
    }

    pub fn timestamp() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    pub fn info_message() -> Style {
        Style::default().fg(Self::ACCENT_GREEN)
    }

    pub fn error_message() -> Style {
        Style::default().fg(Self::ACCENT_ROSE)
    }

    pub fn markup_text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    pub fn markup_heading() -> Style {
        Style::default()
            .fg(Self::ACCENT_TEAL)
            .add_modifier(Modifier::BOLD)
    }

    pub fn markup_rule() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    pub fn scrollbar_thumb() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    pub fn scrollbar_track() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    pub fn status_bar() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY).bg(Color::DarkGray)
    }
}

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Braille spinner frame for the 50 ms tick counter.
pub fn spinner(tick: u64) -> &'static str {
    SPINNER[(tick / 2) as usize % SPINNER.len()]
}

/// Animated gradient used by the banner, shifted by column and tick.
pub fn wave_color(col: u16, tick: u64) -> Color {
    let gradient: [(f64, f64, f64); 6] = [
        (80.0, 200.0, 210.0),  // teal
        (100.0, 170.0, 230.0), // blue
        (175.0, 140.0, 220.0), // lavender
        (220.0, 150.0, 180.0), // pink
        (230.0, 180.0, 80.0),  // amber
        (90.0, 210.0, 130.0),  // green
    ];
    let len = gradient.len() as f64;
    let phase = (col as f64 * 0.15 - tick as f64 * 0.12).rem_euclid(len);
    let idx = phase.floor() as usize;
    let frac = phase - phase.floor();
    let (r1, g1, b1) = gradient[idx % gradient.len()];
    let (r2, g2, b2) = gradient[(idx + 1) % gradient.len()];
    Color::Rgb(
        (r1 + (r2 - r1) * frac) as u8,
        (g1 + (g2 - g1) * frac) as u8,
        (b1 + (b2 - b1) * frac) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_cycles() {
        assert_eq!(spinner(0), spinner(20));
        assert_ne!(spinner(0), spinner(2));
    }
}
