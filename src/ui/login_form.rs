use crate::app::state::{AppState, InputState, LoginField};
use crate::app::view::CaptchaSlot;
use crate::ui::layout;
use crate::ui::loading::banner_line;
use crate::ui::theme::{self, Theme};
use ratatui::prelude::*;
use ratatui::widgets::block::Padding;
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthStr;

const MASK: char = '•';

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let areas = layout::login_layout(area);

    frame.render_widget(
        Paragraph::new(vec![
            banner_line("Student Portal", state.tick_count),
            Line::from(Span::styled("Sign in to continue", Theme::hint())),
        ])
        .alignment(Alignment::Center),
        areas.banner,
    );

    render_field(frame, areas.username, state, LoginField::Username);
    render_field(frame, areas.password, state, LoginField::Password);
    render_captcha_slot(frame, areas.captcha_image, state);
    render_field(frame, areas.captcha, state, LoginField::Captcha);
    render_button(frame, areas.button, state);

    let hints = Line::from(vec![
        Span::styled("Tab ", Theme::key_hint()),
        Span::styled("next  ", Theme::hint()),
        Span::styled("Enter ", Theme::key_hint()),
        Span::styled("login  ", Theme::hint()),
        Span::styled("F5 ", Theme::key_hint()),
        Span::styled("new captcha  ", Theme::hint()),
        Span::styled("^O ", Theme::key_hint()),
        Span::styled("open image", Theme::hint()),
    ]);
    frame.render_widget(
        Paragraph::new(hints).alignment(Alignment::Center),
        areas.hints,
    );
}

fn render_field(frame: &mut Frame, area: Rect, state: &AppState, field: LoginField) {
    let focused = state.login.focus == field;
    let (border_style, border_type, bg) = if focused {
        (
            Theme::border_focused(),
            Theme::border_type_focused(),
            Theme::panel_bg_focused(),
        )
    } else {
        (Theme::border(), Theme::border_type(), Theme::panel_bg())
    };

    let block = Block::default()
        .title(format!(" {} ", field.label()))
        .title_style(if focused { Theme::title() } else { Theme::label() })
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .padding(Padding::horizontal(1))
        .style(bg);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let input = state.login.field(field);
    let shown = display_text(input, field);
    frame.render_widget(Paragraph::new(shown).style(Theme::input_text()), inner);

    if focused && !state.login.busy && inner.width > 0 {
        let offset = cursor_offset(input, field) as u16;
        frame.set_cursor_position(((inner.x + offset).min(inner.right() - 1), inner.y));
    }
}

fn display_text(input: &InputState, field: LoginField) -> String {
    match field {
        LoginField::Password => input.text.chars().map(|_| MASK).collect(),
        _ => input.text.clone(),
    }
}

fn cursor_offset(input: &InputState, field: LoginField) -> usize {
    let before = &input.text[..input.cursor];
    match field {
        LoginField::Password => before.chars().count(),
        _ => before.width(),
    }
}

fn render_captcha_slot(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title(" CAPTCHA ")
        .title_style(Theme::label())
        .borders(Borders::ALL)
        .border_type(Theme::border_type())
        .border_style(Theme::border())
        .padding(Padding::horizontal(1))
        .style(Theme::panel_bg());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line = match state.captcha {
        CaptchaSlot::Hidden => Line::default(),
        CaptchaSlot::Loading => Line::from(vec![
            Span::styled(format!("{} ", theme::spinner(state.tick_count)), Theme::spinner()),
            Span::styled("Loading CAPTCHA...", Theme::hint()),
        ]),
        CaptchaSlot::Ready(ref view) => {
            let name = view
                .path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(name, Theme::input_text()),
                Span::styled(format!(" ({} bytes) ", view.size), Theme::hint()),
                Span::styled("^O", Theme::key_hint()),
                Span::styled(" to view", Theme::hint()),
            ])
        }
        CaptchaSlot::Unavailable => {
            Line::from(Span::styled("Could not load CAPTCHA", Theme::error_message()))
        }
    };
    frame.render_widget(Paragraph::new(line), inner);
}

fn render_button(frame: &mut Frame, area: Rect, state: &AppState) {
    let (label, style) = if state.login.busy {
        (
            format!("{} Processing...", theme::spinner(state.tick_count)),
            Theme::button_disabled(),
        )
    } else {
        ("Login".to_string(), Theme::button())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(Theme::border_type_focused())
        .border_style(if state.login.busy {
            Theme::border()
        } else {
            Theme::border_focused()
        });
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(Span::styled(label, style)).alignment(Alignment::Center),
        inner,
    );
}
