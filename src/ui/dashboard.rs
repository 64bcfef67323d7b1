use crate::app::state::AppState;
use crate::app::view::DataArea;
use crate::portal::types::Section;
use crate::ui::layout;
use crate::ui::theme::{self, Theme};
use ratatui::prelude::*;
use ratatui::widgets::{
    Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
};

pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let areas = layout::dashboard_layout(area);

    let welcome = Line::from(vec![
        Span::styled(format!(" {}", state.welcome), Theme::welcome()),
        Span::styled("   l ", Theme::key_hint()),
        Span::styled("logout  ", Theme::hint()),
        Span::styled("q ", Theme::key_hint()),
        Span::styled("quit", Theme::hint()),
    ]);
    frame.render_widget(Paragraph::new(welcome), areas.welcome);

    render_sections(frame, areas.sections, state);
    render_data(frame, areas.data, state);
}

fn section_key(section: Section) -> char {
    match section {
        Section::Timetable => '1',
        Section::Grades => '2',
        Section::Attendance => '3',
    }
}

fn render_sections(frame: &mut Frame, area: Rect, state: &AppState) {
    let cells = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(area);

    for (section, cell) in Section::ALL.into_iter().zip(cells.iter()) {
        let busy = state.sections.is_busy(section);
        let shown = matches!(state.data, DataArea::Markup { section: s, .. } if s == section);

        let (border_style, border_type) = if shown {
            (Theme::border_focused(), Theme::border_type_focused())
        } else {
            (Theme::border(), Theme::border_type())
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(border_type)
            .border_style(border_style)
            .style(Theme::panel_bg());
        let inner = block.inner(*cell);
        frame.render_widget(block, *cell);

        let line = if busy {
            Line::from(vec![
                Span::styled(format!("{} ", theme::spinner(state.tick_count)), Theme::spinner()),
                Span::styled("Loading...", Theme::hint()),
            ])
        } else {
            Line::from(vec![
                Span::styled(format!("{} ", section_key(section)), Theme::key_hint()),
                Span::styled(section.label(), Theme::title()),
            ])
        };
        frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), inner);
    }
}

fn render_data(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = match state.data {
        DataArea::Markup {
            section,
            ref fetched_at,
            ..
        } => Line::from(vec![
            Span::styled(format!(" {} ", section.label()), Theme::title()),
            Span::styled(format!("[{}] ", fetched_at), Theme::timestamp()),
        ]),
        _ => Line::from(Span::styled(" Data ", Theme::title())),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(Theme::border_type())
        .border_style(Theme::border())
        .style(Theme::panel_bg());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = match state.data {
        DataArea::Empty => vec![Line::from(Span::styled(
            "Select a section to load it.",
            Style::default().fg(Theme::TEXT_MUTED),
        ))],
        DataArea::Error(ref message) => vec![Line::from(Span::styled(
            format!("Error: {}", message),
            Theme::error_message(),
        ))],
        DataArea::Markup { ref lines, .. } if lines.is_empty() => vec![Line::from(Span::styled(
            "No data.",
            Style::default().fg(Theme::TEXT_MUTED),
        ))],
        DataArea::Markup { ref lines, .. } => lines.clone(),
    };

    let total = lines.len();
    let available_height = inner.height as usize;
    let scroll = state.data_scroll.min(total.saturating_sub(1));

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll.min(u16::MAX as usize) as u16, 0));
    frame.render_widget(paragraph, inner);

    // Scrollbar
    if total > available_height {
        let mut scrollbar_state = ScrollbarState::new(total.saturating_sub(available_height))
            .position(scroll);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .thumb_symbol("┃")
            .track_symbol(Some("│"))
            .thumb_style(Theme::scrollbar_thumb())
            .track_style(Theme::scrollbar_track());
        frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }
}
