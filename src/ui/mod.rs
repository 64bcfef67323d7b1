mod dashboard;
mod layout;
mod loading;
mod login_form;
pub mod markup;
mod status_bar;
mod theme;

use crate::app::state::AppState;
use crate::app::view::Screen;
use ratatui::prelude::*;
use ratatui::widgets::Block;

pub fn render(frame: &mut Frame, state: &AppState) {
    let area = frame.area();
    let app_layout = layout::compute_layout(area);

    frame.render_widget(Block::default().style(theme::Theme::panel_bg()), app_layout.content);

    match state.screen {
        Screen::Loading => loading::render(frame, app_layout.content, state),
        Screen::Login => login_form::render(frame, app_layout.content, state),
        Screen::Dashboard => dashboard::render(frame, app_layout.content, state),
    }
    status_bar::render(frame, app_layout.status_bar, state);
}
