//! View-model slots.
//!
//! The controller writes these; `ui` only reads them. Nothing here knows how
//! a slot is drawn.

use crate::portal::captcha::CaptchaView;
use crate::portal::types::Section;
use ratatui::text::Line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Login,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Info,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: StatusKind::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptchaSlot {
    Hidden,
    Loading,
    Ready(CaptchaView),
    /// "Could not load CAPTCHA"
    Unavailable,
}

impl CaptchaSlot {
    pub fn from_view(view: CaptchaView) -> Self {
        if view.path.is_some() {
            CaptchaSlot::Ready(view)
        } else {
            CaptchaSlot::Unavailable
        }
    }
}

/// The dashboard's data area.
#[derive(Debug, Clone, PartialEq)]
pub enum DataArea {
    Empty,
    /// Backend markup, already converted to terminal lines.
    Markup {
        section: Section,
        lines: Vec<Line<'static>>,
        fetched_at: String,
    },
    Error(String),
}

impl DataArea {
    pub fn line_count(&self) -> usize {
        match self {
            DataArea::Empty => 0,
            DataArea::Markup { lines, .. } => lines.len(),
            DataArea::Error(_) => 1,
        }
    }
}

/// The section buttons. A button is disabled while its own fetch runs.
#[derive(Debug, Clone, Default)]
pub struct SectionBar {
    busy: Vec<Section>,
}

impl SectionBar {
    pub fn is_busy(&self, section: Section) -> bool {
        self.busy.contains(&section)
    }

    pub fn any_busy(&self) -> bool {
        !self.busy.is_empty()
    }

    /// Returns false if the section was already in flight.
    pub fn begin(&mut self, section: Section) -> bool {
        if self.is_busy(section) {
            return false;
        }
        self.busy.push(section);
        true
    }

    pub fn finish(&mut self, section: Section) {
        self.busy.retain(|s| *s != section);
    }

    pub fn reset(&mut self) {
        self.busy.clear();
    }
}
