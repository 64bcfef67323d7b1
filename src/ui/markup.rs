//! Backend markup to terminal lines.
//!
//! The dashboard fragments are pre-rendered HTML meant for a browser. This is
//! a tolerant single pass over the tags that matter for a terminal: block
//! elements break lines, table cells are joined with a rule, headings and
//! bold/table headers are emphasized, and `<script>`/`<style>` bodies are
//! dropped. Anything else is ignored and its text kept.

use crate::ui::theme::Theme;
use ratatui::prelude::*;

const CELL_SEPARATOR: &str = " │ ";

/// Convert an HTML fragment into styled lines.
pub fn to_lines(html: &str) -> Vec<Line<'static>> {
    let mut builder = Builder::default();
    let mut rest = html;

    while let Some(lt) = rest.find('<') {
        builder.text(&rest[..lt]);
        rest = &rest[lt..];

        if let Some(after) = rest.strip_prefix("<!--") {
            rest = after.find("-->").map(|end| &after[end + 3..]).unwrap_or("");
            continue;
        }

        match tag_end(rest) {
            Some(end) => {
                builder.tag(&rest[1..end]);
                rest = &rest[end + 1..];
            }
            None => {
                // Unterminated tag: treat the rest as text.
                builder.text(rest);
                rest = "";
            }
        }
    }
    builder.text(rest);
    builder.finish()
}

// Index of the `>` closing the tag at the start of `s`, skipping quoted
// attribute values.
fn tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "br"
            | "tr"
            | "li"
            | "ul"
            | "ol"
            | "table"
            | "thead"
            | "tbody"
            | "tfoot"
            | "caption"
            | "section"
            | "header"
            | "footer"
            | "form"
            | "fieldset"
            | "legend"
            | "pre"
            | "blockquote"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
    )
}

fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

#[derive(Default)]
struct Builder {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    text: String,
    pending_space: bool,
    bold: usize,
    italic: usize,
    heading: usize,
    pre: usize,
    skipping: Option<String>,
    cells_in_row: usize,
}

impl Builder {
    fn style(&self) -> Style {
        let mut style = if self.heading > 0 {
            Theme::markup_heading()
        } else {
            Theme::markup_text()
        };
        if self.bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        style
    }

    fn line_is_empty(&self) -> bool {
        self.spans.is_empty() && self.text.is_empty()
    }

    fn flush_span(&mut self) {
        if !self.text.is_empty() {
            let style = self.style();
            self.spans.push(Span::styled(std::mem::take(&mut self.text), style));
        }
    }

    fn push_char(&mut self, c: char) {
        if self.pending_space && !self.line_is_empty() {
            self.text.push(' ');
        }
        self.pending_space = false;
        self.text.push(c);
    }

    fn text(&mut self, raw: &str) {
        if self.skipping.is_some() || raw.is_empty() {
            return;
        }
        let decoded = decode_entities(raw);
        if self.pre > 0 {
            let mut first = true;
            for part in decoded.split('\n') {
                if !first {
                    self.break_line();
                }
                first = false;
                self.text.push_str(part);
            }
            return;
        }
        for c in decoded.chars() {
            match c {
                '\u{a0}' => self.push_char(' '),
                c if c.is_whitespace() => self.pending_space = true,
                c => self.push_char(c),
            }
        }
    }

    fn break_line(&mut self) {
        self.flush_span();
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
        self.pending_space = false;
    }

    fn blank_line(&mut self) {
        self.break_line();
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn tag(&mut self, raw: &str) {
        let raw = raw.trim();
        let closing = raw.starts_with('/');
        let name: String = raw
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        if name.is_empty() {
            return;
        }

        if let Some(ref skipped) = self.skipping {
            if closing && *skipped == name {
                self.skipping = None;
            }
            return;
        }
        if !closing && matches!(name.as_str(), "script" | "style" | "head" | "title") {
            if !raw.ends_with('/') {
                self.skipping = Some(name);
            }
            return;
        }

        match (name.as_str(), closing) {
            ("td" | "th", false) => {
                if self.cells_in_row > 0 {
                    self.flush_span();
                    self.spans
                        .push(Span::styled(CELL_SEPARATOR, Theme::markup_rule()));
                    self.pending_space = false;
                }
                self.cells_in_row += 1;
                if name == "th" {
                    self.flush_span();
                    self.bold += 1;
                }
            }
            ("th", true) => {
                self.flush_span();
                self.bold = self.bold.saturating_sub(1);
            }
            ("tr", _) => {
                self.break_line();
                self.cells_in_row = 0;
            }
            ("hr", _) => {
                self.break_line();
                self.lines
                    .push(Line::from(Span::styled("─".repeat(40), Theme::markup_rule())));
            }
            ("li", false) => {
                self.break_line();
                self.text.push_str("• ");
            }
            ("b" | "strong", false) => {
                self.flush_span();
                self.bold += 1;
            }
            ("b" | "strong", true) => {
                self.flush_span();
                self.bold = self.bold.saturating_sub(1);
            }
            ("i" | "em", false) => {
                self.flush_span();
                self.italic += 1;
            }
            ("i" | "em", true) => {
                self.flush_span();
                self.italic = self.italic.saturating_sub(1);
            }
            (n, false) if is_heading(n) => {
                self.blank_line();
                self.heading += 1;
            }
            (n, true) if is_heading(n) => {
                self.flush_span();
                self.heading = self.heading.saturating_sub(1);
                self.blank_line();
            }
            ("pre", false) => {
                self.break_line();
                self.pre += 1;
            }
            ("pre", true) => {
                self.break_line();
                self.pre = self.pre.saturating_sub(1);
            }
            ("p" | "table", true) => self.blank_line(),
            (n, _) if is_block(n) => self.break_line(),
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.break_line();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Decode the character references a fragment realistically contains.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| entity(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '–',
        "mdash" => '—',
        "copy" => '©',
        _ => return None,
    })
}
