use std::ops::Range;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use super::pane_block;
use crate::theme::Theme;

/// One visible line of `bpftool feature probe` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureLine<'a> {
    /// Section line such as `Scanning eBPF program types...`.
    Header(&'a str),
    /// A feature line, with the byte range matching the search if any.
    Entry {
        text: &'a str,
        hit: Option<Range<usize>>,
    },
}

fn is_header(line: &str) -> bool {
    let line = line.trim_end();
    line.ends_with(':') || line.ends_with("...")
}

/// Lines of `text` containing `query`, case-insensitively. A section header
/// is kept only when at least one of its lines matches. An empty query keeps
/// everything.
pub fn filter_features<'a>(text: &'a str, query: &str) -> Vec<FeatureLine<'a>> {
    let needle = query.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut pending_header = None;

    for line in text.lines() {
        if is_header(line) {
            if needle.is_empty() {
                out.push(FeatureLine::Header(line));
            } else {
                pending_header = Some(line);
            }
            continue;
        }
        if needle.is_empty() {
            out.push(FeatureLine::Entry { text: line, hit: None });
            continue;
        }
        // ASCII lowering keeps byte offsets valid for the highlight.
        let Some(start) = line.to_ascii_lowercase().find(&needle) else {
            continue;
        };
        if let Some(header) = pending_header.take() {
            out.push(FeatureLine::Header(header));
        }
        out.push(FeatureLine::Entry {
            text: line,
            hit: Some(start..start + needle.len()),
        });
    }
    out
}

/// Full-page view of the kernel's BPF feature support.
pub struct FeaturesPage<'a> {
    pub lines: &'a [FeatureLine<'a>],
    pub query: &'a str,
    pub scroll: usize,
    pub error: Option<&'a str>,
    pub theme: &'a Theme,
}

impl<'a> Widget for FeaturesPage<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.query.is_empty() {
            " Features (/ to search) ".to_string()
        } else {
            format!(" Features matching \"{}\" ", self.query)
        };
        let block = pane_block(title, true, self.theme);

        if let Some(err) = self.error {
            let lines: Vec<Line> = err
                .lines()
                .map(|l| Line::styled(l.to_string(), Style::default().fg(self.theme.error)))
                .collect();
            Paragraph::new(lines).block(block).render(area, buf);
            return;
        }

        let header = Style::default()
            .fg(self.theme.title)
            .add_modifier(Modifier::BOLD);
        let hit = Style::default()
            .fg(self.theme.error)
            .add_modifier(Modifier::BOLD);

        let lines: Vec<Line> = self
            .lines
            .iter()
            .skip(self.scroll)
            .map(|line| match line {
                FeatureLine::Header(text) => Line::styled(*text, header),
                FeatureLine::Entry { text, hit: None } => Line::raw(*text),
                FeatureLine::Entry {
                    text,
                    hit: Some(range),
                } => Line::from(vec![
                    Span::raw(&text[..range.start]),
                    Span::styled(&text[range.clone()], hit),
                    Span::raw(&text[range.end..]),
                ]),
            })
            .collect();
        Paragraph::new(lines).block(block).render(area, buf);
    }
}
