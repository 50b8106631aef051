use bpfinspect::data::map::MapEntity;
use bpfinspect::data::program::ProgramEntity;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use super::{fit, pane_block};
use crate::theme::Theme;

/// Key/value details of the selected program.
pub struct InfoPane<'a> {
    pub program: Option<&'a ProgramEntity>,
    pub theme: &'a Theme,
}

impl<'a> Widget for InfoPane<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = pane_block(" Info ".to_string(), false, self.theme);
        let Some(program) = self.program else {
            Paragraph::new(Line::styled("no program selected", Style::default().fg(self.theme.dim)))
                .block(block)
                .render(area, buf);
            return;
        };

        let key_style = Style::default()
            .fg(self.theme.status_key)
            .add_modifier(Modifier::BOLD);
        let lines: Vec<Line> = program
            .info_lines()
            .into_iter()
            .map(|(key, value)| {
                Line::from(vec![
                    Span::styled(format!("{key:<18}"), key_style),
                    Span::raw(value),
                ])
            })
            .collect();
        Paragraph::new(lines).block(block).render(area, buf);
    }
}

/// Translated instructions of the selected program.
pub struct DisassemblyPane<'a> {
    pub lines: &'a [String],
    pub scroll: usize,
    pub focused: bool,
    pub error: Option<&'a str>,
    pub theme: &'a Theme,
}

impl<'a> Widget for DisassemblyPane<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = pane_block(" Disassembly ".to_string(), self.focused, self.theme);
        if let Some(err) = self.error {
            Paragraph::new(Line::styled(err.to_string(), Style::default().fg(self.theme.error)))
                .block(block)
                .render(area, buf);
            return;
        }

        let annotation = Style::default().fg(self.theme.dim);
        let lines: Vec<Line> = self
            .lines
            .iter()
            .skip(self.scroll)
            .map(|l| {
                if l.starts_with(';') || l.ends_with(':') {
                    Line::styled(l.as_str(), annotation)
                } else {
                    Line::raw(l.as_str())
                }
            })
            .collect();
        Paragraph::new(lines).block(block).render(area, buf);
    }
}

/// Maps referenced by the selected program.
pub struct MapListPane<'a> {
    pub maps: &'a [MapEntity],
    pub selected: usize,
    pub focused: bool,
    pub error: Option<&'a str>,
    pub theme: &'a Theme,
}

impl<'a> Widget for MapListPane<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = pane_block(" Maps ".to_string(), self.focused, self.theme);
        let inner = block.inner(area);
        block.render(area, buf);

        if let Some(err) = self.error {
            let style = Style::default().fg(self.theme.error);
            buf.set_stringn(inner.x, inner.y, err, inner.width as usize, style);
            return;
        }

        let height = inner.height as usize;
        let offset = self.selected.saturating_sub(height.saturating_sub(1));
        for (i, map) in self.maps.iter().skip(offset).take(height).enumerate() {
            let selected = offset + i == self.selected;
            let style = if selected && self.focused {
                Style::default()
                    .fg(self.theme.selection_fg)
                    .bg(self.theme.selection_bg)
            } else if selected {
                Style::default().fg(self.theme.selection_fg)
            } else {
                Style::default().fg(self.theme.fg)
            };
            let y = inner.y + i as u16;
            buf.set_string(inner.x, y, fit(&map.summary_line(), inner.width as usize), style);
        }
    }
}
