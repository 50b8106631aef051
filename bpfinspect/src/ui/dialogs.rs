use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap};

use crate::theme::Theme;

/// Key bindings shown in the help overlay.
pub const BINDINGS: &[(&str, &str)] = &[
    ("q / Ctrl+C", "Quit"),
    ("? / F1", "This help"),
    ("Tab / Shift+Tab", "Next / previous pane"),
    ("j / k", "Navigate down / up"),
    ("gg / G", "Jump to top / bottom"),
    ("PgUp / PgDn", "Page up / down"),
    ("Enter", "Open map / edit entry value"),
    ("d", "Delete entry"),
    ("f", "Cycle format (hex, decimal, char, raw)"),
    ("w", "Cycle width (8, 16, 32, 64 bit)"),
    ("e", "Toggle endianness"),
    ("W", "Save render settings to config"),
    ("r", "Refresh now"),
    ("Ctrl+F", "Kernel feature probe (/ to search)"),
    ("yy", "Yank selected entry or program"),
    ("Esc", "Back / cancel"),
];

/// Help overlay showing all keybindings.
pub struct HelpDialog<'a> {
    pub theme: &'a Theme,
}

impl<'a> Widget for HelpDialog<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dialog = centered_rect(60, 70, area);
        Clear.render(dialog, buf);

        let block = dialog_block(" Help ", self.theme);
        let inner = block.inner(dialog);
        block.render(dialog, buf);

        let key_style = Style::default()
            .fg(self.theme.status_key)
            .add_modifier(Modifier::BOLD);
        let desc_style = Style::default().fg(self.theme.fg);

        let lines: Vec<Line> = BINDINGS
            .iter()
            .map(|(key, desc)| {
                Line::from(vec![
                    Span::styled(format!("{key:<18}"), key_style),
                    Span::styled(*desc, desc_style),
                ])
            })
            .collect();

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

/// Yes/no confirmation before deleting a map entry.
pub struct ConfirmDialog<'a> {
    pub map_id: u32,
    pub key: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Widget for ConfirmDialog<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dialog = centered_rect(50, 25, area);
        Clear.render(dialog, buf);

        let block = dialog_block(" Delete entry ", self.theme);
        let inner = block.inner(dialog);
        block.render(dialog, buf);

        let key_style = Style::default()
            .fg(self.theme.status_key)
            .add_modifier(Modifier::BOLD);
        let lines = vec![
            Line::raw(format!("Delete key {} from map {}?", self.key, self.map_id)),
            Line::raw(""),
            Line::from(vec![
                Span::styled("y", key_style),
                Span::raw(" delete   "),
                Span::styled("n / Esc", key_style),
                Span::raw(" cancel"),
            ]),
        ];
        Paragraph::new(lines)
            .style(Style::default().fg(self.theme.fg))
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

fn dialog_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focus))
        .style(Style::default().bg(theme.bg))
}

/// Center a rectangle within an area by percentage.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
