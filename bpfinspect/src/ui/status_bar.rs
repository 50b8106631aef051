use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use crate::theme::Theme;

/// Renders the bottom status bar with key hints.
pub struct StatusBarWidget<'a> {
    pub theme: &'a Theme,
    /// "hex 8-bit little" etc.
    pub render: &'a str,
    /// Published snapshot generation; 0 before the first refresh.
    pub generation: u64,
    /// Last refresh failure, or a startup warning.
    pub warning: Option<&'a str>,
    pub flash: Option<&'a str>,
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg_style = Style::default()
            .fg(self.theme.status_fg)
            .bg(self.theme.status_bg);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(bg_style);
        }

        let key_style = Style::default()
            .fg(self.theme.status_key)
            .bg(self.theme.status_bg);

        let keys = [
            ("?", "Help"),
            ("Tab", "Pane"),
            ("r", "Refresh"),
            ("f/w/e", "Format"),
            ("q", "Quit"),
        ];

        let mut spans = Vec::new();
        for (key, label) in &keys {
            spans.push(Span::styled(*key, key_style));
            spans.push(Span::styled(*label, bg_style));
            spans.push(Span::styled(" ", bg_style));
        }

        spans.push(Span::styled(format!(" [{}]", self.render), bg_style));
        if self.generation == 0 {
            spans.push(Span::styled(" loading", bg_style));
        } else {
            spans.push(Span::styled(format!(" #{}", self.generation), bg_style));
        }

        if let Some(warning) = self.warning {
            spans.push(Span::styled(
                format!("  {warning}"),
                Style::default()
                    .fg(self.theme.warning)
                    .bg(self.theme.status_bg),
            ));
        }

        // Transient feedback (yank, saved config, edit result)
        if let Some(flash) = self.flash {
            spans.push(Span::styled(
                format!("  {flash}"),
                key_style.add_modifier(Modifier::BOLD),
            ));
        }

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
