use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Widget;

use crate::theme::Theme;

/// One-line input for editing a map value.
pub struct PromptBarWidget<'a> {
    pub label: &'a str,
    pub input: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Widget for PromptBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg_style = Style::default()
            .fg(self.theme.fg)
            .bg(self.theme.status_bg);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(bg_style);
        }

        let input_style = Style::default()
            .fg(self.theme.selection_fg)
            .bg(self.theme.status_bg);
        let line = Line::from(vec![
            Span::styled(
                format!("{}: ", self.label),
                Style::default()
                    .fg(self.theme.status_key)
                    .bg(self.theme.status_bg),
            ),
            Span::styled(self.input, input_style),
            Span::styled("_", input_style),
        ]);

        buf.set_line(area.x, area.y, &line, area.width);
    }
}
