use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Widget;

use super::{fit, pane_block};
use crate::theme::Theme;

/// Entries of the open map, already rendered to text.
pub struct EntryTableWidget<'a> {
    /// Map label and active render config, e.g. "counts [hex 32-bit little]".
    pub title: &'a str,
    pub rows: &'a [(String, String)],
    pub selected: usize,
    pub scroll_offset: usize,
    pub focused: bool,
    pub error: Option<&'a str>,
    pub theme: &'a Theme,
}

impl<'a> Widget for EntryTableWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = pane_block(format!(" {} ", self.title), self.focused, self.theme);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height < 2 {
            return;
        }

        let key_width = key_column_width(self.rows, inner.width);
        let value_width = inner.width.saturating_sub(key_width + 1) as usize;

        let header_style = Style::default()
            .fg(self.theme.column_header_fg)
            .bg(self.theme.column_header_bg)
            .add_modifier(Modifier::BOLD);
        let header = format!("{} {}", fit("KEY", key_width as usize), fit("VALUE", value_width));
        buf.set_stringn(inner.x, inner.y, header, inner.width as usize, header_style);

        if let Some(err) = self.error {
            let style = Style::default().fg(self.theme.error);
            buf.set_stringn(inner.x, inner.y + 1, err, inner.width as usize, style);
            return;
        }

        let rows_height = (inner.height - 1) as usize;
        for (i, (key, value)) in self
            .rows
            .iter()
            .skip(self.scroll_offset)
            .take(rows_height)
            .enumerate()
        {
            let selected = self.scroll_offset + i == self.selected;
            let style = if selected && self.focused {
                Style::default()
                    .fg(self.theme.selection_fg)
                    .bg(self.theme.selection_bg)
            } else {
                Style::default().fg(self.theme.fg).bg(self.theme.bg)
            };
            let line = format!("{} {}", fit(key, key_width as usize), fit(value, value_width));
            buf.set_stringn(inner.x, inner.y + 1 + i as u16, line, inner.width as usize, style);
        }
    }
}

/// Wide enough for the longest key, capped at half the pane.
fn key_column_width(rows: &[(String, String)], total: u16) -> u16 {
    let longest = rows
        .iter()
        .map(|(k, _)| unicode_width::UnicodeWidthStr::width(k.as_str()))
        .max()
        .unwrap_or(0)
        .max(3) as u16;
    longest.min(total / 2)
}

/// Rows available for entries in a pane of this size.
pub fn visible_rows(area: Rect) -> usize {
    area.height.saturating_sub(3) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_column_fits_longest_key_up_to_half() {
        let rows = vec![
            ("0x01".to_string(), "0x2a".to_string()),
            ("0x0102".to_string(), "0x00".to_string()),
        ];
        assert_eq!(key_column_width(&rows, 80), 6);
        assert_eq!(key_column_width(&rows, 8), 4);
        assert_eq!(key_column_width(&[], 80), 3);
    }

    #[test]
    fn renders_header_and_rows() {
        let theme = Theme::default();
        let rows = vec![("0x01".to_string(), "0x0000002a".to_string())];
        let area = Rect::new(0, 0, 40, 5);
        let mut buf = Buffer::empty(area);
        EntryTableWidget {
            title: "counts [hex 32-bit little]",
            rows: &rows,
            selected: 0,
            scroll_offset: 0,
            focused: true,
            error: None,
            theme: &theme,
        }
        .render(area, &mut buf);

        let line = |y: u16| (0..40).map(|x| buf[(x, y)].symbol()).collect::<String>();
        assert!(line(0).contains("counts [hex 32-bit little]"));
        assert!(line(1).contains("KEY"));
        assert!(line(2).contains("0x01 0x0000002a"));
    }
}
