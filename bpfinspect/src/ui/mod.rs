pub mod detail;
pub mod dialogs;
pub mod features;
pub mod layout;
pub mod map_table;
pub mod program_list;
pub mod prompt_bar;
pub mod status_bar;

use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders};
use unicode_width::UnicodeWidthChar;

use crate::theme::Theme;

/// Bordered pane; the focused one gets the accent border.
pub fn pane_block<'a>(title: String, focused: bool, theme: &Theme) -> Block<'a> {
    let border = if focused { theme.border_focus } else { theme.border };
    Block::default()
        .title(title)
        .title_style(Style::default().fg(theme.title).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(theme.bg).fg(theme.fg))
}

/// Cut `text` to at most `width` terminal columns, then left-align it.
pub fn fit(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.extend(std::iter::repeat(' ').take(width - used));
    out
}

#[cfg(test)]
mod tests {
    use super::fit;

    #[test]
    fn fit_pads_and_truncates_by_display_width() {
        assert_eq!(fit("xdp", 5), "xdp  ");
        assert_eq!(fit("tracepoint", 5), "trace");
        assert_eq!(fit("名前名前", 5), "名前 ");
        assert_eq!(fit("", 0), "");
    }
}
