use bpfinspect::data::program::ProgramEntity;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Widget;

use super::{fit, pane_block};
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Kind,
    Tag,
    Name,
    Attach,
}

impl Column {
    pub fn all() -> &'static [Column] {
        &[Self::Id, Self::Kind, Self::Tag, Self::Name, Self::Attach]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Kind => "TYPE",
            Self::Tag => "TAG",
            Self::Name => "NAME",
            Self::Attach => "ATTACHED",
        }
    }

    /// Fixed width; `Attach` takes whatever is left.
    pub fn width(self) -> u16 {
        match self {
            Self::Id => 6,
            Self::Kind => 14,
            Self::Tag => 16,
            Self::Name => 16,
            Self::Attach => 0,
        }
    }

    fn text(self, prog: &ProgramEntity) -> String {
        match self {
            Self::Id => prog.id.to_string(),
            Self::Kind => prog.kind.clone(),
            Self::Tag => prog.tag.clone(),
            Self::Name => prog.name.clone(),
            Self::Attach => prog.attach_summary(),
        }
    }
}

/// Scrollable list of loaded programs.
pub struct ProgramListWidget<'a> {
    pub programs: &'a [ProgramEntity],
    pub selected: usize,
    pub scroll_offset: usize,
    pub focused: bool,
    pub theme: &'a Theme,
    /// Shown instead of the rows when nothing could be listed.
    pub error_message: Option<&'a str>,
}

impl<'a> Widget for ProgramListWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = pane_block(
            format!(" Programs ({}) ", self.programs.len()),
            self.focused,
            self.theme,
        );
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height < 2 {
            return;
        }

        let columns = column_layout(inner.width);
        self.render_header(Rect { height: 1, ..inner }, buf, &columns);

        let rows_area = Rect {
            y: inner.y + 1,
            height: inner.height - 1,
            ..inner
        };

        if self.programs.is_empty() {
            if let Some(msg) = self.error_message {
                let err_style = Style::default()
                    .fg(self.theme.error)
                    .add_modifier(Modifier::BOLD);
                let mut y = rows_area.y + 1;
                for line in msg.lines() {
                    if y >= rows_area.bottom() {
                        break;
                    }
                    buf.set_string(rows_area.x + 1, y, fit(line, rows_area.width.saturating_sub(2) as usize), err_style);
                    y += 1;
                }
            }
            return;
        }

        let end = (self.scroll_offset + rows_area.height as usize).min(self.programs.len());
        for (i, prog) in self.programs[self.scroll_offset.min(end)..end].iter().enumerate() {
            let row = Rect {
                y: rows_area.y + i as u16,
                height: 1,
                ..rows_area
            };
            let selected = self.scroll_offset + i == self.selected;
            self.render_row(row, buf, prog, selected, &columns);
        }
    }
}

impl<'a> ProgramListWidget<'a> {
    fn render_header(&self, area: Rect, buf: &mut Buffer, columns: &[(Column, u16)]) {
        let style = Style::default()
            .fg(self.theme.column_header_fg)
            .bg(self.theme.column_header_bg)
            .add_modifier(Modifier::BOLD);
        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }
        render_cells(area, buf, columns, style, |col| col.label().to_string());
    }

    fn render_row(
        &self,
        area: Rect,
        buf: &mut Buffer,
        prog: &ProgramEntity,
        selected: bool,
        columns: &[(Column, u16)],
    ) {
        let (fg, bg) = if selected {
            (self.theme.selection_fg, self.theme.selection_bg)
        } else {
            (kind_color(prog, self.theme), self.theme.bg)
        };
        let style = Style::default().fg(fg).bg(bg);
        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }
        render_cells(area, buf, columns, style, |col| col.text(prog));
    }
}

fn render_cells(
    area: Rect,
    buf: &mut Buffer,
    columns: &[(Column, u16)],
    style: Style,
    text: impl Fn(Column) -> String,
) {
    let mut x = area.x;
    for &(col, width) in columns {
        if x >= area.right() {
            break;
        }
        let cell = match col {
            Column::Id => format!("{:>w$}", text(col), w = width as usize),
            _ => fit(&text(col), width as usize),
        };
        buf.set_stringn(x, area.y, &cell, (area.right() - x) as usize, style);
        x = x.saturating_add(width + 1);
    }
}

fn kind_color(prog: &ProgramEntity, theme: &Theme) -> Color {
    if prog.is_tracing() {
        theme.kind_tracing
    } else if prog.is_network() {
        theme.kind_network
    } else if prog.is_cgroup() {
        theme.kind_cgroup
    } else {
        theme.fg
    }
}

fn column_layout(total_width: u16) -> Vec<(Column, u16)> {
    let fixed: u16 = Column::all()
        .iter()
        .filter(|c| **c != Column::Attach)
        .map(|c| c.width() + 1)
        .sum();
    Column::all()
        .iter()
        .map(|&c| {
            let width = if c == Column::Attach {
                total_width.saturating_sub(fixed)
            } else {
                c.width()
            };
            (c, width)
        })
        .collect()
}

/// Rows available for programs in a pane of this size.
pub fn visible_rows(area: Rect) -> usize {
    // borders plus the column header
    area.height.saturating_sub(3) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prog(id: u32, kind: &str, name: &str) -> ProgramEntity {
        ProgramEntity {
            id,
            kind: kind.to_string(),
            tag: "f00d".to_string(),
            name: name.to_string(),
            ..ProgramEntity::default()
        }
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol())
            .collect::<String>()
    }

    #[test]
    fn attach_column_takes_remaining_width() {
        let cols = column_layout(100);
        assert_eq!(cols.last(), Some(&(Column::Attach, 100 - (7 + 15 + 17 + 17))));
        assert_eq!(column_layout(10).last(), Some(&(Column::Attach, 0)));
    }

    #[test]
    fn renders_rows_below_header() {
        let theme = Theme::default();
        let programs = [prog(3, "kprobe", "trace_open"), prog(17, "xdp", "xdp_pass")];
        let area = Rect::new(0, 0, 80, 6);
        let mut buf = Buffer::empty(area);
        ProgramListWidget {
            programs: &programs,
            selected: 1,
            scroll_offset: 0,
            focused: true,
            theme: &theme,
            error_message: None,
        }
        .render(area, &mut buf);

        assert!(row_text(&buf, 0).contains("Programs (2)"));
        assert!(row_text(&buf, 1).contains("TYPE"));
        assert!(row_text(&buf, 2).contains("trace_open"));
        assert!(row_text(&buf, 3).contains("xdp_pass"));
        assert_eq!(buf[(1, 3)].bg, theme.selection_bg);
    }

    #[test]
    fn error_shown_when_nothing_listed() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 60, 6);
        let mut buf = Buffer::empty(area);
        ProgramListWidget {
            programs: &[],
            selected: 0,
            scroll_offset: 0,
            focused: false,
            theme: &theme,
            error_message: Some("bpftool exited with status 255"),
        }
        .render(area, &mut buf);
        assert!(row_text(&buf, 3).contains("status 255"));
    }
}
