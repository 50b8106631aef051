use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Screen regions, left column first.
#[derive(Debug, Clone, Copy)]
pub struct MainAreas {
    pub programs: Rect,
    pub info: Rect,
    pub disassembly: Rect,
    pub maps: Rect,
    pub entries: Rect,
    pub prompt: Option<Rect>,
    pub status: Rect,
}

/// Programs on the left; info/disassembly over maps/entries on the right;
/// optional prompt line and the status bar at the bottom.
pub fn main_layout(area: Rect, prompt_active: bool) -> MainAreas {
    let prompt_height = if prompt_active { 1 } else { 0 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),
            Constraint::Length(prompt_height),
            Constraint::Length(1),
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[1]);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(right[0]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(right[1]);

    MainAreas {
        programs: columns[0],
        info: top[0],
        disassembly: top[1],
        maps: bottom[0],
        entries: bottom[1],
        prompt: prompt_active.then_some(rows[1]),
        status: rows[2],
    }
}
