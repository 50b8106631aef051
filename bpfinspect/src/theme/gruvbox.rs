use super::palette::*;
use super::Theme;

/// Returns the gruvbox dark theme.
pub fn dark() -> Theme {
    Theme {
        // Layout
        bg: DARK_BG,
        fg: DARK_FG,
        dim: DARK_FG4,
        border: DARK_BG3,
        border_focus: BR_YELLOW,
        title: BR_AQUA,
        selection_bg: DARK_BG2,
        selection_fg: BR_YELLOW,

        // Program kinds
        kind_tracing: BR_GREEN,
        kind_network: BR_BLUE,
        kind_cgroup: BR_PURPLE,

        // Messages
        error: BR_RED,
        warning: BR_ORANGE,

        // Status bar
        status_bg: DARK_BG2,
        status_fg: DARK_FG,
        status_key: BR_ORANGE,

        // Column headers
        column_header_fg: DARK_BG,
        column_header_bg: BR_GREEN,
    }
}

/// Returns the gruvbox light theme.
pub fn light() -> Theme {
    Theme {
        // Layout
        bg: LIGHT_BG,
        fg: LIGHT_FG,
        dim: LIGHT_FG4,
        border: LIGHT_BG3,
        border_focus: ORANGE,
        title: AQUA,
        selection_bg: LIGHT_BG2,
        selection_fg: ORANGE,

        // Program kinds
        kind_tracing: GREEN,
        kind_network: BLUE,
        kind_cgroup: PURPLE,

        // Messages
        error: RED,
        warning: YELLOW,

        // Status bar
        status_bg: LIGHT_BG2,
        status_fg: LIGHT_FG,
        status_key: ORANGE,

        // Column headers
        column_header_fg: LIGHT_BG,
        column_header_bg: GREEN,
    }
}
