pub mod gruvbox;
pub mod palette;

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Semantic color roles for the TUI. Each field maps to a specific
/// UI element purpose rather than a raw color name.
#[derive(Debug, Clone)]
pub struct Theme {
    // Layout
    pub bg: Color,
    pub fg: Color,
    pub dim: Color,
    pub border: Color,
    pub border_focus: Color,
    pub title: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,

    // Program kinds
    pub kind_tracing: Color,
    pub kind_network: Color,
    pub kind_cgroup: Color,

    // Messages
    pub error: Color,
    pub warning: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,
    pub status_key: Color,

    // Column headers
    pub column_header_fg: Color,
    pub column_header_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        gruvbox::dark()
    }
}

impl Theme {
    /// Create a theme from a preset name, with optional color overrides.
    pub fn from_config(preset: &str, overrides: &ThemeOverrides) -> Self {
        let mut theme = match preset {
            "gruvbox-light" => gruvbox::light(),
            "gruvbox-dark" => gruvbox::dark(),
            other => {
                log::warn!("unknown theme preset {other:?}, using gruvbox-dark");
                gruvbox::dark()
            }
        };
        theme.apply_overrides(overrides);
        theme
    }

    fn apply_overrides(&mut self, ov: &ThemeOverrides) {
        let slots = [
            (&ov.bg, &mut self.bg),
            (&ov.fg, &mut self.fg),
            (&ov.dim, &mut self.dim),
            (&ov.border, &mut self.border),
            (&ov.border_focus, &mut self.border_focus),
            (&ov.title, &mut self.title),
            (&ov.selection_bg, &mut self.selection_bg),
            (&ov.selection_fg, &mut self.selection_fg),
            (&ov.kind_tracing, &mut self.kind_tracing),
            (&ov.kind_network, &mut self.kind_network),
            (&ov.kind_cgroup, &mut self.kind_cgroup),
            (&ov.error, &mut self.error),
            (&ov.warning, &mut self.warning),
            (&ov.status_key, &mut self.status_key),
        ];
        for (value, slot) in slots {
            match value.as_deref().map(parse_hex_color) {
                Some(Some(color)) => *slot = color,
                Some(None) => log::warn!("ignoring theme override {value:?}: expected #rrggbb"),
                None => {}
            }
        }
    }
}

/// Deserializable theme override section from config TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeOverrides {
    pub bg: Option<String>,
    pub fg: Option<String>,
    pub dim: Option<String>,
    pub border: Option<String>,
    pub border_focus: Option<String>,
    pub title: Option<String>,
    pub selection_bg: Option<String>,
    pub selection_fg: Option<String>,
    pub kind_tracing: Option<String>,
    pub kind_network: Option<String>,
    pub kind_cgroup: Option<String>,
    pub error: Option<String>,
    pub warning: Option<String>,
    pub status_key: Option<String>,
}

/// Parse a hex color string like "#fb4934" into a ratatui Color.
fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.strip_prefix('#')?;
    if s.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&s[0..2], 16).ok()?;
    let g = u8::from_str_radix(&s[2..4], 16).ok()?;
    let b = u8::from_str_radix(&s[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}
