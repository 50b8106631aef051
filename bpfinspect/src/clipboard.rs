use std::fs::OpenOptions;
use std::io::{self, Write};

use base64::Engine;

/// Put `text` on the terminal's clipboard with an OSC-52 sequence.
///
/// The sequence goes to `/dev/tty` rather than stdout, which ratatui owns.
pub fn yank(text: &str) -> io::Result<()> {
    let payload = osc52(text, std::env::var_os("TMUX").is_some());
    let mut tty = OpenOptions::new().write(true).open("/dev/tty")?;
    tty.write_all(payload.as_bytes())?;
    tty.flush()
}

/// Inside tmux the sequence is wrapped in a DCS passthrough with every ESC
/// doubled, so tmux forwards it to the outer terminal.
fn osc52(text: &str, tmux: bool) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text);
    let seq = format!("\x1b]52;c;{encoded}\x07");
    if tmux {
        format!("\x1bPtmux;{}\x1b\\", seq.replace('\x1b', "\x1b\x1b"))
    } else {
        seq
    }
}
