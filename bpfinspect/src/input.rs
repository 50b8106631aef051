use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, AppMode, Pane};

/// Handle a crossterm event, returning true if the app should quit.
pub fn handle_event(app: &mut App, event: Event) -> bool {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::Mouse(mouse) => {
            handle_mouse(app, mouse);
            false
        }
        _ => false,
    }
}

fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    match app.mode {
        AppMode::Normal => handle_normal_key(app, key),
        AppMode::Help => handle_help_key(app, key),
        AppMode::ConfirmDelete => handle_confirm_key(app, key),
        AppMode::Edit => handle_edit_key(app, key),
        AppMode::Features => handle_features_key(app, key),
        AppMode::FeatureFilter => handle_feature_filter_key(app, key),
    }
}

fn handle_normal_key(app: &mut App, key: KeyEvent) -> bool {
    // Pending multi-key sequences (gg, yy)
    if let Some(pending) = app.pending_key.take() {
        match (pending, key.code) {
            ('g', KeyCode::Char('g')) => {
                app.select_first();
                return false;
            }
            ('y', KeyCode::Char('y')) => {
                app.yank();
                return false;
            }
            _ => { /* cancel pending, fall through to handle current key */ }
        }
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('u') => {
                app.move_selection(-(app.page_size() / 2).max(1));
                return false;
            }
            KeyCode::Char('d') => {
                app.move_selection((app.page_size() / 2).max(1));
                return false;
            }
            KeyCode::Char('f') => {
                app.open_features();
                return false;
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::F(10) => return true,

        KeyCode::F(1) | KeyCode::Char('?') => app.mode = AppMode::Help,

        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.prev(),
        KeyCode::Esc => {
            if app.focus == Pane::Entries {
                app.focus = Pane::Maps;
            } else {
                app.focus = Pane::Programs;
            }
        }

        // Navigation (vi-style j/k + arrows)
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::Home => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::PageUp => app.move_selection(-app.page_size()),
        KeyCode::PageDown => app.move_selection(app.page_size()),
        KeyCode::Char('g') => app.pending_key = Some('g'),
        KeyCode::Char('y') => app.pending_key = Some('y'),

        KeyCode::Enter => match app.focus {
            Pane::Programs => app.focus = Pane::Maps,
            Pane::Maps => app.open_selected_map(),
            Pane::Entries => app.begin_edit(),
            Pane::Disassembly => {}
        },
        KeyCode::Char('d') | KeyCode::Delete => {
            if app.focus == Pane::Entries && app.selected_entry().is_some() {
                app.mode = AppMode::ConfirmDelete;
            }
        }

        // Rendering of map entries
        KeyCode::Char('f') => app.update_render_config(|c| bpfinspect_common::RenderConfig {
            format: c.format.next(),
            ..c
        }),
        KeyCode::Char('w') => app.update_render_config(|c| bpfinspect_common::RenderConfig {
            width: c.width.next(),
            ..c
        }),
        KeyCode::Char('e') => app.update_render_config(|c| bpfinspect_common::RenderConfig {
            endianness: c.endianness.toggle(),
            ..c
        }),
        KeyCode::Char('W') => app.save_render_config(),

        KeyCode::Char('r') | KeyCode::F(5) => {
            if app.focus == Pane::Entries {
                app.reload_entries();
            } else {
                app.request_refresh();
            }
        }

        _ => {}
    }

    false
}

fn handle_help_key(app: &mut App, key: KeyEvent) -> bool {
    if matches!(
        key.code,
        KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q') | KeyCode::Char('?')
    ) {
        app.mode = AppMode::Normal;
    }
    false
}

fn handle_confirm_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.mode = AppMode::Normal,
        _ => {}
    }
    false
}

fn handle_edit_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            app.mode = AppMode::Normal;
            app.prompt.clear();
        }
        KeyCode::Enter => app.commit_edit(),
        KeyCode::Backspace => {
            app.prompt.pop();
        }
        KeyCode::Char(c) => app.prompt.push(c),
        _ => {}
    }
    false
}

fn handle_features_key(app: &mut App, key: KeyEvent) -> bool {
    let page = app.page_size();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.mode = AppMode::Normal,
        KeyCode::Char('f') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.mode = AppMode::Normal
        }
        KeyCode::Char('/') => app.mode = AppMode::FeatureFilter,
        KeyCode::Up | KeyCode::Char('k') => app.scroll_features(-1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_features(1),
        KeyCode::PageUp => app.scroll_features(-page),
        KeyCode::PageDown => app.scroll_features(page),
        KeyCode::Home | KeyCode::Char('g') => app.feature_scroll = 0,
        KeyCode::End | KeyCode::Char('G') => app.scroll_features(i32::MAX),
        KeyCode::Char('r') | KeyCode::F(5) => app.reload_features(),
        _ => {}
    }
    false
}

/// Search is applied on every keystroke.
fn handle_feature_filter_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Enter | KeyCode::Tab | KeyCode::BackTab => app.mode = AppMode::Features,
        KeyCode::Esc => {
            app.set_feature_query(String::new());
            app.mode = AppMode::Features;
        }
        KeyCode::Backspace => {
            let mut query = app.feature_query.clone();
            query.pop();
            app.set_feature_query(query);
        }
        KeyCode::Char(c) => {
            let query = format!("{}{c}", app.feature_query);
            app.set_feature_query(query);
        }
        _ => {}
    }
    false
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let delta = match mouse.kind {
        MouseEventKind::ScrollUp => -3,
        MouseEventKind::ScrollDown => 3,
        _ => return,
    };
    if matches!(app.mode, AppMode::Features | AppMode::FeatureFilter) {
        app.scroll_features(delta);
    } else {
        app.move_selection(delta);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bpfinspect::error::ProbeError;
    use bpfinspect::probe::{ToolOutput, ToolRunner};
    use bpfinspect::Monitor;
    use bpfinspect_common::{DataFormat, Endianness};

    use super::*;
    use crate::config::Config;

    struct NoTool;

    impl ToolRunner for NoTool {
        fn run(&self, args: &[String]) -> Result<ToolOutput, ProbeError> {
            Err(ProbeError::Launch {
                command: self.command_line(args),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            })
        }
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_event(app, Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn app() -> App {
        App::new(Config::default(), Monitor::new(Arc::new(NoTool)), None)
    }

    #[test]
    fn quit_keys() {
        let mut app = app();
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(handle_event(
            &mut app,
            Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
        ));
    }

    #[test]
    fn help_opens_and_closes() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.mode, AppMode::Help);
        // q closes help instead of quitting
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn render_keys_cycle_config() {
        let mut app = app();
        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.config.render.format, DataFormat::Decimal);
        assert_eq!(app.config.render.endianness, Endianness::Big);
    }

    #[test]
    fn delete_needs_a_selected_entry() {
        let mut app = app();
        app.focus = Pane::Entries;
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn edit_prompt_collects_input_and_escape_discards() {
        let mut app = app();
        app.mode = AppMode::Edit;
        press(&mut app, KeyCode::Char('0'));
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.prompt, "0");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.prompt.is_empty());
    }

    #[test]
    fn ctrl_f_opens_feature_search() {
        let mut app = app();
        handle_event(
            &mut app,
            Event::Key(KeyEvent::new(KeyCode::Char('f'), KeyModifiers::CONTROL)),
        );
        assert_eq!(app.mode, AppMode::FeatureFilter);
        // Typed keys go to the search, not to the render toggles
        press(&mut app, KeyCode::Char('f'));
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.feature_query, "fq");
        assert_eq!(app.config.render.format, DataFormat::Hex);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, AppMode::Features);
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.feature_query, "fq");
    }

    #[test]
    fn tab_cycles_focus() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Pane::Disassembly);
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, Pane::Entries);
    }
}
