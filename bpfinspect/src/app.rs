use std::io;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bpfinspect::data::map::{MapEntity, MapEntry};
use bpfinspect::data::program::ProgramEntity;
use bpfinspect::data::registry::Snapshot;
use bpfinspect::data::scheduler::{CycleEvent, Scheduler};
use bpfinspect::error::ProbeError;
use bpfinspect::Monitor;
use bpfinspect_common::{parse_bytes, DataFormat, RenderConfig};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::Config;
use crate::input;
use crate::theme::Theme;
use crate::ui::detail::{DisassemblyPane, InfoPane, MapListPane};
use crate::ui::dialogs::{ConfirmDialog, HelpDialog};
use crate::ui::features::{filter_features, FeatureLine, FeaturesPage};
use crate::ui::layout::main_layout;
use crate::ui::map_table::{self, EntryTableWidget};
use crate::ui::program_list::{self, ProgramListWidget};
use crate::ui::prompt_bar::PromptBarWidget;
use crate::ui::status_bar::StatusBarWidget;

/// Current interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    Help,
    ConfirmDelete,
    Edit,
    /// `bpftool feature probe` page.
    Features,
    /// Feature page with the search prompt taking keys.
    FeatureFilter,
}

/// Pane receiving navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Programs,
    Disassembly,
    Maps,
    Entries,
}

impl Pane {
    const ORDER: [Pane; 4] = [Self::Programs, Self::Disassembly, Self::Maps, Self::Entries];

    pub fn next(self) -> Self {
        let idx = Self::ORDER.iter().position(|p| *p == self).unwrap_or(0);
        Self::ORDER[(idx + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ORDER.iter().position(|p| *p == self).unwrap_or(0);
        Self::ORDER[(idx + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Selection and scroll position of a list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub selected: usize,
    pub offset: usize,
    /// Rows on screen, set during draw.
    pub visible: usize,
}

impl Cursor {
    pub fn move_by(&mut self, delta: i32, len: usize) {
        if len == 0 {
            return;
        }
        let new = self.selected as i64 + i64::from(delta);
        self.selected = new.clamp(0, len as i64 - 1) as usize;
        self.adjust_scroll();
    }

    pub fn first(&mut self) {
        self.selected = 0;
        self.adjust_scroll();
    }

    pub fn last(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
        self.adjust_scroll();
    }

    /// Keep the cursor inside a list that may have shrunk.
    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
        self.offset = self.offset.min(len.saturating_sub(self.visible.max(1)));
        self.adjust_scroll();
    }

    fn adjust_scroll(&mut self) {
        if self.visible == 0 {
            return;
        }
        if self.selected < self.offset {
            self.offset = self.selected;
        }
        if self.selected >= self.offset + self.visible {
            self.offset = self.selected - self.visible + 1;
        }
    }
}

/// Main application state.
pub struct App {
    pub mode: AppMode,
    pub focus: Pane,
    pub config: Config,
    pub theme: Theme,
    monitor: Monitor,

    // Latest published snapshot
    pub programs: Vec<ProgramEntity>,
    pub generation: u64,
    pub program_cursor: Cursor,

    // Details of the selected program, loaded lazily
    details_for: Option<(u32, Vec<u32>)>,
    pub disassembly: Vec<String>,
    pub disasm_error: Option<String>,
    pub disasm_scroll: usize,
    pub maps: Vec<MapEntity>,
    pub map_error: Option<String>,
    pub map_cursor: Cursor,

    // Open map
    pub open_map: Option<MapEntity>,
    pub entries: Vec<MapEntry>,
    pub entry_rows: Vec<(String, String)>,
    pub entry_error: Option<String>,
    pub entry_cursor: Cursor,

    // Value editor
    pub prompt: String,

    // Feature probe page: probe text or the error to show, loaded on first open
    pub features: Option<Result<String, String>>,
    pub feature_query: String,
    pub feature_scroll: usize,

    // Vim multi-key sequences
    pub pending_key: Option<char>,

    // Flash message (transient status bar text)
    pub flash_message: Option<(String, Instant)>,
    pub startup_warning: Option<String>,
    pub refresh_error: Option<String>,

    // Redraw control
    pub dirty: bool,

    scheduler: Option<Scheduler>,
}

impl App {
    pub fn new(config: Config, monitor: Monitor, startup_warning: Option<String>) -> Self {
        let theme = Theme::from_config(&config.theme.preset, &config.theme.overrides);
        monitor.set_render_config(config.render);

        Self {
            mode: AppMode::Normal,
            focus: Pane::Programs,
            config,
            theme,
            monitor,
            programs: Vec::new(),
            generation: 0,
            program_cursor: Cursor::default(),
            details_for: None,
            disassembly: Vec::new(),
            disasm_error: None,
            disasm_scroll: 0,
            maps: Vec::new(),
            map_error: None,
            map_cursor: Cursor::default(),
            open_map: None,
            entries: Vec::new(),
            entry_rows: Vec::new(),
            entry_error: None,
            entry_cursor: Cursor::default(),
            prompt: String::new(),
            features: None,
            feature_query: String::new(),
            feature_scroll: 0,
            pending_key: None,
            flash_message: None,
            startup_warning,
            refresh_error: None,
            dirty: true,
            scheduler: None,
        }
    }

    /// Run the main event loop.
    pub fn run(&mut self) -> Result<()> {
        // First cycle on the main thread so the first frame has data
        match self.monitor.refresh_now() {
            Ok(snapshot) => self.apply_snapshot(&snapshot),
            Err(e) => self.refresh_error = Some(e.to_string()),
        }

        let (events_tx, events_rx) = mpsc::channel();
        let interval = Duration::from_millis(self.config.general.refresh_rate_ms);
        self.scheduler = Some(
            self.monitor
                .spawn_scheduler(interval, events_tx)
                .context("starting refresh thread")?,
        );

        enable_raw_mode().context("enabling raw mode")?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal, &events_rx);

        // Dropping signals stop; a cycle stuck in bpftool is not waited for.
        self.scheduler = None;

        disable_raw_mode()?;
        crossterm::execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        events: &Receiver<CycleEvent>,
    ) -> Result<()> {
        // Short poll timeout so UI stays responsive
        let poll_timeout = Duration::from_millis(50);

        loop {
            // Only the freshest snapshot matters
            let mut latest = None;
            while let Ok(event) = events.try_recv() {
                match event {
                    CycleEvent::Published(snapshot) => latest = Some(snapshot),
                    CycleEvent::Failed(e) => {
                        self.refresh_error = Some(e);
                        self.dirty = true;
                    }
                }
            }
            if let Some(snapshot) = latest {
                self.apply_snapshot(&snapshot);
            }

            if self.active_flash().is_some() {
                self.dirty = true;
            }

            if self.dirty {
                terminal.draw(|frame| self.draw(frame))?;
                self.dirty = false;
            }

            if event::poll(poll_timeout)? {
                let evt = event::read()?;
                if input::handle_event(self, evt) {
                    break;
                }
                self.dirty = true;
            } else {
                // Idle: fetch details for the selection the user settled on
                self.sync_details();
            }
        }
        Ok(())
    }

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();

        let bg_style = ratatui::style::Style::default().bg(self.theme.bg);
        frame.render_widget(ratatui::widgets::Clear, area);
        frame.render_widget(ratatui::widgets::Block::default().style(bg_style), area);

        let areas = main_layout(
            area,
            matches!(self.mode, AppMode::Edit | AppMode::FeatureFilter),
        );

        self.program_cursor.visible = program_list::visible_rows(areas.programs);
        self.map_cursor.visible = areas.maps.height.saturating_sub(2) as usize;
        self.entry_cursor.visible = map_table::visible_rows(areas.entries);

        frame.render_widget(
            ProgramListWidget {
                programs: &self.programs,
                selected: self.program_cursor.selected,
                scroll_offset: self.program_cursor.offset,
                focused: self.focus == Pane::Programs,
                theme: &self.theme,
                error_message: self.refresh_error.as_deref(),
            },
            areas.programs,
        );

        frame.render_widget(
            InfoPane {
                program: self.selected_program(),
                theme: &self.theme,
            },
            areas.info,
        );

        frame.render_widget(
            DisassemblyPane {
                lines: &self.disassembly,
                scroll: self.disasm_scroll,
                focused: self.focus == Pane::Disassembly,
                error: self.disasm_error.as_deref(),
                theme: &self.theme,
            },
            areas.disassembly,
        );

        frame.render_widget(
            MapListPane {
                maps: &self.maps,
                selected: self.map_cursor.selected,
                focused: self.focus == Pane::Maps,
                error: self.map_error.as_deref(),
                theme: &self.theme,
            },
            areas.maps,
        );

        let title = self.entry_title();
        frame.render_widget(
            EntryTableWidget {
                title: &title,
                rows: &self.entry_rows,
                selected: self.entry_cursor.selected,
                scroll_offset: self.entry_cursor.offset,
                focused: self.focus == Pane::Entries,
                error: self.entry_error.as_deref(),
                theme: &self.theme,
            },
            areas.entries,
        );

        if let Some(prompt_area) = areas.prompt {
            let (label, input) = if self.mode == AppMode::FeatureFilter {
                ("Feature", &self.feature_query)
            } else {
                ("New value", &self.prompt)
            };
            frame.render_widget(
                PromptBarWidget {
                    label,
                    input,
                    theme: &self.theme,
                },
                prompt_area,
            );
        }

        let render = self.monitor.render_config().describe();
        let warning = self
            .refresh_error
            .as_deref()
            .or(self.startup_warning.as_deref());
        frame.render_widget(
            StatusBarWidget {
                theme: &self.theme,
                render: &render,
                generation: self.generation,
                warning,
                flash: self.active_flash(),
            },
            areas.status,
        );

        match self.mode {
            AppMode::Help => frame.render_widget(HelpDialog { theme: &self.theme }, area),
            AppMode::ConfirmDelete => {
                if let (Some(map), Some((key, _))) =
                    (&self.open_map, self.entry_rows.get(self.entry_cursor.selected))
                {
                    frame.render_widget(
                        ConfirmDialog {
                            map_id: map.id,
                            key,
                            theme: &self.theme,
                        },
                        area,
                    );
                }
            }
            AppMode::Features | AppMode::FeatureFilter => {
                let lines = self.feature_lines();
                let error = match &self.features {
                    Some(Err(e)) => Some(e.as_str()),
                    _ => None,
                };
                frame.render_widget(
                    FeaturesPage {
                        lines: &lines,
                        query: &self.feature_query,
                        scroll: self.feature_scroll,
                        error,
                        theme: &self.theme,
                    },
                    areas.programs.union(areas.entries),
                );
            }
            _ => {}
        }
    }

    fn entry_title(&self) -> String {
        let render = self.monitor.render_config().describe();
        match &self.open_map {
            Some(map) if map.name.is_empty() => format!("map {} [{render}]", map.id),
            Some(map) => format!("{} [{render}]", map.name),
            None => "Entries".to_string(),
        }
    }

    // --- Snapshot handling ---

    /// Take a new snapshot, keeping the cursor on the same program id.
    pub fn apply_snapshot(&mut self, snapshot: &Arc<Snapshot>) {
        let keep = self.selected_program().map(|p| p.id);
        self.programs = snapshot.programs().cloned().collect();
        self.generation = snapshot.generation;
        self.refresh_error = None;

        if let Some(pos) = keep.and_then(|id| self.programs.iter().position(|p| p.id == id)) {
            self.program_cursor.selected = pos;
        }
        self.program_cursor.clamp(self.programs.len());

        if !snapshot.report.is_complete() {
            let failed: Vec<&str> = snapshot.report.failed.iter().map(|f| f.pass.label()).collect();
            self.refresh_error = Some(format!("incomplete: {} failed", failed.join(", ")));
        }
        self.dirty = true;
    }

    pub fn selected_program(&self) -> Option<&ProgramEntity> {
        self.programs.get(self.program_cursor.selected)
    }

    /// Reload disassembly and map list when the selected program changed.
    /// A new map id list for the same program reloads only the map list.
    pub fn sync_details(&mut self) {
        let current = self.selected_program().map(|p| (p.id, p.map_ids.clone()));
        if current == self.details_for {
            return;
        }
        let same_program =
            current.as_ref().map(|(id, _)| id) == self.details_for.as_ref().map(|(id, _)| id);
        self.details_for = current.clone();

        let Some((id, map_ids)) = current else {
            self.close_map();
            self.disassembly.clear();
            self.maps.clear();
            self.disasm_error = None;
            self.map_error = None;
            self.dirty = true;
            return;
        };

        if !same_program {
            self.disasm_scroll = 0;
            self.map_cursor = Cursor {
                visible: self.map_cursor.visible,
                ..Cursor::default()
            };
            self.close_map();
            match self.monitor.disassembly(id) {
                Ok(lines) => {
                    self.disassembly = lines;
                    self.disasm_error = None;
                }
                Err(e) => {
                    log::warn!("disassembly of program {id}: {e}");
                    self.disassembly.clear();
                    self.disasm_error = Some(e.to_string());
                }
            }
        } else if self
            .open_map
            .as_ref()
            .is_some_and(|m| !map_ids.contains(&m.id))
        {
            self.close_map();
        }

        match self.monitor.get_maps(&map_ids) {
            Ok(maps) => {
                self.maps = maps;
                self.map_error = None;
            }
            Err(e) => {
                log::warn!("maps of program {id}: {e}");
                self.maps.clear();
                self.map_error = Some(e.to_string());
            }
        }
        self.map_cursor.clamp(self.maps.len());
        self.dirty = true;
    }

    pub fn request_refresh(&mut self) {
        match &self.scheduler {
            Some(scheduler) => scheduler.request_refresh(),
            None => match self.monitor.refresh_now() {
                Ok(snapshot) => self.apply_snapshot(&snapshot),
                Err(e) => self.refresh_error = Some(e.to_string()),
            },
        }
        self.flash("Refreshing".to_string());
    }

    // --- Map entries ---

    pub fn open_selected_map(&mut self) {
        let Some(map) = self.maps.get(self.map_cursor.selected).cloned() else {
            return;
        };
        self.open_map = Some(map);
        self.entry_cursor = Cursor {
            visible: self.entry_cursor.visible,
            ..Cursor::default()
        };
        self.reload_entries();
        self.focus = Pane::Entries;
    }

    fn close_map(&mut self) {
        self.open_map = None;
        self.entries.clear();
        self.entry_rows.clear();
        self.entry_error = None;
    }

    /// Dump the open map again and re-render it.
    pub fn reload_entries(&mut self) {
        let Some(map_id) = self.open_map.as_ref().map(|m| m.id) else {
            return;
        };
        match self.monitor.get_map_entries(map_id) {
            Ok(entries) => {
                self.entries = entries;
                self.entry_error = None;
            }
            Err(e) => {
                log::warn!("dump of map {map_id}: {e}");
                self.entries.clear();
                self.entry_error = Some(e.to_string());
            }
        }
        self.render_entries();
        self.entry_cursor.clamp(self.entries.len());
    }

    fn render_entries(&mut self) {
        self.entry_rows = self
            .entries
            .iter()
            .map(|e| self.monitor.format_entry(e))
            .collect();
    }

    pub fn selected_entry(&self) -> Option<&MapEntry> {
        self.entries.get(self.entry_cursor.selected)
    }

    pub fn update_render_config(&mut self, change: impl FnOnce(RenderConfig) -> RenderConfig) {
        let config = change(self.monitor.render_config());
        self.monitor.set_render_config(config);
        self.config.render = config;
        self.render_entries();
    }

    pub fn save_render_config(&mut self) {
        match self.config.save() {
            Ok(()) => self.flash(format!("Saved {}", self.config.render.describe())),
            Err(e) => {
                log::error!("saving config: {e:#}");
                self.flash(format!("Save failed: {e}"));
            }
        }
    }

    pub fn begin_edit(&mut self) {
        let Some(entry) = self.selected_entry() else {
            return;
        };
        if self.open_map.as_ref().is_some_and(|m| m.frozen) {
            self.flash("Map is frozen".to_string());
            return;
        }
        // Prefill in a form parse_bytes accepts whatever the display format.
        self.prompt = bpfinspect_common::format_bytes(
            &entry.value,
            &RenderConfig {
                format: DataFormat::Hex,
                ..RenderConfig::default()
            },
        );
        self.mode = AppMode::Edit;
    }

    pub fn commit_edit(&mut self) {
        self.mode = AppMode::Normal;
        let value = match parse_bytes(&self.prompt) {
            Ok(value) => value,
            Err(e) => {
                self.flash(e.to_string());
                return;
            }
        };
        let (Some(map), Some(entry)) = (self.open_map.clone(), self.selected_entry().cloned())
        else {
            return;
        };
        match self.monitor.update_map_entry(&map, &entry.key, &value) {
            Ok(()) => self.flash("Entry updated".to_string()),
            Err(e) => {
                log::warn!("update of map {}: {e}", map.id);
                self.flash(format!("Update failed: {e}"));
            }
        }
        self.prompt.clear();
        self.reload_entries();
    }

    pub fn confirm_delete(&mut self) {
        self.mode = AppMode::Normal;
        let (Some(map), Some(entry)) = (self.open_map.clone(), self.selected_entry().cloned())
        else {
            return;
        };
        match self.monitor.delete_map_entry(&map, &entry.key) {
            Ok(()) => self.flash("Entry deleted".to_string()),
            Err(e) => {
                log::warn!("delete from map {}: {e}", map.id);
                self.flash(format!("Delete failed: {e}"));
            }
        }
        self.reload_entries();
    }

    // --- Navigation ---

    /// Move the cursor of the focused pane.
    pub fn move_selection(&mut self, delta: i32) {
        match self.focus {
            Pane::Programs => self.program_cursor.move_by(delta, self.programs.len()),
            Pane::Disassembly => {
                let max = self.disassembly.len().saturating_sub(1) as i64;
                self.disasm_scroll = (self.disasm_scroll as i64 + i64::from(delta)).clamp(0, max) as usize;
            }
            Pane::Maps => self.map_cursor.move_by(delta, self.maps.len()),
            Pane::Entries => self.entry_cursor.move_by(delta, self.entries.len()),
        }
    }

    pub fn select_first(&mut self) {
        match self.focus {
            Pane::Programs => self.program_cursor.first(),
            Pane::Disassembly => self.disasm_scroll = 0,
            Pane::Maps => self.map_cursor.first(),
            Pane::Entries => self.entry_cursor.first(),
        }
    }

    pub fn select_last(&mut self) {
        match self.focus {
            Pane::Programs => self.program_cursor.last(self.programs.len()),
            Pane::Disassembly => self.disasm_scroll = self.disassembly.len().saturating_sub(1),
            Pane::Maps => self.map_cursor.last(self.maps.len()),
            Pane::Entries => self.entry_cursor.last(self.entries.len()),
        }
    }

    pub fn page_size(&self) -> i32 {
        let rows = match self.focus {
            Pane::Programs => self.program_cursor.visible,
            Pane::Maps => self.map_cursor.visible,
            Pane::Entries => self.entry_cursor.visible,
            Pane::Disassembly => self.program_cursor.visible / 2,
        };
        rows.max(1) as i32
    }

    // --- Feature probe page ---

    /// Show the feature page with the search prompt active. The probe runs on
    /// first open only; `reload_features` runs it again.
    pub fn open_features(&mut self) {
        if self.features.is_none() {
            self.reload_features();
        }
        self.mode = AppMode::FeatureFilter;
    }

    /// A failed probe shows bpftool's stderr in place of the report.
    pub fn reload_features(&mut self) {
        self.features = Some(self.monitor.features().map_err(|e| match e {
            ProbeError::Exit { stderr, .. } if !stderr.trim().is_empty() => stderr,
            e => e.to_string(),
        }));
        self.feature_scroll = 0;
    }

    pub fn feature_lines(&self) -> Vec<FeatureLine<'_>> {
        match &self.features {
            Some(Ok(text)) => filter_features(text, &self.feature_query),
            _ => Vec::new(),
        }
    }

    pub fn scroll_features(&mut self, delta: i32) {
        let max = self.feature_lines().len().saturating_sub(1) as i64;
        self.feature_scroll =
            (self.feature_scroll as i64 + i64::from(delta)).clamp(0, max) as usize;
    }

    pub fn set_feature_query(&mut self, query: String) {
        self.feature_query = query;
        self.feature_scroll = 0;
    }

    // --- Flash message ---

    pub fn flash(&mut self, msg: String) {
        self.flash_message = Some((msg, Instant::now()));
    }

    pub fn active_flash(&self) -> Option<&str> {
        if let Some((ref msg, when)) = self.flash_message {
            if when.elapsed() < Duration::from_secs(2) {
                return Some(msg.as_str());
            }
        }
        None
    }

    // --- Yank to clipboard ---

    /// Text of the selected entry when the entry table has focus, otherwise
    /// the selected program row.
    pub fn yank_text(&self) -> Option<String> {
        if self.focus == Pane::Entries {
            let (key, value) = self.entry_rows.get(self.entry_cursor.selected)?;
            return Some(format!("{key}: {value}"));
        }
        let p = self.selected_program()?;
        Some(format!("{} {} {} {}", p.id, p.kind, p.tag, p.name))
    }

    pub fn yank(&mut self) {
        let Some(text) = self.yank_text() else {
            return;
        };
        let msg = match crate::clipboard::yank(&text) {
            Ok(()) => format!("Yanked {text}"),
            Err(e) => {
                log::warn!("clipboard write failed: {e}");
                "Clipboard write failed".to_string()
            }
        };
        self.flash(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpfinspect::data::enrich::EnrichReport;
    use bpfinspect::error::ProbeError;
    use bpfinspect::probe::{ToolOutput, ToolRunner};
    use bpfinspect_common::{DataWidth, Endianness};

    /// Every invocation fails as if bpftool were missing.
    struct NoTool;

    impl ToolRunner for NoTool {
        fn run(&self, args: &[String]) -> Result<ToolOutput, ProbeError> {
            Err(ProbeError::Launch {
                command: self.command_line(args),
                source: io::Error::new(io::ErrorKind::NotFound, "missing"),
            })
        }
    }

    fn app() -> App {
        App::new(Config::default(), Monitor::new(Arc::new(NoTool)), None)
    }

    fn snapshot(generation: u64, ids: &[u32]) -> Arc<Snapshot> {
        Arc::new(Snapshot {
            generation,
            refreshed_at: None,
            programs: ids
                .iter()
                .map(|&id| {
                    (
                        id,
                        ProgramEntity {
                            id,
                            kind: "kprobe".to_string(),
                            ..ProgramEntity::default()
                        },
                    )
                })
                .collect(),
            report: EnrichReport::default(),
        })
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut c = Cursor {
            visible: 3,
            ..Cursor::default()
        };
        c.move_by(10, 5);
        assert_eq!((c.selected, c.offset), (4, 2));
        c.move_by(-10, 5);
        assert_eq!((c.selected, c.offset), (0, 0));
        c.last(5);
        c.clamp(2);
        assert_eq!(c.selected, 1);
        assert!(c.offset <= c.selected);
        c.move_by(1, 0);
        assert_eq!(c.selected, 1);
    }

    #[test]
    fn pane_cycle() {
        assert_eq!(Pane::Programs.next(), Pane::Disassembly);
        assert_eq!(Pane::Entries.next(), Pane::Programs);
        assert_eq!(Pane::Programs.prev(), Pane::Entries);
    }

    #[test]
    fn selection_follows_program_id_across_snapshots() {
        let mut app = app();
        app.apply_snapshot(&snapshot(1, &[1, 5, 9]));
        app.program_cursor.selected = 1;

        app.apply_snapshot(&snapshot(2, &[0, 1, 5, 9]));
        assert_eq!(app.selected_program().map(|p| p.id), Some(5));
        assert_eq!(app.generation, 2);

        // Selected program gone: cursor stays in range
        app.program_cursor.selected = 3;
        app.apply_snapshot(&snapshot(3, &[0, 1]));
        assert_eq!(app.selected_program().map(|p| p.id), Some(1));
    }

    #[test]
    fn detail_failures_are_shown_not_fatal() {
        let mut app = app();
        app.apply_snapshot(&snapshot(1, &[7]));
        app.sync_details();
        assert!(app.disasm_error.is_some());
        // No map ids: no probe, empty list
        assert!(app.map_error.is_none());
        assert!(app.maps.is_empty());
    }

    #[test]
    fn changed_map_ids_reload_the_map_list() {
        let mut app = app();
        app.apply_snapshot(&snapshot(1, &[7]));
        app.sync_details();
        assert!(app.map_error.is_none());

        let mut next = snapshot(2, &[7]);
        Arc::get_mut(&mut next)
            .unwrap()
            .programs
            .get_mut(&7)
            .unwrap()
            .map_ids = vec![3];
        app.apply_snapshot(&next);
        app.sync_details();
        assert_eq!(app.details_for, Some((7, vec![3])));
        // NoTool cannot list maps, so the reload shows up as an error
        assert!(app.map_error.is_some());
    }

    #[test]
    fn feature_page_shows_error_and_keeps_search() {
        let mut app = app();
        app.open_features();
        assert_eq!(app.mode, AppMode::FeatureFilter);
        assert!(matches!(&app.features, Some(Err(e)) if e.contains("feature probe")));
        assert!(app.feature_lines().is_empty());

        app.features = Some(Ok("Scanning eBPF map types...\neBPF map_type hash is available\n".to_string()));
        app.set_feature_query("HASH".to_string());
        assert_eq!(app.feature_lines().len(), 2);
        app.scroll_features(10);
        assert_eq!(app.feature_scroll, 1);

        // Reopening keeps the loaded report instead of probing again
        app.mode = AppMode::Normal;
        app.open_features();
        assert!(matches!(&app.features, Some(Ok(_))));
    }

    #[test]
    fn render_changes_reach_config_and_rows() {
        let mut app = app();
        app.entries = vec![MapEntry {
            key: vec![0x41],
            value: vec![0x41],
        }];
        app.update_render_config(|c| RenderConfig {
            width: DataWidth::W16,
            endianness: Endianness::Big,
            ..c
        });
        assert_eq!(app.config.render.width, DataWidth::W16);
        assert_eq!(app.entry_rows[0], ("0x4100".to_string(), "0x4100".to_string()));
    }

    #[test]
    fn edit_prefill_is_hex() {
        let mut app = app();
        app.open_map = Some(MapEntity {
            id: 3,
            ..MapEntity::default()
        });
        app.entries = vec![MapEntry {
            key: vec![1],
            value: vec![0x2a, 0],
        }];
        app.update_render_config(|c| RenderConfig {
            format: DataFormat::Char,
            ..c
        });
        app.begin_edit();
        assert_eq!(app.mode, AppMode::Edit);
        assert_eq!(app.prompt, "0x2a 0x00");
    }

    #[test]
    fn yank_text_depends_on_focus() {
        let mut app = app();
        app.apply_snapshot(&snapshot(1, &[4]));
        assert_eq!(app.yank_text().as_deref(), Some("4 kprobe  "));
        app.focus = Pane::Entries;
        assert!(app.yank_text().is_none());
    }
}
