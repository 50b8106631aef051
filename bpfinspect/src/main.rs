mod app;
mod clipboard;
mod config;
mod input;
mod theme;
mod ui;

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bpfinspect::probe::schema::Version;
use bpfinspect::probe::{invoke, Bpftool};
use bpfinspect::Monitor;
use bpfinspect_common::{DataFormat, DataWidth, Endianness, RenderConfig};
use clap::Parser;

#[derive(Parser)]
#[command(name = "bpfinspect", about = "Interactive inspector for loaded BPF programs and maps")]
struct Cli {
    /// Path to the bpftool binary
    #[arg(long, value_name = "PATH")]
    bpftool: Option<PathBuf>,

    /// Refresh rate in milliseconds
    #[arg(short = 'd', long, value_name = "MS")]
    delay: Option<u64>,

    /// Never run bpftool through sudo
    #[arg(long)]
    no_sudo: bool,

    /// Log at debug level
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Refresh once, print the program snapshot as JSON and exit
    #[arg(long, conflicts_with = "dump_map")]
    json: bool,

    /// Print the entries of one map and exit
    #[arg(long, value_name = "ID")]
    dump_map: Option<u32>,

    /// Entry format for --dump-map: hex, decimal, char or raw
    #[arg(long, requires = "dump_map", value_parser = parse_format)]
    format: Option<DataFormat>,

    /// Integer width in bytes for --dump-map: 1, 2, 4 or 8
    #[arg(long, requires = "dump_map", value_parser = parse_width)]
    width: Option<DataWidth>,

    /// Byte order for --dump-map: little or big
    #[arg(long, requires = "dump_map", value_parser = parse_endian)]
    endian: Option<Endianness>,
}

impl Cli {
    fn headless(&self) -> bool {
        self.json || self.dump_map.is_some()
    }

    /// Render flags only shape `--dump-map` output; the TUI starts from the
    /// config file so `W` never persists one-off flags.
    fn render_config(&self, base: RenderConfig) -> RenderConfig {
        if self.dump_map.is_none() {
            return base;
        }
        RenderConfig {
            format: self.format.unwrap_or(base.format),
            width: self.width.unwrap_or(base.width),
            endianness: self.endian.unwrap_or(base.endianness),
        }
    }
}

fn parse_format(s: &str) -> Result<DataFormat, String> {
    DataFormat::ALL
        .into_iter()
        .find(|f| f.label().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown format '{s}'"))
}

fn parse_width(s: &str) -> Result<DataWidth, String> {
    let bytes: u8 = s.parse().map_err(|_| format!("invalid width '{s}'"))?;
    DataWidth::try_from(bytes)
}

fn parse_endian(s: &str) -> Result<Endianness, String> {
    match s.to_ascii_lowercase().as_str() {
        "little" | "le" => Ok(Endianness::Little),
        "big" | "be" => Ok(Endianness::Big),
        _ => Err(format!("unknown byte order '{s}'")),
    }
}

/// The TUI owns the terminal, so its log goes to a file under the cache dir.
fn init_logging(cli: &Cli) {
    let level = if cli.verbose { "debug" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));

    if !cli.headless() {
        let target: Box<dyn std::io::Write + Send> = match log_file() {
            Ok(file) => Box::new(file),
            Err(_) => Box::new(std::io::sink()),
        };
        builder.target(env_logger::Target::Pipe(target));
    }
    builder.init();
}

fn log_file() -> std::io::Result<File> {
    let dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("bpfinspect");
    fs::create_dir_all(&dir)?;
    File::create(dir.join("bpfinspect.log"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut config = config::Config::load().unwrap_or_else(|e| {
        log::warn!("ignoring config file: {e:#}");
        config::Config::default()
    });
    if let Some(delay) = cli.delay {
        config.general.refresh_rate_ms = delay;
    }
    config.render = cli.render_config(config.render);

    let path = config::resolve_bpftool(
        cli.bpftool.as_deref(),
        config.general.bpftool_path.as_deref(),
        std::env::var_os("BPFTOOL_PATH").as_deref(),
        std::env::var_os("PATH").as_deref(),
    )?;
    let tool = Bpftool::new(&path, config.general.use_sudo && !cli.no_sudo);
    log::info!("using {} (sudo: {})", path.display(), tool.uses_sudo());

    if !tool.prime_sudo().context("running sudo")? {
        bail!("sudo authentication failed; run as root or pass --no-sudo");
    }

    let version = invoke(&tool, &Version)
        .with_context(|| format!("{} does not answer `version`", path.display()))?
        .records;
    log::info!("bpftool {} (libbpf {})", version.version, version.libbpf_version);
    let startup_warning = (!version.features.skeletons).then(|| {
        log::warn!("bpftool built without skeletons; owning processes unavailable");
        "bpftool lacks skeletons: no process info".to_string()
    });

    let monitor = Monitor::new(Arc::new(tool));
    monitor.set_render_config(config.render);

    if cli.json {
        let snapshot = monitor.refresh_now()?;
        for failure in &snapshot.report.failed {
            eprintln!("warning: {} failed: {}", failure.pass.label(), failure.error);
        }
        let programs = monitor.snapshot();
        println!("{}", serde_json::to_string_pretty(&programs)?);
        return Ok(());
    }

    if let Some(id) = cli.dump_map {
        let entries = monitor.get_map_entries(id)?;
        for entry in &entries {
            let (key, value) = monitor.format_entry(entry);
            println!("{key}: {value}");
        }
        eprintln!("{} entries ({})", entries.len(), monitor.render_config().describe());
        return Ok(());
    }

    let mut app = app::App::new(config, monitor, startup_warning);
    app.run()
}
