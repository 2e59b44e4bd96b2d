use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use futureos::config::{self, Config};
use futureos::desktop::desktop_mode;
use futureos::i18n::Language;
use futureos::setup::run_setup;
use futureos::ui::{init_terminal, restore_terminal, Term};

#[derive(Debug, Parser)]
#[command(name = "futureos", version, about = "A pretend desktop in your terminal")]
struct Cli {
    /// Configuration file (defaults to the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interface language (it, en, es); skips the language picker
    #[arg(long)]
    lang: Option<Language>,

    /// Log filter, e.g. "debug" or "futureos=trace"
    #[arg(long)]
    log_level: Option<String>,

    /// Where log lines go; the terminal is busy drawing
    #[arg(long)]
    log_file: Option<PathBuf>,
}

// ── Logging ───────────────────────────────────────────────────────────────────

fn init_logging(filter: EnvFilter, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))
}

fn log_filter(cli: &Cli, cfg: &Config) -> Result<EnvFilter> {
    if let Some(level) = &cli.log_level {
        return EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"));
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&cfg.log_level)
        .with_context(|| format!("invalid log level {:?} in config", cfg.log_level))
}

// ── Main application flow ─────────────────────────────────────────────────────

fn run(terminal: &mut Term, preset: Option<Language>) -> Result<()> {
    let lang = match preset {
        Some(lang) => lang,
        None => match run_setup(terminal)? {
            Some(lang) => lang,
            None => return Ok(()),
        },
    };
    desktop_mode(terminal, lang)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_file);
    let (cfg, config_error) = match Config::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(err) => (Config::default(), Some(err)),
    };
    let log_path = cli.log_file.clone().unwrap_or_else(|| cfg.log_file());
    init_logging(log_filter(&cli, &cfg)?, &log_path)?;
    if let Some(err) = config_error {
        tracing::warn!(error = %err, "ignoring unreadable config, using defaults");
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "starting"
    );

    config::update_settings(|s| s.theme = cfg.theme);
    let preset = cli.lang.or_else(|| cfg.preset_language());

    let mut terminal = init_terminal()?;

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        run(&mut terminal, preset)
    }));

    // Always restore terminal
    restore_terminal(&mut terminal).ok();

    match result {
        Ok(Ok(())) => {
            tracing::info!("clean exit");
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "exited with error");
            Err(e)
        }
        Err(_) => {
            tracing::error!("panic in ui loop");
            eprintln!("FutureOS crashed. Check {}", log_path.display());
            Ok(())
        }
    }
}
