//! clinic-tui binary entry point.
//!
//! Parses the command line, sets up file logging and the async runtime,
//! puts the terminal in raw mode, runs the TUI event loop and restores the
//! terminal state on exit.
//!
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use clinic_tui::api::ApiClient;
use clinic_tui::app::{self, AppState, Theme, keymap::Keymap};
use clinic_tui::auth::AuthService;
use clinic_tui::config::{self, Config};
use clinic_tui::session::SessionStore;

/// Terminal client for the clinic-management backend.
#[derive(Debug, Parser)]
#[command(name = "clinic-tui", version, about)]
struct Cli {
    /// Backend base URL, e.g. http://localhost:8080/api
    #[arg(long, env = "CLINIC_API_URL")]
    api_url: Option<String>,

    /// Configuration file (key = value)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where the login session is persisted
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[arg(long, env = "CLINIC_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Theme file (key = #RRGGBB)
    #[arg(long)]
    theme: Option<PathBuf>,
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging(path: &Path) -> Result<WorkerGuard> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).with_context(|| format!("create log directory {}", dir.display()))?;
    let file_name = path.file_name().context("log file path has no file name")?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clinic_tui=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = config::data_dir();
    let config_dir = dirs::config_dir()
        .map(|d| d.join(config::CONFIG_DIR_NAME))
        .unwrap_or_else(|| data_dir.clone());
    let log_path = cli.log_file.unwrap_or_else(|| data_dir.join("clinic-tui.log"));
    let _guard = init_logging(&log_path)?;

    // best effort: without it the defaults are simply not written back
    let _ = std::fs::create_dir_all(&config_dir);
    let config_path = cli.config.unwrap_or_else(|| config_dir.join("clinic.conf"));
    let mut config = Config::load_or_init(&config_path);
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    let theme = Theme::load_or_init(&cli.theme.unwrap_or_else(|| config_dir.join("theme.conf")));
    let keymap = Keymap::load_or_init(&config_dir.join("keybinds.conf"));
    let session_path = cli.session_file.unwrap_or_else(|| data_dir.join("session.json"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    let api = ApiClient::new(&config.api_base_url, config.request_timeout()).context("build HTTP client")?;
    info!(api = %config.api_base_url, session = %session_path.display(), "starting");
    let auth = AuthService::new(api, SessionStore::new(session_path));
    let app = AppState::new(config, theme, keymap, auth, runtime.handle().clone());

    let mut terminal = init_terminal().context("init terminal")?;

    let res = app::run(&mut terminal, app);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture).ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        error!(%err, "application error");
        eprintln!("application error: {err:#}");
    }
    Ok(())
}
