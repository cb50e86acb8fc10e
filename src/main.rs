use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use covid_tui::api::DiseaseClient;
use covid_tui::app::App;
use covid_tui::config::{generate_default_config, Config, LoggingConfig};
use covid_tui::fetch::Fetcher;
use covid_tui::map::MapRenderer;
use covid_tui::metric::Metric;
use covid_tui::state::{DashboardState, Message, Selection};
use covid_tui::{data, ui};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::execute;
use ratatui::layout::Rect;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "covid-tui")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal COVID-19 dashboard backed by the disease.sh API")]
struct Cli {
    /// Config file (default: <config dir>/covid-tui/config.toml, then ./covid-tui.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API root URL
    #[arg(long)]
    api_url: Option<String>,

    /// Refresh interval in seconds, 0 disables
    #[arg(long)]
    refresh_secs: Option<u64>,

    /// Region to show on start (ISO2 code or country name)
    #[arg(long)]
    country: Option<Selection>,

    /// Initial metric: cases, recovered or deaths
    #[arg(short, long, default_value = "cases")]
    metric: Metric,

    /// Directory with Natural Earth GeoJSON files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Print a commented default config file and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(secs) = cli.refresh_secs {
        config.refresh.interval_secs = secs;
    }
    if let Some(dir) = cli.data_dir {
        config.map.data_dir = dir;
    }

    init_logging(&config.logging)?;
    tracing::info!(
        "covid-tui v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.api.base_url
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let client = Arc::new(DiseaseClient::new(&config.api)?);
    let (tx, rx) = mpsc::unbounded_channel();
    let mut fetcher = Fetcher::new(client, runtime.handle().clone(), tx);

    let mut map_renderer = MapRenderer::new();
    map_renderer.settings.show_labels = config.map.show_labels;
    let files = data::load_basemap(&mut map_renderer, &config.map.data_dir);
    tracing::info!(files, "basemap ready");

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let state = DashboardState::new(cli.metric, config.api.history_days);
    let app = App::new(state, map_renderer, Rect::from((ratatui::layout::Position::ORIGIN, terminal.size()?)));
    let result = run(
        &mut terminal,
        app,
        &mut fetcher,
        rx,
        cli.country,
        Duration::from_secs(config.refresh.interval_secs),
    );

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    fetcher.shutdown();
    runtime.shutdown_timeout(Duration::from_secs(1));
    if let Err(e) = &result {
        tracing::error!(error = %e, "exiting with error");
    }
    result
}

/// Logs go to a file; the terminal belongs to the dashboard
fn init_logging(config: &LoggingConfig) -> Result<()> {
    if let Some(parent) = config.file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)
        .with_context(|| format!("opening log file {}", config.file.display()))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("covid_tui={}", config.level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

fn run(
    terminal: &mut DefaultTerminal,
    mut app: App,
    fetcher: &mut Fetcher<DiseaseClient>,
    mut rx: UnboundedReceiver<Message>,
    country: Option<Selection>,
    refresh_every: Duration,
) -> Result<()> {
    fetcher.dispatch_all(app.handle_message(Message::Mounted));
    if let Some(selection) = country.filter(|s| *s != Selection::Worldwide) {
        fetcher.dispatch_all(app.handle_message(Message::SelectRegion(selection)));
    }
    let mut last_refresh = Instant::now();

    loop {
        // Apply whatever the fetch tasks finished since the last frame
        while let Ok(msg) = rx.try_recv() {
            fetcher.dispatch_all(app.handle_message(msg));
        }

        terminal.draw(|frame| ui::render(frame, &app))?;

        // ~60fps
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => fetcher.dispatch_all(app.handle_key(key)),
                Event::Mouse(mouse) => {
                    let screen: Rect = Rect::from((ratatui::layout::Position::ORIGIN, terminal.size()?));
                    fetcher.dispatch_all(app.handle_mouse(mouse, screen));
                }
                Event::Resize(width, height) => {
                    app.resize(Rect::new(0, 0, width, height));
                }
                _ => {}
            }
        }

        if !refresh_every.is_zero() && last_refresh.elapsed() >= refresh_every {
            tracing::info!("periodic refresh");
            fetcher.dispatch_all(app.handle_message(Message::Refresh));
            last_refresh = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
