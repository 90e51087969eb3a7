mod app;
mod assets;
mod catalogue;
mod cli;
mod config;
mod constants;
mod display;
mod graphics;
mod input;
mod media;
mod player;
mod query;
mod route;
mod share;
mod theme;
mod ui;
mod viewer;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use app::App;
use catalogue::Catalogue;
use config::Config;
use display::CliDisplayMode;
use route::Route;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(name = "folio", author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Catalogue file to load instead of the bundled one (RON)
  #[arg(long, global = true)]
  catalogue: Option<PathBuf>,

  /// Thumbnail display mode: 'auto', 'direct', or 'ascii' (default: prefs, then auto-detect)
  #[arg(short, long)]
  display_mode: Option<CliDisplayMode>,

  /// Directory that site-local media paths resolve against
  #[arg(long)]
  assets: Option<PathBuf>,

  /// Route to open on start, e.g. `/audio` or `/about`
  #[arg(long, default_value = "/")]
  route: String,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Search every category and print the hits as JSON
  Search { text: String },
  /// Print the page a route resolves to as JSON
  Show {
    route: String,
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    /// date-desc, date-asc, company-asc or company-desc
    #[arg(long)]
    sort: Option<String>,
  },
  /// Print shell completions
  Completions { shell: Shell },
}

// --- Logging ---

/// The terminal belongs to ratatui, so logs go to a rolling file in the cache dir.
fn init_logging() -> Option<WorkerGuard> {
  let dir = Config::log_dir();
  std::fs::create_dir_all(&dir).ok()?;
  let appender = tracing_appender::rolling::daily(&dir, "folio.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_env("FOLIO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(writer).with_ansi(false)).init();
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let _guard = init_logging();

  let catalogue = Catalogue::load(args.catalogue.as_deref()).context("Failed to load catalogue")?;

  match args.command {
    Some(Command::Search { ref text }) => {
      println!("{}", cli::search_json(&catalogue, text)?);
      return Ok(());
    }
    Some(Command::Show { ref route, ref company, year, ref sort }) => {
      let filters = cli::ShowFilters { company: company.clone(), year, sort: sort.clone() };
      println!("{}", cli::show_json(&catalogue, route, filters)?);
      return Ok(());
    }
    Some(Command::Completions { shell }) => {
      clap_complete::generate(shell, &mut Args::command(), "folio", &mut std::io::stdout());
      return Ok(());
    }
    None => {}
  }

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, args, catalogue).await;
  ratatui::restore();
  if let Err(ref e) = result {
    error!(err = %format!("{:#}", e), "folio: exiting with error");
  }
  result
}

async fn run(terminal: &mut DefaultTerminal, args: Args, catalogue: Catalogue) -> Result<()> {
  let config = Config::load();
  let cli_mode = args
    .display_mode
    .unwrap_or_else(|| config.display_mode.as_deref().map_or(CliDisplayMode::Auto, CliDisplayMode::from_config));
  let display_mode = display::resolve_display_mode(cli_mode);
  let asset_root = args.assets.or_else(|| config.asset_root.clone());
  info!(display = display_mode.label(), assets = ?asset_root, "folio: starting");

  let mut app = App::new(catalogue, &config, display_mode, asset_root);
  app.navigate(Route::parse(&args.route)).await?;

  loop {
    app.check_pending().await?;
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key).await?;
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.shutdown().await
}
