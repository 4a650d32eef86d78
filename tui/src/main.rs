//! Gremlin TUI Entry Point
//!
//! Launches the terminal card for Cozy Gremlin.
//!
//! Usage:
//!   gremlin-tui [OPTIONS]
//!
//! Options:
//!   --script <PATH>   Play a scene document instead of the built-in story
//!   --config <PATH>   Config file (default: ~/.config/cozy-gremlin/config.toml)
//!   --seed <N>        Seed typing rhythm and confetti
//!   --fps <N>         Frame rate
//!   --instant         Reveal prompts at once

use std::io;
use std::panic;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gremlin_core::{default_config_path, load_config_from_path, ConfigOverrides, GremlinConfig};
use gremlin_tui::App;

#[derive(Parser, Debug)]
#[command(name = "gremlin-tui", version, about = "A small apology in a card")]
struct Args {
    /// Scene document to play instead of the built-in story
    #[arg(long)]
    script: Option<PathBuf>,

    /// Config file to read
    #[arg(long, env = "GREMLIN_CONFIG")]
    config: Option<PathBuf>,

    /// Seed for typing rhythm and confetti
    #[arg(long)]
    seed: Option<u64>,

    /// Frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Reveal prompts at once
    #[arg(long)]
    instant: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new().with_instant_text(self.instant);
        if let Some(path) = &self.script {
            overrides = overrides.with_script_path(path.clone());
        }
        if let Some(seed) = self.seed {
            overrides = overrides.with_seed(seed);
        }
        if let Some(fps) = self.fps {
            overrides = overrides.with_fps(fps);
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they never land on the card
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = load(&args)?;
    tracing::info!(
        source = %config.source(),
        script = ?config.script_path,
        fps = config.fps,
        "Configuration loaded"
    );

    // Check if we have a TTY before attempting initialization
    use std::io::IsTerminal;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("❌ Error: gremlin-tui requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means:");
        eprintln!("  • Running in a non-interactive environment (CI, container)");
        eprintln!("  • SSH without -t flag");
        eprintln!("  • Piped stdin/stdout");
        eprintln!();
        eprintln!("Solutions:");
        eprintln!("  • Run it from an interactive shell");
        eprintln!("  • Or with script: script -c 'gremlin-tui' /dev/null");
        std::process::exit(1);
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the app
    let result = run_app(&mut terminal, &config).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    // Show goodbye message after TUI closes
    match result {
        Ok(Some(goodbye)) => {
            // Gremlin styling (magenta)
            println!("\n\x1b[35mGremlin:\x1b[0m {}\n", goodbye);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Config file, then environment, then command line
fn load(args: &Args) -> anyhow::Result<GremlinConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;
    args.overrides().apply(&mut config);
    config.validate().context("Invalid command line options")?;
    Ok(config)
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &GremlinConfig,
) -> anyhow::Result<Option<String>> {
    let mut app = App::new(config)?;
    app.run(terminal).await?;
    Ok(app.goodbye().map(str::to_string))
}
