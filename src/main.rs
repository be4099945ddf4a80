//! Command-line entry point.
//!
//! Loads a macro definitions file, wires the engine to the demo collaborators
//! (a logging injector and a stdin-driven listener) and runs until an exit
//! macro fires. Real deployments swap in platform implementations of
//! [`InputListener`] and [`InputInjector`].

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use macro_key_runner::{
    ClickKind, EventSender, InputEvent, InputInjector, InputListener, MacroFile, Manager,
};

#[derive(Parser, Debug)]
#[command(name = "mkr", version, about = "Desktop hotkey macro engine")]
struct Args {
    /// Path to the macro definitions file (JSON).
    #[arg(short, long)]
    config: PathBuf,

    /// Directory for rotating log files.
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(args: &Args) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(&args.log_dir, "mkr.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();
    guard
}

/// Logs every injection instead of performing it. Stands in for a platform
/// backend so the engine can be exercised anywhere.
struct LoggingInjector;

impl InputInjector for LoggingInjector {
    fn tap_hotkey(&self, keys: &[&str]) -> anyhow::Result<()> {
        info!(hotkey = keys.join("+"), "inject: tap");
        Ok(())
    }

    fn key_down(&self, key: &str) -> anyhow::Result<()> {
        info!(key = key, "inject: key down");
        Ok(())
    }

    fn key_up(&self, key: &str) -> anyhow::Result<()> {
        info!(key = key, "inject: key up");
        Ok(())
    }

    fn mouse_click(&self, kind: ClickKind, position: Option<(i32, i32)>) -> anyhow::Result<()> {
        info!(kind = %kind, position = ?position, "inject: mouse click");
        Ok(())
    }

    fn mouse_move(&self, x: i32, y: i32, duration: Duration) -> anyhow::Result<()> {
        info!(x, y, duration_ms = duration.as_millis() as u64, "inject: mouse move");
        Ok(())
    }

    fn mouse_move_relative(&self, dx: i32, dy: i32, duration: Duration) -> anyhow::Result<()> {
        info!(dx, dy, duration_ms = duration.as_millis() as u64, "inject: mouse move relative");
        Ok(())
    }
}

/// Simulates key input from stdin: each line is a whitespace-separated key
/// list (e.g. `alt 1`), delivered as presses in order followed by releases in
/// reverse. Multi-character tokens are treated as named keys.
struct StdinListener;

impl InputListener for StdinListener {
    fn run(&mut self, events: EventSender) -> anyhow::Result<()> {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            let keys: Vec<&str> = line.split_whitespace().collect();
            for key in &keys {
                events.send(InputEvent::Press {
                    key: (*key).to_string(),
                    named: key.chars().count() > 1,
                })?;
            }
            for key in keys.iter().rev() {
                events.send(InputEvent::Release {
                    key: (*key).to_string(),
                    named: key.chars().count() > 1,
                })?;
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(&args);

    let definitions = MacroFile::from_file(&args.config)?;
    let manager = Manager::new(Arc::new(LoggingInjector));
    definitions.apply(&manager)?;

    println!("{}", "macro-key-runner".bold());
    println!(
        "  {} macros registered from {}",
        manager.command_count().to_string().green(),
        args.config.display()
    );
    println!(
        "  type key names to simulate input, e.g. {} — an {} macro stops the engine",
        "alt 1".cyan(),
        "exit".cyan()
    );

    manager.run(StdinListener).await?;
    info!("goodbye");
    Ok(())
}
