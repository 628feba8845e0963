//! rootstat: a once-per-second status line for minimal window managers.
//!
//! Samples CPU, memory, temperature, wireless and battery state and writes
//! the rendered line to stdout, as Waybar JSON, or to the X root window name.

mod app;
mod output;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use output::Sink;
use rootstat_core::{GlobalConfig, OutputTarget, Shutdown};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Time between two samples.
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "rootstat")]
#[command(about = "Status line sampler for minimal window managers")]
#[command(version)]
#[command(author)]
struct Args {
    /// Configuration file (default: ~/.config/rootstat/config.ron)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// One-shot mode (sample twice, output once and exit)
    #[arg(long)]
    once: bool,

    /// Output target (stdout, waybar, xroot)
    #[arg(short, long)]
    output: Option<OutputTarget>,

    /// Check sensor availability and exit
    #[arg(long)]
    check: bool,

    /// Write a documented example configuration and exit
    #[arg(long)]
    generate_config: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

fn load_config(args: &Args) -> Result<GlobalConfig> {
    let mut config = match &args.config {
        Some(path) => GlobalConfig::load_from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => GlobalConfig::load().context("Failed to load configuration")?,
    };

    if let Some(output) = args.output {
        config.output = output;
    }
    Ok(config)
}

fn generate_config(args: &Args) -> Result<()> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => GlobalConfig::default_config_path()
            .context("Could not determine the configuration directory")?,
    };
    GlobalConfig::save_example_config_to_file(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Example configuration written to {}", path.display());
    Ok(())
}

/// Trigger `shutdown` on SIGINT or SIGTERM.
fn watch_signals(shutdown: Shutdown) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to set up SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to set up SIGINT handler")?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
        shutdown.trigger();
    });
    Ok(())
}

async fn run(mut app: App, sink: Sink, shutdown: &Shutdown) {
    let mut listener = shutdown.listener();
    let mut interval = time::interval(SAMPLE_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = listener.triggered() => break,
            _ = interval.tick() => {}
        }

        app.update();
        if let Err(e) = sink.emit(&app).await {
            warn!(output = %sink.target(), "output failed: {e:#}");
        }
    }

    debug!("sampling loop finished, stopping battery monitor");
    app.shutdown().await;
}

async fn once(mut app: App, sink: Sink) -> Result<()> {
    app.update();
    time::sleep(SAMPLE_INTERVAL).await;
    app.update();
    let result = sink.emit(&app).await;
    app.shutdown().await;
    result
}

fn check(app: &App) -> bool {
    let mut all_ok = true;
    for (name, result) in app.check() {
        match result {
            Ok(()) => println!("{name}: available"),
            Err(e) => {
                all_ok = false;
                println!("{name}: not available ({e})");
            }
        }
    }
    all_ok
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.generate_config {
        return generate_config(&args);
    }

    let config = load_config(&args)?;
    let app = App::new(&config).context("Failed to initialize sensors")?;

    if args.check {
        let all_ok = check(&app);
        app.shutdown().await;
        if !all_ok {
            process::exit(1);
        }
        return Ok(());
    }

    let sink = Sink::new(config.output);
    if args.once {
        return once(app, sink).await;
    }

    let shutdown = Shutdown::new();
    watch_signals(shutdown.clone())?;
    info!(output = %config.output, "sampling every {SAMPLE_INTERVAL:?}");
    run(app, sink, &shutdown).await;

    if let Err(e) = std::io::Write::flush(&mut std::io::stdout()) {
        error!("failed to flush stdout: {e}");
    }
    Ok(())
}
