//! Spectrum HID - replay a key matrix script through the resolution engine

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use spectrum_hid::{
    config::{config_path, SinkKind},
    hid::{HidSink, LogSink},
    matrix::{ReplayScript, ScriptedMatrix, StdDelay},
    report::SessionReport,
    Config, Engine,
};

#[derive(Parser, Debug)]
#[command(name = "spectrum-hid")]
#[command(version)]
#[command(about = "Replay a 40-key membrane matrix script as USB HID key events", long_about = None)]
struct Args {
    /// Config file to use instead of the platform default
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective config back out and exit
    #[arg(long)]
    write_config: bool,

    /// Replay script, one scan frame per line (defaults to engine.replay_script)
    script: Option<PathBuf>,
}

fn open_sink(kind: SinkKind) -> Result<Box<dyn HidSink>> {
    match kind {
        SinkKind::Log => Ok(Box::new(LogSink)),
        #[cfg(target_os = "linux")]
        SinkKind::Uinput => {
            let sink = spectrum_hid::hid::uinput::UinputSink::new()
                .context("Failed to create uinput device (is /dev/uinput writable?)")?;
            Ok(Box::new(sink))
        }
        #[cfg(not(target_os = "linux"))]
        SinkKind::Uinput => anyhow::bail!("the uinput sink is only available on Linux"),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    config.validate().context("Invalid configuration")?;

    if args.write_config {
        match &args.config {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
        let written = match &args.config {
            Some(path) => path.clone(),
            None => config_path()?,
        };
        info!("Wrote config to {}", written.display());
        return Ok(());
    }

    let script_path = args
        .script
        .or_else(|| config.engine.replay_script.clone())
        .context("No replay script given (pass a path or set engine.replay_script)")?;
    let script = ReplayScript::load(&script_path, config.matrix.key_count())
        .with_context(|| format!("Failed to load replay script {}", script_path.display()))?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("Failed to install Ctrl-C handler")?;
    }

    let sink = open_sink(config.output.sink)?;
    let pins = ScriptedMatrix::new(config.matrix.rows, config.matrix.cols);
    let mut engine =
        Engine::from_config(&config, pins, StdDelay, sink).context("Failed to build engine")?;

    info!(
        "Spectrum HID {} ({} mode, {}x{} matrix, debounce window {})",
        env!("CARGO_PKG_VERSION"),
        config.engine.mode.name(),
        config.matrix.rows,
        config.matrix.cols,
        config.debounce.window
    );

    engine.run_script(&script, &running, config.cycle_delay());

    let stats = engine.stats();
    info!(
        "Session complete: {} cycles, {} presses, {} releases, {} descriptions",
        stats.cycles, stats.hid.presses, stats.hid.releases, stats.descriptions
    );

    if let Some(path) = &config.report.export_path {
        let report = SessionReport::new(
            engine.start_time(),
            stats,
            engine.state(),
            engine.layout(),
            config.engine.mode,
        );
        report
            .export_json(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
