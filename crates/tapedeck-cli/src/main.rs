//! tapedeck: inspect, play and export WAV recordings

mod args;
mod commands;
mod config;

use std::process::ExitCode;

use args::{Cli, Command};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    // Logs go to stderr so command output on stdout stays pipeable
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["tapedeck=info", "cpal=warn"] {
        if let Ok(d) = directive.parse() {
            filter = filter.add_directive(d);
        }
    }
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    let config = config::load_config();

    match command {
        Command::Info { path } => commands::info(&path),
        Command::Waveform { path, columns } => commands::waveform(&path, columns, &config),
        Command::Export { path, gain, speed, trim_start, trim_end, out } => commands::export(
            commands::ExportRequest { path, gain, speed, trim_start, trim_end, out },
            &config,
        ),
        Command::Play { path, from } => commands::play(&path, from, &config),
        Command::Devices => commands::devices(),
        Command::Config { init } => commands::show_config(init),
    }
}
