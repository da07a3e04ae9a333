//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Inspect, play and export WAV recordings
#[derive(Parser, Debug)]
#[command(name = "tapedeck", version)]
#[command(about = "Inspect, play and export WAV recordings", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub(crate) enum Command {
    /// Print a JSON summary of a decoded file
    Info {
        path: PathBuf,
    },
    /// Draw the min/max envelope as text
    Waveform {
        path: PathBuf,
        /// Envelope columns; falls back to the config value
        #[arg(long)]
        columns: Option<usize>,
    },
    /// Trim, change speed, apply gain and write a 16-bit WAV
    Export {
        path: PathBuf,
        #[arg(long, default_value_t = 1.0)]
        gain: f32,
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        /// Trim start in seconds
        #[arg(long)]
        trim_start: Option<f64>,
        /// Trim end in seconds; defaults to the file duration
        #[arg(long)]
        trim_end: Option<f64>,
        /// Output directory; falls back to the config value, then "."
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Play through the default output device
    Play {
        path: PathBuf,
        /// Start position in seconds
        #[arg(long, default_value_t = 0.0)]
        from: f64,
    },
    /// Describe the default output device
    Devices,
    /// Print the effective config
    Config {
        /// Write the defaults if no config file exists yet
        #[arg(long)]
        init: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("tapedeck").chain(args.iter().copied())).map(|cli| cli.command)
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_args_is_error() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_export_flags() {
        let cmd = parse(&[
            "export", "in.wav", "--gain", "2", "--speed", "0.5", "--trim-start", "0.25", "--trim-end", "0.75",
            "--out", "exports",
        ])
        .unwrap();
        assert_eq!(
            cmd,
            Command::Export {
                path: PathBuf::from("in.wav"),
                gain: 2.0,
                speed: 0.5,
                trim_start: Some(0.25),
                trim_end: Some(0.75),
                out: Some(PathBuf::from("exports")),
            }
        );
    }

    #[test]
    fn test_export_defaults() {
        let cmd = parse(&["export", "in.wav"]).unwrap();
        assert!(matches!(
            cmd,
            Command::Export { gain, speed, trim_start: None, trim_end: None, out: None, .. }
                if gain == 1.0 && speed == 1.0
        ));
    }

    #[test]
    fn test_waveform_and_play() {
        assert_eq!(
            parse(&["waveform", "a.wav", "--columns", "40"]).unwrap(),
            Command::Waveform { path: PathBuf::from("a.wav"), columns: Some(40) }
        );
        assert_eq!(
            parse(&["play", "a.wav", "--from", "1.5"]).unwrap(),
            Command::Play { path: PathBuf::from("a.wav"), from: 1.5 }
        );
        assert_eq!(parse(&["config", "--init"]).unwrap(), Command::Config { init: true });
        assert_eq!(parse(&["config"]).unwrap(), Command::Config { init: false });
        assert_eq!(parse(&["devices"]).unwrap(), Command::Devices);
    }

    #[test]
    fn test_errors() {
        assert!(parse(&["export"]).is_err());
        assert!(parse(&["export", "a.wav", "--gain"]).is_err());
        assert!(parse(&["export", "a.wav", "--gain", "loud"]).is_err());
        assert!(parse(&["export", "a.wav", "--volume", "2"]).is_err());
        assert!(parse(&["info", "a.wav", "extra"]).is_err());
        assert!(parse(&["rewind"]).is_err());
    }
}
