use std::path::PathBuf;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default, PartialEq)]
pub(crate) struct AppConfig {
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub waveform: WaveformConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default, PartialEq)]
pub(crate) struct ExportConfig {
    /// Directory for exported files; current directory when unset
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub(crate) struct WaveformConfig {
    #[serde(default = "default_columns")]
    pub columns: usize,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self { columns: default_columns() }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub(crate) struct PlaybackConfig {
    /// Transport polling rate in Hz
    #[serde(default = "default_poll_hz")]
    pub poll_hz: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { poll_hz: default_poll_hz() }
    }
}

fn default_columns() -> usize {
    80
}

fn default_poll_hz() -> u32 {
    60
}

pub(crate) fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tapedeck")
        .join("config.toml")
}

pub(crate) fn load_config() -> AppConfig {
    let path = config_path();
    std::fs::read_to_string(&path)
        .ok()
        .and_then(|s| parse_config(&s))
        .unwrap_or_default()
}

pub(crate) fn save_config(config: &AppConfig) -> anyhow::Result<PathBuf> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(config)?)?;
    Ok(path)
}

fn parse_config(s: &str) -> Option<AppConfig> {
    match toml::from_str(s) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Ignoring invalid config: {}", e);
            None
        }
    }
}
