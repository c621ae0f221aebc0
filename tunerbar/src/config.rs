//! Configuration file format and resolved settings.
//!
//! The file is TOML. Every key is optional; missing keys fall back to the
//! defaults below and command-line values override file values.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tunerbar_protocol::ServiceKey;

use crate::viewer::SchedulerConfig;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tunerbar.toml";
/// Default snapshot document path.
pub const DEFAULT_SNAPSHOT_FILE: &str = "tunerbar-state.json";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{name} must be between 0 and 59 seconds (got {value})")]
    InvalidMargin { name: &'static str, value: u32 },
}

/// Configuration file format.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub service: ServiceSection,
    #[serde(default)]
    pub viewer: ViewerSection,
    #[serde(default)]
    pub auto_open: AutoOpenSection,
    #[serde(default)]
    pub lists: ListsSection,
    #[serde(default)]
    pub web_link: WebLinkSection,
    /// BonDriver file name to tuner display name.
    #[serde(default)]
    pub tuners: HashMap<String, String>,
    #[serde(default)]
    pub channels: ChannelsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize, Default)]
pub struct ServiceSection {
    /// Snapshot document read by the file-backed service.
    pub snapshot: Option<String>,
    /// The scheduling service is reached over TCP.
    pub use_tcp: Option<bool>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ViewerSection {
    /// Viewer (TVTest) executable.
    pub path: Option<String>,
    pub terrestrial_options: Option<String>,
    pub satellite_options: Option<String>,
    /// Options for playing recorded files (TvtPlay).
    pub ts_file_options: Option<String>,
    /// Launch the viewer on double click.
    pub double_click: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AutoOpenSection {
    pub enabled: Option<bool>,
    pub terrestrial: Option<bool>,
    pub bs: Option<bool>,
    pub cs: Option<bool>,
    pub favorites_only: Option<bool>,
    pub open_margin: Option<u32>,
    pub close_margin: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListsSection {
    /// Maximum recorded files listed (0 = unlimited).
    pub recorded_max: Option<usize>,
    /// Toggling a reservation switches between "disabled" and mode 1 only.
    pub fix_no_rec_to_service_only: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct WebLinkSection {
    pub enabled: Option<bool>,
    /// Template with `{ONID}`, `{TSID}`, `{SID}`, `{EID}`.
    pub event_url: Option<String>,
    /// Template with `{RecID}`.
    pub recorded_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEntry {
    pub tsid: u16,
    pub sid: u16,
}

impl From<ChannelEntry> for ServiceKey {
    fn from(entry: ChannelEntry) -> Self {
        ServiceKey::new(entry.tsid, entry.sid)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ChannelsSection {
    /// Channel lineup. Empty means every channel in the program guide.
    #[serde(default)]
    pub all: Vec<ChannelEntry>,
    #[serde(default)]
    pub favorites: Vec<ChannelEntry>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LoggingSection {
    pub log_dir: Option<String>,
    pub retention_days: Option<u64>,
    pub level: Option<String>,
}

/// Read and parse a configuration file.
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Viewer launch settings.
#[derive(Debug, Clone, Default)]
pub struct ViewerSettings {
    pub path: Option<PathBuf>,
    pub terrestrial_options: String,
    pub satellite_options: String,
    pub ts_file_options: String,
    pub double_click: bool,
}

/// Web link settings.
#[derive(Debug, Clone, Default)]
pub struct WebLinkSettings {
    pub enabled: bool,
    pub event_url: String,
    pub recorded_url: String,
}

/// Resolved settings consumed by the application.
#[derive(Debug, Clone)]
pub struct Settings {
    pub snapshot_path: PathBuf,
    /// Recorded file paths must be translated to network paths.
    pub remote_service: bool,
    pub viewer: ViewerSettings,
    pub scheduler: SchedulerConfig,
    pub recorded_max: usize,
    pub fix_no_rec_to_service_only: bool,
    pub web_link: WebLinkSettings,
    pub tuner_names: HashMap<String, String>,
    pub channels: Vec<ServiceKey>,
    pub favorites: Vec<ServiceKey>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            remote_service: false,
            viewer: ViewerSettings::default(),
            scheduler: SchedulerConfig::default(),
            recorded_max: 0,
            fix_no_rec_to_service_only: false,
            web_link: WebLinkSettings::default(),
            tuner_names: HashMap::new(),
            channels: Vec::new(),
            favorites: Vec::new(),
        }
    }
}

impl Settings {
    /// Resolve file values, applying defaults and validating margins.
    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let defaults = SchedulerConfig::default();
        let open_margin = validate_margin("auto_open.open_margin", file.auto_open.open_margin, defaults.open_margin)?;
        let close_margin = validate_margin("auto_open.close_margin", file.auto_open.close_margin, defaults.close_margin)?;

        let use_tcp = file.service.use_tcp.unwrap_or(false);
        let address = file.service.address.unwrap_or_default();
        let remote_service = use_tcp && !address.contains("127.0.0.1");

        let viewer = ViewerSettings {
            path: file.viewer.path.map(PathBuf::from),
            terrestrial_options: file.viewer.terrestrial_options.unwrap_or_default(),
            satellite_options: file.viewer.satellite_options.unwrap_or_default(),
            ts_file_options: file.viewer.ts_file_options.unwrap_or_default(),
            double_click: file.viewer.double_click.unwrap_or(false),
        };

        let scheduler = SchedulerConfig {
            enabled: file.auto_open.enabled.unwrap_or(defaults.enabled),
            open_margin,
            close_margin,
            terrestrial: file.auto_open.terrestrial.unwrap_or(defaults.terrestrial),
            bs: file.auto_open.bs.unwrap_or(defaults.bs),
            cs: file.auto_open.cs.unwrap_or(defaults.cs),
            favorites_only: file.auto_open.favorites_only.unwrap_or(defaults.favorites_only),
            terrestrial_options: viewer.terrestrial_options.clone(),
            satellite_options: viewer.satellite_options.clone(),
        };

        Ok(Self {
            snapshot_path: file
                .service
                .snapshot
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_FILE)),
            remote_service,
            viewer,
            scheduler,
            recorded_max: file.lists.recorded_max.unwrap_or(0),
            fix_no_rec_to_service_only: file.lists.fix_no_rec_to_service_only.unwrap_or(false),
            web_link: WebLinkSettings {
                enabled: file.web_link.enabled.unwrap_or(false),
                event_url: file.web_link.event_url.unwrap_or_default(),
                recorded_url: file.web_link.recorded_url.unwrap_or_default(),
            },
            tuner_names: file.tuners,
            channels: file.channels.all.into_iter().map(ServiceKey::from).collect(),
            favorites: file.channels.favorites.into_iter().map(ServiceKey::from).collect(),
        })
    }
}

fn validate_margin(name: &'static str, value: Option<u32>, default: u32) -> Result<u32, ConfigError> {
    match value {
        Some(v) if v > 59 => Err(ConfigError::InvalidMargin { name, value: v }),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}
