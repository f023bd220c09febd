//! Configuration system for satlink.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $SATLINK_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/satlink/config.toml
//!   3. ~/.config/satlink/config.toml
//!
//! Files ending in `.json` are parsed as JSON, everything else as TOML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SatlinkConfig {
    pub version: String,
    pub satcom: SatcomConfig,
    pub ntn: NtnConfig,
    pub data_plane: DataPlaneConfig,
    pub uplink: UplinkConfig,
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SatcomConfig {
    /// How long `init` waits for the link's ready callback.
    pub init_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NtnConfig {
    pub enable: bool,
    /// SIM slot. Valid values: 1, 2.
    pub slot_id: u8,
    pub require_profile_active: bool,
    pub system_selection: SystemSelectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemSelectionConfig {
    pub service_domain_preference: ServiceDomainPreference,
    pub rat_preferences: RatPreferences,
    pub bands: BandPreferences,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatPreferences {
    pub modes: Vec<RatMode>,
    /// Overrides `modes` when present.
    pub raw_bitmask_override: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BandPreferences {
    pub gsm_bands: Vec<u32>,
    pub wcdma_bands: Vec<u32>,
    pub lte_bands: Vec<u32>,
    pub nr_nsa_bands: Vec<u32>,
    pub nr_sa_bands: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPlaneConfig {
    pub app_id: u32,
    /// Caps the uplink chunk size below the reported MTU. Must be >= 1.
    pub max_tx_pdu_override: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UplinkConfig {
    /// Deadline for each chunk's acknowledgment.
    pub ack_timeout_ms: u64,
    /// Chunk size used when the link never reports an MTU.
    pub fallback_mtu: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[serde(alias = "TRACE")]
    Trace,
    #[serde(alias = "DEBUG")]
    Debug,
    #[default]
    #[serde(alias = "INFO")]
    Info,
    #[serde(alias = "WARN")]
    Warn,
    #[serde(alias = "ERROR")]
    Error,
}

impl LogLevel {
    /// Default `EnvFilter` directive for this level.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceDomainPreference {
    #[serde(rename = "UNKNOWN")]
    Unknown,
    #[serde(rename = "CS_ONLY")]
    CsOnly,
    #[default]
    #[serde(rename = "PS_ONLY")]
    PsOnly,
    #[serde(rename = "CS_PS")]
    CsPs,
}

/// RAT preference. The discriminant is the bit position in the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatMode {
    #[serde(rename = "PREF_CDMA_1X")]
    Cdma1x = 0,
    #[serde(rename = "PREF_CDMA_EVDO")]
    CdmaEvdo = 1,
    #[serde(rename = "PREF_GSM")]
    Gsm = 2,
    #[serde(rename = "PREF_WCDMA")]
    Wcdma = 3,
    #[serde(rename = "PREF_LTE")]
    Lte = 4,
    #[serde(rename = "PREF_TDSCDMA")]
    Tdscdma = 5,
    #[serde(rename = "PREF_NR5G")]
    Nr5g = 6,
    #[serde(rename = "PREF_NB1_NTN")]
    Nb1Ntn = 7,
    #[serde(rename = "PREF_NR5G_NSA")]
    Nr5gNsa = 8,
    #[serde(rename = "PREF_NR5G_SA")]
    Nr5gSa = 9,
}

impl RatPreferences {
    /// RAT bitmask to program. The raw override wins over `modes`.
    pub fn mask(&self) -> u32 {
        if let Some(raw) = self.raw_bitmask_override {
            return raw;
        }
        self.modes.iter().fold(0u32, |m, r| m | (1u32 << (*r as u32)))
    }
}

// ── Defaults ──────────────────────────────────────────────────────────────────

const DEFAULT_VERSION: &str = "1.0";
const DEFAULT_INIT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SLOT_ID: u8 = 1;
const DEFAULT_ACK_TIMEOUT_MS: u64 = 30_000;

/// Conservative chunk size used until the link reports an MTU.
pub const DEFAULT_FALLBACK_MTU: u32 = 256;

impl Default for SatlinkConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            satcom: SatcomConfig::default(),
            ntn: NtnConfig::default(),
            data_plane: DataPlaneConfig::default(),
            uplink: UplinkConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

impl Default for SatcomConfig {
    fn default() -> Self {
        Self {
            init_timeout_ms: DEFAULT_INIT_TIMEOUT_MS,
        }
    }
}

impl Default for NtnConfig {
    fn default() -> Self {
        Self {
            enable: true,
            slot_id: DEFAULT_SLOT_ID,
            require_profile_active: false,
            system_selection: SystemSelectionConfig::default(),
        }
    }
}

impl Default for SystemSelectionConfig {
    fn default() -> Self {
        Self {
            service_domain_preference: ServiceDomainPreference::PsOnly,
            rat_preferences: RatPreferences::default(),
            bands: BandPreferences::default(),
        }
    }
}

impl Default for RatPreferences {
    fn default() -> Self {
        Self {
            modes: vec![RatMode::Nb1Ntn],
            raw_bitmask_override: None,
        }
    }
}

impl Default for DataPlaneConfig {
    fn default() -> Self {
        Self {
            app_id: 0,
            max_tx_pdu_override: None,
        }
    }
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
            fallback_mtu: DEFAULT_FALLBACK_MTU,
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("satlink")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to parse {0}: {1}")]
    JsonParseFailed(PathBuf, serde_json::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl SatlinkConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            SatlinkConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a single file without consulting the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        if is_json(path) {
            serde_json::from_str(&text)
                .map_err(|e| ConfigError::JsonParseFailed(path.to_path_buf(), e))
        } else {
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
        }
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("SATLINK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            Self::write_default_to(&path)?;
        }
        Ok(path)
    }

    fn write_default_to(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))?;
        }
        let text = toml::to_string_pretty(&SatlinkConfig::default())
            .map_err(ConfigError::SerializeFailed)?;
        std::fs::write(path, text).map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))
    }

    /// Reset out-of-range values to their defaults. Returns one warning per
    /// field that was reset.
    pub fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !matches!(self.ntn.slot_id, 1 | 2) {
            warnings.push(format!(
                "ntn.slot_id {} out of {{1,2}}, kept default {DEFAULT_SLOT_ID}",
                self.ntn.slot_id
            ));
            self.ntn.slot_id = DEFAULT_SLOT_ID;
        }
        if self.data_plane.max_tx_pdu_override == Some(0) {
            warnings.push("data_plane.max_tx_pdu_override < 1, ignoring".to_string());
            self.data_plane.max_tx_pdu_override = None;
        }
        if self.uplink.fallback_mtu == 0 {
            warnings.push(format!(
                "uplink.fallback_mtu must be positive, kept default {DEFAULT_FALLBACK_MTU}"
            ));
            self.uplink.fallback_mtu = DEFAULT_FALLBACK_MTU;
        }
        if self.uplink.ack_timeout_ms == 0 {
            warnings.push(format!(
                "uplink.ack_timeout_ms must be positive, kept default {DEFAULT_ACK_TIMEOUT_MS}"
            ));
            self.uplink.ack_timeout_ms = DEFAULT_ACK_TIMEOUT_MS;
        }
        warnings
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.satcom.init_timeout_ms)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.uplink.ack_timeout_ms)
    }

    /// Apply SATLINK_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SATLINK_SATCOM__INIT_TIMEOUT_MS") {
            if let Ok(ms) = v.parse() {
                self.satcom.init_timeout_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("SATLINK_NTN__SLOT_ID") {
            if let Ok(slot) = v.parse() {
                self.ntn.slot_id = slot;
            }
        }
        if let Ok(v) = std::env::var("SATLINK_UPLINK__ACK_TIMEOUT_MS") {
            if let Ok(ms) = v.parse() {
                self.uplink.ack_timeout_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("SATLINK_DATA_PLANE__MAX_TX_PDU_OVERRIDE") {
            if let Ok(pdu) = v.parse() {
                self.data_plane.max_tx_pdu_override = Some(pdu);
            }
        }
        if let Ok(v) = std::env::var("SATLINK_DIAGNOSTICS__LOG_LEVEL") {
            if let Ok(level) = v.parse() {
                self.diagnostics.log_level = level;
            }
        }
    }
}
