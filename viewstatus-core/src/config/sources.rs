use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub(crate) const ENV_CONFIG_PATH: &str = "VIEWSTATUS_CONFIG";
pub(crate) const ENV_ENABLED: &str = "VIEWSTATUS_ENABLED";
pub(crate) const ENV_RECORD_FILE: &str = "VIEWSTATUS_RECORD_FILE";
pub(crate) const ENV_FONT_PATH: &str = "VIEWSTATUS_FONT_PATH";

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_cache_capacity: Option<usize>,
    #[serde(default)]
    pub overlay: FileOverlayConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileOverlayConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_color: Option<[u8; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<[u8; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jpeg_quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}

/// Configuration overrides read from the environment.
///
/// Values are kept raw so the loader can report which variable was bad.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub enabled: Option<String>,
    pub record_file_name: Option<String>,
    pub font_path: Option<PathBuf>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            config_path: get(ENV_CONFIG_PATH).map(PathBuf::from),
            enabled: get(ENV_ENABLED),
            record_file_name: get(ENV_RECORD_FILE),
            font_path: get(ENV_FONT_PATH).map(PathBuf::from),
        }
    }
}
