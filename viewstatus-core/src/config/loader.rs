use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use super::{
    FeatureToggle, OverlayConfig, ViewStatusConfig,
    sources::{ENV_ENABLED, EnvConfig, FileConfig},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("viewstatus.toml"),
        PathBuf::from("config/viewstatus.toml"),
    ]
});

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file {path} does not exist")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value {value:?} for {variable}")]
    InvalidEnv { variable: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Non-fatal observations made while loading.
#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings(Vec<String>);

impl ConfigWarnings {
    pub fn push(&mut self, warning: impl Into<String>) {
        self.0.push(warning.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: ViewStatusConfig,
    pub source: Option<PathBuf>,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    /// Environment snapshot; gathered from the process when `None`.
    pub env: Option<EnvConfig>,
    /// Directory the default locations are resolved against.
    pub search_root: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.options.env = Some(env);
        self
    }

    pub fn with_search_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.options.search_root = Some(root.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env = self.options.env.clone().unwrap_or_else(EnvConfig::gather);
        let mut warnings = ConfigWarnings::default();

        let (file_config, source) = self.load_file_config(&env)?;
        if source.is_none() {
            warnings.push(
                "No viewstatus.toml detected; using defaults and environment variables",
            );
        }

        let config = compose_config(file_config.unwrap_or_default(), &env)?;
        config.validate()?;

        Ok(ConfigLoad {
            config,
            source,
            warnings,
        })
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) if !path.exists() => {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            Some(path) => path,
            None => {
                let root = self
                    .options
                    .search_root
                    .as_deref()
                    .unwrap_or_else(|| Path::new("."));
                match DEFAULT_CONFIG_LOCATIONS
                    .iter()
                    .map(|candidate| root.join(candidate))
                    .find(|candidate| candidate.exists())
                {
                    Some(found) => found,
                    None => return Ok((None, None)),
                }
            }
        };

        let contents =
            fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

fn compose_config(
    file: FileConfig,
    env: &EnvConfig,
) -> Result<ViewStatusConfig, ConfigLoadError> {
    let enabled = match env.enabled.as_deref() {
        Some(raw) => parse_bool(raw).ok_or_else(|| ConfigLoadError::InvalidEnv {
            variable: ENV_ENABLED,
            value: raw.to_string(),
        })?,
        // Tracking is on unless something says otherwise.
        None => file.enabled.unwrap_or(true),
    };

    let defaults = ViewStatusConfig::default();
    let overlay_defaults = OverlayConfig::default();
    let file_overlay = file.overlay;

    let overlay = OverlayConfig {
        bar_height: file_overlay.bar_height.unwrap_or(overlay_defaults.bar_height),
        font_size: file_overlay.font_size.unwrap_or(overlay_defaults.font_size),
        baseline_offset: file_overlay
            .baseline_offset
            .unwrap_or(overlay_defaults.baseline_offset),
        reference_height: file_overlay
            .reference_height
            .unwrap_or(overlay_defaults.reference_height),
        bar_color: file_overlay.bar_color.unwrap_or(overlay_defaults.bar_color),
        text_color: file_overlay
            .text_color
            .unwrap_or(overlay_defaults.text_color),
        jpeg_quality: file_overlay
            .jpeg_quality
            .unwrap_or(overlay_defaults.jpeg_quality),
        font_path: env.font_path.clone().or(file_overlay.font_path),
    };

    Ok(ViewStatusConfig {
        enabled: FeatureToggle::new(enabled),
        record_file_name: env
            .record_file_name
            .clone()
            .or(file.record_file_name)
            .unwrap_or(defaults.record_file_name),
        thumbnail_cache_capacity: file
            .thumbnail_cache_capacity
            .unwrap_or(defaults.thumbnail_cache_capacity),
        overlay,
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env() -> EnvConfig {
        EnvConfig::default()
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let load = ConfigLoader::new()
            .with_env(no_env())
            .with_search_root(dir.path())
            .load()
            .unwrap();

        assert!(load.source.is_none());
        assert!(!load.warnings.is_empty());
        assert!(load.config.is_enabled());
        assert_eq!(load.config.record_file_name, ".viewstatus");
        assert_eq!(load.config.overlay, OverlayConfig::default());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = ConfigLoader::new()
            .with_env(no_env())
            .with_config_path(dir.path().join("nope.toml"))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("viewstatus.toml"),
            r#"
enabled = false
record_file_name = ".watched"
thumbnail_cache_capacity = 32

[overlay]
bar_height = 40
text_color = [255, 255, 0]
jpeg_quality = 75
"#,
        )
        .unwrap();

        let load = ConfigLoader::new()
            .with_env(no_env())
            .with_search_root(dir.path())
            .load()
            .unwrap();

        assert_eq!(load.source, Some(dir.path().join("viewstatus.toml")));
        assert!(!load.config.is_enabled());
        assert_eq!(load.config.record_file_name, ".watched");
        assert_eq!(load.config.thumbnail_cache_capacity, 32);
        assert_eq!(load.config.overlay.bar_height, 40);
        assert_eq!(load.config.overlay.text_color, [255, 255, 0]);
        assert_eq!(load.config.overlay.jpeg_quality, 75);
        assert_eq!(load.config.overlay.font_size, 25.0);
    }

    #[test]
    fn environment_wins_over_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "enabled = false\n").unwrap();

        let env = EnvConfig::from_lookup(|key| match key {
            "VIEWSTATUS_CONFIG" => Some(path.display().to_string()),
            "VIEWSTATUS_ENABLED" => Some("yes".into()),
            "VIEWSTATUS_RECORD_FILE" => Some(".seen".into()),
            _ => None,
        });

        let load = ConfigLoader::new().with_env(env).load().unwrap();
        assert_eq!(load.source, Some(path));
        assert!(load.config.is_enabled());
        assert_eq!(load.config.record_file_name, ".seen");
    }

    #[test]
    fn bad_boolean_in_environment_is_reported() {
        let env = EnvConfig::from_lookup(|key| {
            (key == "VIEWSTATUS_ENABLED").then(|| "maybe".to_string())
        });
        let dir = TempDir::new().unwrap();
        let err = ConfigLoader::new()
            .with_env(env)
            .with_search_root(dir.path())
            .load()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::InvalidEnv {
                variable: "VIEWSTATUS_ENABLED",
                ..
            }
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("viewstatus.toml"), "enabled = = true").unwrap();
        let err = ConfigLoader::new()
            .with_env(no_env())
            .with_search_root(dir.path())
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::Parse { .. }));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("viewstatus.toml"),
            "record_file_name = \"sub/.viewstatus\"\n",
        )
        .unwrap();
        let err = ConfigLoader::new()
            .with_env(no_env())
            .with_search_root(dir.path())
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::Invalid(_)));
    }
}
