//! Runtime configuration for view status tracking.
//!
//! Configuration is built once (usually by [`ConfigLoader`]) and handed to
//! the components at construction. The enable flag lives in a shared
//! [`FeatureToggle`] so a host settings screen can flip it without touching
//! the tracker.

mod loader;
mod sources;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub use loader::{
    ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions,
    ConfigWarnings,
};
pub use sources::{EnvConfig, FileConfig, FileOverlayConfig};

use crate::thumbnail_cache::DEFAULT_THUMBNAIL_CACHE_CAPACITY;

/// Default name of the hidden per-directory record file.
pub const DEFAULT_RECORD_FILE_NAME: &str = ".viewstatus";

/// Shared on/off switch for tracking.
///
/// Clones observe the same flag.
#[derive(Debug, Clone)]
pub struct FeatureToggle(Arc<AtomicBool>);

impl FeatureToggle {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Release);
    }
}

impl Default for FeatureToggle {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Caption bar geometry and colours.
///
/// Pixel sizes are given for an image `reference_height` pixels tall and
/// scaled proportionally to the actual thumbnail height.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    pub bar_height: u32,
    pub font_size: f32,
    /// Distance from the bar's bottom edge to the text baseline.
    pub baseline_offset: u32,
    pub reference_height: u32,
    pub bar_color: [u8; 4],
    pub text_color: [u8; 3],
    pub jpeg_quality: u8,
    /// TrueType font for captions; system fonts are searched when unset.
    pub font_path: Option<PathBuf>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            bar_height: 35,
            font_size: 25.0,
            baseline_offset: 7,
            reference_height: 240,
            bar_color: [0, 0, 0, 190],
            text_color: [240, 240, 240],
            jpeg_quality: 90,
            font_path: None,
        }
    }
}

impl OverlayConfig {
    /// Scale factor for an image of the given height.
    pub fn scale_for(&self, image_height: u32) -> f32 {
        if self.reference_height == 0 {
            return 1.0;
        }
        image_height as f32 / self.reference_height as f32
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct ViewStatusConfig {
    pub enabled: FeatureToggle,
    pub record_file_name: String,
    /// Captioned thumbnails kept in memory before the oldest is evicted.
    pub thumbnail_cache_capacity: usize,
    pub overlay: OverlayConfig,
}

impl Default for ViewStatusConfig {
    fn default() -> Self {
        Self {
            enabled: FeatureToggle::default(),
            record_file_name: DEFAULT_RECORD_FILE_NAME.to_string(),
            thumbnail_cache_capacity: DEFAULT_THUMBNAIL_CACHE_CAPACITY,
            overlay: OverlayConfig::default(),
        }
    }
}

impl ViewStatusConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.is_enabled()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set_enabled(enabled);
    }

    /// Check invariants that the type system does not enforce.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let name = self.record_file_name.as_str();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
        {
            return Err(ConfigLoadError::Invalid(format!(
                "record_file_name must be a plain file name, got {name:?}"
            )));
        }
        if self.thumbnail_cache_capacity == 0 {
            return Err(ConfigLoadError::Invalid(
                "thumbnail_cache_capacity must be greater than zero".into(),
            ));
        }
        if !(1..=100).contains(&self.overlay.jpeg_quality) {
            return Err(ConfigLoadError::Invalid(format!(
                "overlay.jpeg_quality must be within 1..=100, got {}",
                self.overlay.jpeg_quality
            )));
        }
        if self.overlay.reference_height == 0 {
            return Err(ConfigLoadError::Invalid(
                "overlay.reference_height must be greater than zero".into(),
            ));
        }
        if !(self.overlay.font_size.is_finite() && self.overlay.font_size > 0.0)
        {
            return Err(ConfigLoadError::Invalid(format!(
                "overlay.font_size must be positive, got {}",
                self.overlay.font_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_clones_share_state() {
        let config = ViewStatusConfig::default();
        let handle = config.enabled.clone();
        assert!(config.is_enabled());

        handle.set_enabled(false);

        assert!(!config.is_enabled());
    }

    #[test]
    fn defaults_validate() {
        ViewStatusConfig::default().validate().unwrap();
    }

    #[test]
    fn record_file_name_must_not_be_a_path() {
        let config = ViewStatusConfig {
            record_file_name: "../escape".into(),
            ..ViewStatusConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigLoadError::Invalid(_))));
    }

    #[test]
    fn jpeg_quality_is_bounded() {
        let mut config = ViewStatusConfig::default();
        config.overlay.jpeg_quality = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn thumbnail_cache_needs_room_for_one_entry() {
        let config = ViewStatusConfig {
            thumbnail_cache_capacity: 0,
            ..ViewStatusConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigLoadError::Invalid(_))));
    }

    #[test]
    fn scale_follows_image_height() {
        let overlay = OverlayConfig::default();
        assert_eq!(overlay.scale_for(240), 1.0);
        assert_eq!(overlay.scale_for(480), 2.0);
    }
}
