use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use crate::error::{ModelError, Result};

const VIDEO_EXTENSIONS: &[&str] = &[
    "3gp", "avi", "divx", "flv", "m2ts", "m4v", "mkv", "mov", "mp4", "mpeg",
    "mpg", "mts", "ogv", "ts", "vob", "webm", "wmv",
];
const AUDIO_EXTENSIONS: &[&str] =
    &["aac", "flac", "m4a", "mp3", "ogg", "opus", "wav", "wma"];
const IMAGE_EXTENSIONS: &[&str] =
    &["bmp", "gif", "jpeg", "jpg", "png", "tif", "tiff", "webp"];

/// Broad classification of a resource as reported by the host.
///
/// Only [`MediaKind::Video`] participates in watch tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MediaKind {
    Video,
    Audio,
    Image,
    Other,
}

impl MediaKind {
    pub fn is_video(&self) -> bool {
        matches!(self, MediaKind::Video)
    }

    /// Guess the kind from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Audio
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else {
            MediaKind::Other
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(MediaKind::from_extension)
            .unwrap_or(MediaKind::Other)
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Image => write!(f, "image"),
            MediaKind::Other => write!(f, "other"),
        }
    }
}

/// Identity of a media item: the directory holding it and its file name.
///
/// The directory selects the record file, the file name is the key inside
/// that record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceKey {
    directory: PathBuf,
    file_name: String,
}

impl ResourceKey {
    pub fn new(
        directory: impl Into<PathBuf>,
        file_name: impl Into<String>,
    ) -> Result<Self> {
        let file_name = file_name.into();
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(ModelError::InvalidFileName(file_name));
        }
        Ok(Self {
            directory: directory.into(),
            file_name,
        })
    }

    /// Split a media file path into its directory and display name.
    pub fn from_media_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .ok_or_else(|| ModelError::InvalidMediaPath(path.to_path_buf()))?
            .to_str()
            .ok_or_else(|| {
                ModelError::InvalidFileName(
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                )
            })?;

        let directory = match path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
            Some(parent) => parent.to_path_buf(),
            None => return Err(ModelError::InvalidMediaPath(path.to_path_buf())),
        };

        Self::new(directory, file_name)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.media_path().display())
    }
}
