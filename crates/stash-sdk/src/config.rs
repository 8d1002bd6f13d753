use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use stash_codec::ZstdCodec;
use stash_filter::FilterConfig;

use crate::error::{StashError, StashResult};

/// Configuration for a [`Stash`](crate::Stash).
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// root = "/var/lib/stash"
/// compression_level = 9
///
/// [filter]
/// capacity = 50000
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StashConfig {
    /// Directory holding the index and all blobs. Created if absent.
    pub root: PathBuf,
    /// File name of the index document inside `root`.
    pub index_file: String,
    /// Membership filter sizing.
    pub filter: FilterConfig,
    /// zstd level, 1..=22.
    pub compression_level: i32,
    /// fsync blobs and the index before they are renamed into place.
    pub sync_writes: bool,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("stash"),
            index_file: "index.json".into(),
            filter: FilterConfig::default(),
            compression_level: stash_codec::DEFAULT_LEVEL,
            sync_writes: true,
        }
    }
}

impl StashConfig {
    /// Defaults with the given storage root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> StashResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| StashError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> StashResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Full path of the index document.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index_file)
    }

    /// Reject settings the store cannot run with.
    pub fn validate(&self) -> StashResult<()> {
        if self.index_file.is_empty() {
            return Err(StashError::Config("index_file must not be empty".into()));
        }
        let mut components = Path::new(&self.index_file).components();
        let plain = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none();
        if !plain {
            return Err(StashError::Config(format!(
                "index_file must be a plain file name, got {:?}",
                self.index_file
            )));
        }
        self.filter
            .validate()
            .map_err(|e| StashError::Config(e.to_string()))?;
        ZstdCodec::new(self.compression_level).map_err(|e| StashError::Config(e.to_string()))?;
        Ok(())
    }
}
