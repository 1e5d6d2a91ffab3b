use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Knobs for how a [`Book`](crate::Book) manages files on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookOptions {
    /// Keep the previous container as `<name>.bak` when it gets replaced.
    pub backup: bool,
    /// Where working directories are created. Defaults to the system
    /// temporary directory.
    pub temp_dir: Option<PathBuf>,
}
