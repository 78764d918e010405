//! Directory layout of a dataroot.

use crate::{common::*, config::Phase};

/// The directory holding the depth maps of domain A, for every phase.
pub const DEPTH_DIR_NAME: &str = "depthA";

/// The split that stands in for a missing test split.
pub const VALIDATION_PREFIX: &str = "val";

/// The resolved directories of each collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetLayout {
    pub dir_a: PathBuf,
    pub dir_b: PathBuf,
    pub depth_dir: PathBuf,
    /// Set if `valA` and `valB` replaced a missing `testA`.
    pub val_fallback: bool,
}

impl DatasetLayout {
    /// Resolve the directories of `dataroot` for `phase`.
    ///
    /// Domain B shares the domain A directory in the test phase. If `testA`
    /// is absent but `valA` exists, the validation split is used instead.
    pub fn resolve(dataroot: impl AsRef<Path>, phase: Phase) -> Self {
        let dataroot = dataroot.as_ref();
        let dir_a = dataroot.join(format!("{}A", phase));
        let dir_b = match phase {
            Phase::Test => dir_a.clone(),
            Phase::Train => dataroot.join(format!("{}B", phase)),
        };
        let depth_dir = dataroot.join(DEPTH_DIR_NAME);

        let val_dir_a = dataroot.join(format!("{}A", VALIDATION_PREFIX));
        if phase == Phase::Test && !dir_a.exists() && val_dir_a.exists() {
            warn!(
                "'{}' does not exist, use '{}' instead",
                dir_a.display(),
                val_dir_a.display()
            );

            return Self {
                dir_a: val_dir_a,
                dir_b: dataroot.join(format!("{}B", VALIDATION_PREFIX)),
                depth_dir,
                val_fallback: true,
            };
        }

        Self {
            dir_a,
            dir_b,
            depth_dir,
            val_fallback: false,
        }
    }
}
