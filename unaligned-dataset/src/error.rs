//! Typed failures of the dataset policy.
//!
//! Every public function returns [anyhow::Result]. The variants here are the
//! root causes that callers may recover with `Error::downcast_ref`.

use crate::common::*;
use thiserror::Error;

/// The image collection that an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    A,
    B,
    DepthA,
}

impl Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::A => "A",
            Self::B => "B",
            Self::DepthA => "depthA",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("'{}' is not a valid directory", dir.display())]
    MissingDirectory { dir: PathBuf },
    #[error("domain {domain} has no images")]
    EmptyDomain { domain: Domain },
    #[error("depth index {index} is out of range for {len} depth images")]
    DepthIndexOutOfRange { index: usize, len: usize },
}
