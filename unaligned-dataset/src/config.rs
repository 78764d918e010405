//! Dataset and loader configuration format.

use crate::{common::*, transform::TransformOptions};

pub use loader::*;
pub use phase::*;
pub use preprocess::*;

/// The dataset options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetOptions {
    /// The directory containing `<phase>A`, `<phase>B` and `depthA`.
    pub dataroot: PathBuf,
    pub phase: Phase,
    /// The maximum number of images scanned per directory. Unlimited if unset.
    #[serde(default)]
    pub max_dataset_size: Option<usize>,
    /// If set, domain B is indexed in lockstep with domain A. Otherwise a
    /// B image is drawn at random on every access.
    #[serde(default)]
    pub serial_batches: bool,
    /// Whether the dataset feeds a training run. Defaults to `phase == train`.
    #[serde(default)]
    pub is_train: Option<bool>,
    /// The number of epochs trained before the learning rate decays.
    #[serde(default = "default_n_epochs")]
    pub n_epochs: usize,
    #[serde(default = "default_load_size")]
    pub load_size: NonZeroUsize,
    #[serde(default = "default_crop_size")]
    pub crop_size: NonZeroUsize,
    #[serde(default)]
    pub preprocess: Preprocess,
    #[serde(default)]
    pub no_flip: bool,
}

impl DatasetOptions {
    pub fn new(dataroot: impl Into<PathBuf>, phase: Phase) -> Self {
        Self {
            dataroot: dataroot.into(),
            phase,
            max_dataset_size: None,
            serial_batches: false,
            is_train: None,
            n_epochs: default_n_epochs(),
            load_size: default_load_size(),
            crop_size: default_crop_size(),
            preprocess: Preprocess::default(),
            no_flip: false,
        }
    }

    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        Self::from_json5_str(&text)
    }

    pub fn from_json5_str(text: &str) -> Result<Self> {
        let options = json5::from_str(text)?;
        Ok(options)
    }

    pub fn is_train(&self) -> bool {
        self.is_train.unwrap_or(self.phase == Phase::Train)
    }

    /// Past the non-decay epochs of a training run, the resize-crop
    /// augmentation is replaced by a fixed crop size.
    pub fn is_finetuning(&self, epoch: usize) -> bool {
        self.is_train() && epoch > self.n_epochs
    }

    /// Build the preprocessing options in effect at `epoch`.
    pub fn transform_options(&self, epoch: usize) -> Result<TransformOptions> {
        let load_size = if self.is_finetuning(epoch) {
            self.crop_size
        } else {
            self.load_size
        };

        Ok(TransformOptions {
            preprocess: self.preprocess,
            load_size: u32::try_from(load_size.get())
                .with_context(|| format!("load_size {} is too large", load_size))?,
            crop_size: u32::try_from(self.crop_size.get())
                .with_context(|| format!("crop_size {} is too large", self.crop_size))?,
            no_flip: self.no_flip,
        })
    }
}

fn default_n_epochs() -> usize {
    100
}

const DEFAULT_LOAD_SIZE: NonZeroUsize = match NonZeroUsize::new(286) {
    Some(size) => size,
    None => unreachable!(),
};

const DEFAULT_CROP_SIZE: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(size) => size,
    None => unreachable!(),
};

fn default_load_size() -> NonZeroUsize {
    DEFAULT_LOAD_SIZE
}

fn default_crop_size() -> NonZeroUsize {
    DEFAULT_CROP_SIZE
}

mod phase {
    use super::*;

    /// The experiment phase. It selects the directory layout and whether
    /// depth maps are attached to samples.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Phase {
        Train,
        Test,
    }

    impl Phase {
        /// The directory name prefix, as in `trainA` or `testB`.
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Train => "train",
                Self::Test => "test",
            }
        }
    }

    impl Display for Phase {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl FromStr for Phase {
        type Err = Error;

        fn from_str(text: &str) -> Result<Self, Self::Err> {
            let phase = match text {
                "train" => Self::Train,
                "test" => Self::Test,
                _ => bail!("invalid phase '{}', expect 'train' or 'test'", text),
            };
            Ok(phase)
        }
    }
}

mod preprocess {
    use super::*;

    /// Image preprocessing modes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Preprocess {
        /// Resize to `load_size` square, then crop `crop_size` square.
        ResizeAndCrop,
        /// Crop `crop_size` square without resizing.
        Crop,
        /// Scale the width to `load_size` and keep the aspect ratio.
        ScaleWidth,
        /// Scale the width to `load_size`, then crop `crop_size` square.
        ScaleWidthAndCrop,
        /// Round the size to a multiple of 4 only.
        None,
    }

    impl Preprocess {
        pub fn crops(&self) -> bool {
            matches!(
                self,
                Self::ResizeAndCrop | Self::Crop | Self::ScaleWidthAndCrop
            )
        }
    }

    impl Default for Preprocess {
        fn default() -> Self {
            Self::ResizeAndCrop
        }
    }
}

mod loader {
    use super::*;

    /// Batching options of [DataLoader](crate::loader::DataLoader).
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LoaderOptions {
        pub batch_size: NonZeroUsize,
        /// The number of parallel sample loading workers. Defaults to the number of CPUs.
        #[serde(default)]
        pub num_workers: Option<usize>,
        /// The base seed of the per-sample random sources. Drawn from entropy if unset.
        #[serde(default)]
        pub seed: Option<u64>,
    }

    impl Default for LoaderOptions {
        fn default() -> Self {
            Self {
                batch_size: NonZeroUsize::MIN,
                num_workers: None,
                seed: None,
            }
        }
    }
}
