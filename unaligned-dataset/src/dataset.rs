//! The unaligned two-domain dataset with domain A depth maps.

use crate::{
    common::*,
    config::{DatasetOptions, Phase},
    decode,
    depth::DepthLoader,
    error::{DatasetError, Domain},
    layout::DatasetLayout,
    scanner::{ImageFolderScanner, PathScanner},
    transform::{ImageTransform, StandardTransformFactory, TransformFactory},
};

/// The source files of one sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SamplePaths {
    pub a_path: PathBuf,
    pub b_path: PathBuf,
    /// Present in the training phase only.
    pub depth_path: Option<PathBuf>,
}

/// One transformed sample.
#[derive(Debug)]
pub struct Sample {
    /// The `[3, H, W]` domain A image.
    pub a: Tensor,
    /// The `[3, H, W]` domain B image.
    pub b: Tensor,
    pub a_path: PathBuf,
    pub b_path: PathBuf,
    /// The `[1, H, W]` depth map aligned to `a`. Present in the training phase only.
    pub a_depth: Option<Tensor>,
}

impl Sample {
    pub const A: &'static str = "A";
    pub const B: &'static str = "B";
    pub const A_PATHS: &'static str = "A_paths";
    pub const B_PATHS: &'static str = "B_paths";
    pub const A_DEPTH: &'static str = "A_depth";

    /// The field names carried by this sample.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = vec![Self::A, Self::B, Self::A_PATHS, Self::B_PATHS];
        if self.a_depth.is_some() {
            keys.push(Self::A_DEPTH);
        }
        keys
    }
}

/// Two unpaired image domains A and B plus depth maps of domain A.
///
/// The dataset length is the size of the larger domain. Domain A is indexed
/// modulo its size. Domain B is indexed in lockstep when `serial_batches`
/// is set, otherwise it is drawn at random on every access. In the test
/// phase domain B is an alias of domain A and no depth is loaded.
///
/// Depth maps are paired with domain A images by sorted position in their
/// directories, not by file name.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct UnalignedDataset<F = StandardTransformFactory>
where
    F: TransformFactory,
{
    options: DatasetOptions,
    layout: DatasetLayout,
    #[derivative(Debug = "ignore")]
    a_paths: Arc<[PathBuf]>,
    #[derivative(Debug = "ignore")]
    b_paths: Arc<[PathBuf]>,
    #[derivative(Debug = "ignore")]
    depth_paths: Arc<[PathBuf]>,
    factory: F,
    depth_loader: DepthLoader,
}

impl UnalignedDataset {
    /// Scan the dataroot with the default scanner and transforms.
    pub fn new(options: DatasetOptions) -> Result<Self> {
        Self::with_collaborators(options, StandardTransformFactory, &ImageFolderScanner)
    }
}

impl<F> UnalignedDataset<F>
where
    F: TransformFactory,
{
    /// Scan the dataroot with `scanner` and preprocess samples with
    /// transforms built by `factory`.
    pub fn with_collaborators<S>(options: DatasetOptions, factory: F, scanner: &S) -> Result<Self>
    where
        S: PathScanner + ?Sized,
    {
        let layout = DatasetLayout::resolve(&options.dataroot, options.phase);
        let max_size = options.max_dataset_size;

        let a_paths: Arc<[PathBuf]> = scanner
            .scan(&layout.dir_a, max_size)
            .with_context(|| format!("failed to scan domain A '{}'", layout.dir_a.display()))?
            .into();

        // the test phase reuses domain A as domain B
        let b_paths: Arc<[PathBuf]> = match options.phase {
            Phase::Test => a_paths.clone(),
            Phase::Train => scanner
                .scan(&layout.dir_b, max_size)
                .with_context(|| {
                    format!("failed to scan domain B '{}'", layout.dir_b.display())
                })?
                .into(),
        };

        // depth maps are consumed in the training phase only
        let depth_paths: Arc<[PathBuf]> = match options.phase {
            Phase::Train => scanner
                .scan(&layout.depth_dir, max_size)
                .with_context(|| {
                    format!("failed to scan depth maps '{}'", layout.depth_dir.display())
                })?
                .into(),
            Phase::Test => Arc::from(Vec::new()),
        };

        if options.phase == Phase::Train && depth_paths.len() != a_paths.len() {
            warn!(
                "{} depth maps in '{}' are paired by position with {} images in '{}'",
                depth_paths.len(),
                layout.depth_dir.display(),
                a_paths.len(),
                layout.dir_a.display()
            );
        }

        info!(
            "loaded {} phase dataset, {} images in '{}', {} images in '{}', {} depth maps",
            options.phase,
            a_paths.len(),
            layout.dir_a.display(),
            b_paths.len(),
            layout.dir_b.display(),
            depth_paths.len()
        );

        Ok(Self {
            options,
            layout,
            a_paths,
            b_paths,
            depth_paths,
            factory,
            depth_loader: DepthLoader,
        })
    }

    pub fn options(&self) -> &DatasetOptions {
        &self.options
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    pub fn a_paths(&self) -> &[PathBuf] {
        &self.a_paths
    }

    pub fn b_paths(&self) -> &[PathBuf] {
        &self.b_paths
    }

    pub fn depth_paths(&self) -> &[PathBuf] {
        &self.depth_paths
    }

    pub fn a_size(&self) -> usize {
        self.a_paths.len()
    }

    pub fn b_size(&self) -> usize {
        self.b_paths.len()
    }

    /// The size of the larger domain.
    pub fn len(&self) -> usize {
        self.a_size().max(self.b_size())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pick the source files of the sample at `index` without decoding them.
    ///
    /// `rng` is consumed only when domain B is drawn at random.
    pub fn resolve<R>(&self, index: usize, rng: &mut R) -> Result<SamplePaths>
    where
        R: Rng + ?Sized,
    {
        let a_size = self.a_size();
        let b_size = self.b_size();
        ensure!(a_size > 0, DatasetError::EmptyDomain { domain: Domain::A });
        ensure!(b_size > 0, DatasetError::EmptyDomain { domain: Domain::B });

        let index_a = index % a_size;
        let index_b = if self.options.serial_batches {
            index % b_size
        } else {
            rng.gen_range(0..b_size)
        };

        let depth_path = match self.options.phase {
            Phase::Train => {
                let len = self.depth_paths.len();
                ensure!(len > 0, DatasetError::EmptyDomain {
                    domain: Domain::DepthA
                });
                let path = self
                    .depth_paths
                    .get(index_a)
                    .ok_or(DatasetError::DepthIndexOutOfRange {
                        index: index_a,
                        len,
                    })?;
                Some(path.clone())
            }
            Phase::Test => None,
        };

        Ok(SamplePaths {
            a_path: self.a_paths[index_a].clone(),
            b_path: self.b_paths[index_b].clone(),
            depth_path,
        })
    }

    /// Load and transform the sample at `index`.
    ///
    /// `epoch` is the current training epoch. Past `n_epochs` of a training
    /// run the images are resized to `crop_size` instead of `load_size`.
    pub fn get<R>(&self, index: usize, epoch: usize, rng: &mut R) -> Result<Sample>
    where
        R: Rng,
    {
        let _span = trace_span!("get_sample", index, epoch).entered();

        let SamplePaths {
            a_path,
            b_path,
            depth_path,
        } = self.resolve(index, rng)?;
        debug!(
            "sample {} uses '{}' and '{}'",
            index,
            a_path.display(),
            b_path.display()
        );

        let a_image = decode::load_rgb(&a_path)?;
        let b_image = decode::load_rgb(&b_path)?;

        let transform = self.factory.build(&self.options.transform_options(epoch)?)?;
        let b = transform.transform_rgb(&b_image, rng)?;

        let (a, a_depth) = match depth_path {
            Some(depth_path) => {
                let depth = self.depth_loader.load(&depth_path)?;
                let (a, a_depth) = transform.transform_dual(&a_image, &depth, rng)?;
                (a, Some(a_depth))
            }
            None => (transform.transform_rgb(&a_image, rng)?, None),
        };

        Ok(Sample {
            a,
            b,
            a_path,
            b_path,
            a_depth,
        })
    }
}
