//! Parallel epoch iteration and batching.

use crate::{
    common::*,
    config::LoaderOptions,
    dataset::{Sample, UnalignedDataset},
    transform::{StandardTransformFactory, TransformFactory},
};

/// Stacked samples of one step.
#[derive(Debug)]
pub struct Batch {
    /// `[N, 3, H, W]` domain A images.
    pub a: Tensor,
    /// `[N, 3, H, W]` domain B images.
    pub b: Tensor,
    pub a_paths: Vec<PathBuf>,
    pub b_paths: Vec<PathBuf>,
    /// `[N, 1, H, W]` depth maps, present in the training phase only.
    pub a_depth: Option<Tensor>,
}

impl Batch {
    pub fn collate(samples: Vec<Sample>) -> Result<Self> {
        ensure!(!samples.is_empty(), "cannot collate an empty batch");

        let (a_vec, b_vec, a_paths, b_paths, depth_vec) = samples
            .into_iter()
            .map(|sample| {
                let Sample {
                    a,
                    b,
                    a_path,
                    b_path,
                    a_depth,
                } = sample;
                (a, b, a_path, b_path, a_depth)
            })
            .unzip_n_vec();

        let num_depths = depth_vec.iter().filter(|depth| depth.is_some()).count();
        ensure!(
            num_depths == 0 || num_depths == depth_vec.len(),
            "{} out of {} samples carry depth maps",
            num_depths,
            depth_vec.len()
        );
        let depth_vec: Option<Vec<_>> = depth_vec.into_iter().collect();

        let (a, b, a_depth) = tch::no_grad(|| -> Result<_> {
            let a = Tensor::f_stack(&a_vec, 0)?;
            let b = Tensor::f_stack(&b_vec, 0)?;
            let a_depth = depth_vec
                .map(|depth_vec| Tensor::f_stack(&depth_vec, 0))
                .transpose()?;
            Ok((a, b, a_depth))
        })?;

        Ok(Self {
            a,
            b,
            a_paths,
            b_paths,
            a_depth,
        })
    }

    pub fn len(&self) -> usize {
        self.a_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a_paths.is_empty()
    }
}

/// Iterates a dataset by epochs on parallel workers.
#[derive(Debug)]
pub struct DataLoader<F = StandardTransformFactory>
where
    F: TransformFactory,
{
    dataset: Arc<UnalignedDataset<F>>,
    options: LoaderOptions,
}

impl<F> DataLoader<F>
where
    F: 'static + TransformFactory,
{
    pub fn new(dataset: impl Into<Arc<UnalignedDataset<F>>>, options: LoaderOptions) -> Self {
        Self {
            dataset: dataset.into(),
            options,
        }
    }

    pub fn dataset(&self) -> &Arc<UnalignedDataset<F>> {
        &self.dataset
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// The number of samples per epoch, bounded by `max_dataset_size`.
    pub fn num_samples(&self) -> usize {
        let len = self.dataset.len();
        match self.dataset.options().max_dataset_size {
            Some(max_size) => len.min(max_size),
            None => len,
        }
    }

    pub fn num_batches(&self) -> usize {
        let batch_size = self.options.batch_size.get();
        (self.num_samples() + batch_size - 1) / batch_size
    }

    /// The sample indexes visited in `epoch`.
    ///
    /// They are in order with `serial_batches`, otherwise shuffled.
    pub fn epoch_indices(&self, epoch: usize) -> Vec<usize> {
        let mut indices: Vec<_> = (0..self.dataset.len()).collect();

        if !self.dataset.options().serial_batches {
            let mut rng = epoch_rng(self.options.seed, epoch);
            indices.shuffle(&mut rng);
        }

        indices.truncate(self.num_samples());
        indices
    }

    /// Load the batches of `epoch`.
    ///
    /// Samples are loaded on blocking worker threads and batched in the order
    /// of [epoch_indices](Self::epoch_indices).
    pub fn epoch_stream(&self, epoch: usize) -> BoxStream<'static, Result<Batch>> {
        let batch_size = self.options.batch_size.get();
        let num_workers = self.options.num_workers.unwrap_or_else(num_cpus::get).max(1);
        let seed = self.options.seed;
        let dataset = self.dataset.clone();
        debug!(
            "start epoch {} with {} samples on {} workers",
            epoch,
            self.num_samples(),
            num_workers
        );

        stream::iter(self.epoch_indices(epoch))
            .map(move |index| {
                let dataset = dataset.clone();

                tokio::task::spawn_blocking(move || {
                    let mut rng = sample_rng(seed, epoch, index);
                    dataset
                        .get(index, epoch, &mut rng)
                        .with_context(|| format!("failed to load sample {}", index))
                })
                .map(|result| Fallible::Ok(result??))
            })
            .buffered(num_workers)
            .chunks(batch_size)
            .map(|results| {
                let samples: Vec<_> = results.into_iter().try_collect()?;
                Batch::collate(samples)
            })
            .boxed()
    }
}

/// Mix a base seed with a stream position.
fn mix_seed(seed: u64, epoch: usize, index: u64) -> u64 {
    // splitmix64 finalizer applied per component
    fn mix(mut z: u64) -> u64 {
        z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    mix(mix(mix(seed) ^ epoch as u64) ^ index)
}

/// The random source that shuffles the indexes of `epoch`.
pub fn epoch_rng(seed: Option<u64>, epoch: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(mix_seed(seed, epoch, u64::MAX)),
        None => StdRng::from_entropy(),
    }
}

/// The random source of the sample at `index` in `epoch`.
///
/// Every sample owns an independent source, so workers never share one. With
/// a seed the sequence depends on `(seed, epoch, index)` only, not on which
/// worker loads the sample.
pub fn sample_rng(seed: Option<u64>, epoch: usize, index: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(mix_seed(seed, epoch, index as u64)),
        None => StdRng::from_entropy(),
    }
}
