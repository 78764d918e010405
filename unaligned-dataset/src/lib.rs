//! Unpaired two-domain image dataset with an auxiliary depth channel for
//! image-to-image translation training.

mod common;
pub mod config;
pub mod dataset;
pub mod decode;
pub mod depth;
pub mod error;
pub mod layout;
pub mod loader;
pub mod scanner;
pub mod transform;

pub use config::{DatasetOptions, LoaderOptions, Phase, Preprocess};
pub use dataset::{Sample, SamplePaths, UnalignedDataset};
pub use error::{Domain, DatasetError};
pub use loader::{Batch, DataLoader};
