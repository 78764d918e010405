use anyhow::{Context, Result};
use clap::Parser;
use futures::TryStreamExt as _;
use prettytable::{cell, row, Table};
use std::{
    env,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};
use unaligned_dataset::{loader, DataLoader, DatasetOptions, LoaderOptions, UnalignedDataset};

#[derive(Debug, Clone, Parser)]
/// Inspect unaligned image datasets
enum Opts {
    /// Show the resolved directories and domain sizes
    Info {
        /// configuration file
        config_file: PathBuf,
    },
    /// Load one sample and show its sources and shapes
    Sample {
        /// configuration file
        config_file: PathBuf,
        /// sample index
        index: usize,
        #[clap(long, default_value = "0")]
        /// training epoch
        epoch: usize,
        #[clap(long)]
        /// random seed
        seed: Option<u64>,
    },
    /// Stream a whole epoch through the data loader
    Iterate {
        /// configuration file
        config_file: PathBuf,
        #[clap(long, default_value = "0")]
        /// training epoch
        epoch: usize,
        #[clap(long, default_value = "1")]
        /// batch size
        batch_size: NonZeroUsize,
        #[clap(long)]
        /// number of loading workers, defaults to the number of CPUs
        num_workers: Option<usize>,
        #[clap(long)]
        /// random seed
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // setup tracing
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).compact();
    let filter_layer = {
        let filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            filter.add_directive(LevelFilter::INFO.into())
        } else {
            filter
        }
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    match Opts::parse() {
        Opts::Info { config_file } => {
            show_info(config_file)?;
        }
        Opts::Sample {
            config_file,
            index,
            epoch,
            seed,
        } => {
            show_sample(config_file, index, epoch, seed)?;
        }
        Opts::Iterate {
            config_file,
            epoch,
            batch_size,
            num_workers,
            seed,
        } => {
            let options = LoaderOptions {
                batch_size,
                num_workers,
                seed,
            };
            iterate(config_file, epoch, options).await?;
        }
    }

    Ok(())
}

fn load_dataset(config_file: impl AsRef<Path>) -> Result<UnalignedDataset> {
    let config_file = config_file.as_ref();
    let options = DatasetOptions::open(config_file)
        .with_context(|| format!("failed to load config file '{}'", config_file.display()))?;
    UnalignedDataset::new(options)
}

fn show_info(config_file: impl AsRef<Path>) -> Result<()> {
    let dataset = load_dataset(config_file)?;
    let options = dataset.options();
    let layout = dataset.layout();

    let mut table = Table::new();
    table.add_row(row!["collection", "directory", "size"]);
    table.add_row(row!["A", layout.dir_a.display(), dataset.a_size()]);
    table.add_row(row!["B", layout.dir_b.display(), dataset.b_size()]);
    table.add_row(row![
        "depth",
        layout.depth_dir.display(),
        dataset.depth_paths().len()
    ]);
    table.printstd();

    let mut table = Table::new();
    table.add_row(row!["option", "value"]);
    table.add_row(row!["phase", options.phase]);
    table.add_row(row!["length", dataset.len()]);
    table.add_row(row!["val fallback", layout.val_fallback]);
    table.add_row(row!["serial batches", options.serial_batches]);
    table.add_row(row!["preprocess", format!("{:?}", options.preprocess)]);
    table.add_row(row!["load size", options.load_size]);
    table.add_row(row!["crop size", options.crop_size]);
    table.printstd();

    Ok(())
}

fn show_sample(
    config_file: impl AsRef<Path>,
    index: usize,
    epoch: usize,
    seed: Option<u64>,
) -> Result<()> {
    let dataset = load_dataset(config_file)?;
    let mut rng = loader::sample_rng(seed, epoch, index);
    let sample = dataset.get(index, epoch, &mut rng)?;

    let mut table = Table::new();
    table.add_row(row!["key", "value"]);
    table.add_row(row!["A", format!("{:?}", sample.a.size())]);
    table.add_row(row!["B", format!("{:?}", sample.b.size())]);
    table.add_row(row!["A_paths", sample.a_path.display()]);
    table.add_row(row!["B_paths", sample.b_path.display()]);
    if let Some(depth) = &sample.a_depth {
        table.add_row(row!["A_depth", format!("{:?}", depth.size())]);
    }
    table.printstd();

    Ok(())
}

async fn iterate(config_file: impl AsRef<Path>, epoch: usize, options: LoaderOptions) -> Result<()> {
    let dataset = load_dataset(config_file)?;
    let loader = DataLoader::new(dataset, options);
    let num_batches = loader.num_batches();
    let since = Instant::now();

    let mut stream = loader.epoch_stream(epoch);
    let mut count = 0;

    while let Some(batch) = stream.try_next().await? {
        count += 1;
        info!(
            "batch {}/{}: A {:?}, B {:?}, depth {:?}",
            count,
            num_batches,
            batch.a.size(),
            batch.b.size(),
            batch.a_depth.as_ref().map(|depth| depth.size())
        );
    }

    info!(
        "loaded {} batches of epoch {} in {:?}",
        count,
        epoch,
        since.elapsed()
    );

    Ok(())
}
