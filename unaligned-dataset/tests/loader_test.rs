mod common;

use anyhow::Result;
use common::{Fixture, RecordingFactory};
use futures::TryStreamExt as _;
use std::num::NonZeroUsize;
use unaligned_dataset::{
    loader::Batch, scanner::ImageFolderScanner, DataLoader, DatasetOptions, LoaderOptions, Phase,
    UnalignedDataset,
};

fn loader_options(batch_size: usize, seed: Option<u64>) -> LoaderOptions {
    LoaderOptions {
        batch_size: NonZeroUsize::new(batch_size).unwrap(),
        num_workers: Some(3),
        seed,
    }
}

fn train_fixture(a_count: usize, b_count: usize) -> Fixture {
    let fixture = Fixture::new();
    fixture.add_rgb("trainA", a_count, (20, 16));
    fixture.add_rgb("trainB", b_count, (20, 16));
    fixture.add_depth(a_count, (20, 16), |index| index as u16);
    fixture
}

#[tokio::test]
async fn serial_epoch_is_ordered_and_batched() -> Result<()> {
    let fixture = train_fixture(10, 4);
    let options = DatasetOptions {
        serial_batches: true,
        load_size: NonZeroUsize::new(18).unwrap(),
        crop_size: NonZeroUsize::new(16).unwrap(),
        ..DatasetOptions::new(fixture.root(), Phase::Train)
    };
    let dataset = UnalignedDataset::new(options)?;
    let a_paths = dataset.a_paths().to_vec();
    let b_paths = dataset.b_paths().to_vec();
    let loader = DataLoader::new(dataset, loader_options(4, None));

    assert_eq!(loader.num_samples(), 10);
    assert_eq!(loader.num_batches(), 3);
    assert_eq!(loader.epoch_indices(0), (0..10).collect::<Vec<_>>());

    let batches: Vec<Batch> = loader.epoch_stream(0).try_collect().await?;
    let sizes: Vec<_> = batches.iter().map(|batch| batch.len()).collect();
    assert_eq!(sizes, vec![4, 4, 2]);

    let first = &batches[0];
    assert_eq!(first.a.size(), vec![4, 3, 16, 16]);
    assert_eq!(first.b.size(), vec![4, 3, 16, 16]);
    assert_eq!(first.a_depth.as_ref().unwrap().size(), vec![4, 1, 16, 16]);

    let visited_a: Vec<_> = batches.iter().flat_map(|batch| batch.a_paths.clone()).collect();
    let visited_b: Vec<_> = batches.iter().flat_map(|batch| batch.b_paths.clone()).collect();
    assert_eq!(visited_a, a_paths);
    let expect_b: Vec<_> = (0..10).map(|index| b_paths[index % 4].clone()).collect();
    assert_eq!(visited_b, expect_b);

    Ok(())
}

#[tokio::test]
async fn seeded_epochs_are_reproducible() -> Result<()> {
    let fixture = train_fixture(6, 3);
    let factory = RecordingFactory::default();
    let dataset = UnalignedDataset::with_collaborators(
        DatasetOptions::new(fixture.root(), Phase::Train),
        factory,
        &ImageFolderScanner,
    )?;
    let loader = DataLoader::new(dataset, loader_options(2, Some(1234)));

    let mut indices = loader.epoch_indices(1);
    assert_eq!(indices, loader.epoch_indices(1));
    indices.sort_unstable();
    assert_eq!(indices, (0..6).collect::<Vec<_>>());

    let collect_paths = |batches: Vec<Batch>| -> Vec<_> {
        batches
            .into_iter()
            .flat_map(|batch| batch.a_paths.into_iter().zip(batch.b_paths))
            .collect()
    };

    let first = collect_paths(loader.epoch_stream(1).try_collect().await?);
    let second = collect_paths(loader.epoch_stream(1).try_collect().await?);
    assert_eq!(first.len(), 6);
    assert_eq!(first, second);

    Ok(())
}

#[tokio::test]
async fn test_phase_batches_have_no_depth() -> Result<()> {
    let fixture = Fixture::new();
    fixture.add_rgb("testA", 3, (20, 16));

    let options = DatasetOptions {
        load_size: NonZeroUsize::new(16).unwrap(),
        crop_size: NonZeroUsize::new(16).unwrap(),
        ..DatasetOptions::new(fixture.root(), Phase::Test)
    };
    let loader = DataLoader::new(UnalignedDataset::new(options)?, loader_options(2, Some(0)));

    let batches: Vec<Batch> = loader.epoch_stream(0).try_collect().await?;
    assert_eq!(batches.len(), 2);
    assert!(batches.iter().all(|batch| batch.a_depth.is_none()));
    assert!(batches
        .iter()
        .all(|batch| batch.a_paths.len() == batch.b_paths.len()));

    Ok(())
}

#[tokio::test]
async fn failed_sample_ends_the_stream_with_error() -> Result<()> {
    let fixture = train_fixture(3, 3);
    std::fs::write(fixture.root().join("trainB").join("001.png"), b"not an image")?;

    let options = DatasetOptions {
        serial_batches: true,
        ..DatasetOptions::new(fixture.root(), Phase::Train)
    };
    let loader = DataLoader::new(UnalignedDataset::new(options)?, loader_options(3, None));

    let result: Result<Vec<Batch>> = loader.epoch_stream(0).try_collect().await;
    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("failed to load sample 1"));

    Ok(())
}
