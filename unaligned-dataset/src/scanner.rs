//! Image file discovery.

use crate::{common::*, error::DatasetError};

/// File extensions recognized as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "ppm", "bmp", "pgm", "tif", "tiff", "webp",
];

/// Lists the image files under a directory.
pub trait PathScanner
where
    Self: Debug + Send + Sync,
{
    /// List image files under `dir` in a deterministic order, keeping at
    /// most `max_size` entries.
    fn scan(&self, dir: &Path, max_size: Option<usize>) -> Result<Vec<PathBuf>>;
}

/// Recursively collects image files, sorted by path.
#[derive(Debug, Clone, Default)]
pub struct ImageFolderScanner;

impl PathScanner for ImageFolderScanner {
    fn scan(&self, dir: &Path, max_size: Option<usize>) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(DatasetError::MissingDirectory {
                dir: dir.to_owned(),
            }
            .into());
        }

        let pattern = {
            let dir = dir
                .to_str()
                .ok_or_else(|| format_err!("non-unicode path '{}'", dir.display()))?;
            format!("{}/**/*", glob::Pattern::escape(dir))
        };

        let mut paths: Vec<PathBuf> = glob::glob(&pattern)?
            .map(|entry| -> Result<_> {
                let path = entry?;
                Ok(path)
            })
            .filter_ok(|path| path.is_file() && is_image_file(path))
            .try_collect()?;
        paths.sort();

        if let Some(max_size) = max_size {
            paths.truncate(max_size);
        }

        debug!("found {} images in '{}'", paths.len(), dir.display());
        Ok(paths)
    }
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn scan_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        ["c.png", "a.JPG", "b.txt", "nested/b.jpeg", "nested/deeper/z.bmp"]
            .iter()
            .for_each(|name| touch(&root.join(name)));

        let paths = ImageFolderScanner.scan(root, None).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|path| path.strip_prefix(root).unwrap().to_owned())
            .collect();

        assert_eq!(
            names,
            vec![
                PathBuf::from("a.JPG"),
                PathBuf::from("c.png"),
                PathBuf::from("nested/b.jpeg"),
                PathBuf::from("nested/deeper/z.bmp"),
            ]
        );
    }

    #[test]
    fn scan_truncates_after_sorting() {
        let dir = tempfile::tempdir().unwrap();
        ["3.png", "1.png", "2.png"]
            .iter()
            .for_each(|name| touch(&dir.path().join(name)));

        let paths = ImageFolderScanner.scan(dir.path(), Some(2)).unwrap();
        assert_eq!(
            paths,
            vec![dir.path().join("1.png"), dir.path().join("2.png")]
        );
    }

    #[test]
    fn missing_directory_is_typed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("trainA");
        let err = ImageFolderScanner.scan(&missing, None).unwrap_err();

        match err.downcast_ref::<DatasetError>() {
            Some(DatasetError::MissingDirectory { dir }) => assert_eq!(dir, &missing),
            _ => panic!("unexpected error {:?}", err),
        }
    }
}
