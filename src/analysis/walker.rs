use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Lazy depth-first walk yielding every regular file under a root directory.
///
/// Order follows the directory listing and is not sorted. Symlinks are
/// neither yielded nor followed.
#[derive(Debug)]
pub struct FileTreeWalker {
    root: PathBuf,
    entries: walkdir::IntoIter,
}

impl FileTreeWalker {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = std::path::absolute(root)
            .with_context(|| format!("failed to resolve audit directory {}", root.display()))?;
        fs::read_dir(&root)
            .with_context(|| format!("failed to read audit directory {}", root.display()))?;

        let entries = WalkDir::new(&root).follow_links(false).into_iter();

        Ok(Self { root, entries })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Iterator for FileTreeWalker {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let location = err
                        .path()
                        .map(|path| path.display().to_string())
                        .unwrap_or_else(|| self.root.display().to_string());
                    return Some(
                        Err(err).with_context(|| format!("failed to walk directory {location}")),
                    );
                }
            };

            if entry.file_type().is_file() {
                return Some(Ok(entry.into_path()));
            }
        }
    }
}
