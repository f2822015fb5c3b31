// pickshot/src/host/fs.rs
use super::{ContentAccess, HostResult, Storage};
use crate::core::Location;
use anyhow::Context;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// [`ContentAccess`] over plain filesystem paths: a [`Location`] is
/// interpreted as a file path.
#[derive(Debug, Default, Clone)]
pub struct FsContent;

impl FsContent {
    pub fn new() -> Self {
        Self
    }
}

impl ContentAccess for FsContent {
    fn open(&self, location: &Location) -> HostResult<Box<dyn Read + Send>> {
        let file = File::open(location.as_str())
            .with_context(|| format!("failed to open {}", location))?;
        Ok(Box::new(file))
    }

    fn delete(&self, location: &Location) -> HostResult<()> {
        std::fs::remove_file(location.as_str())
            .with_context(|| format!("failed to delete {}", location))
    }
}

/// [`Storage`] over two directories: a cache directory for temporary
/// capture targets and an output directory for final files.
#[derive(Debug, Clone)]
pub struct FsStorage {
    cache_dir: PathBuf,
    output_dir: PathBuf,
}

impl FsStorage {
    pub fn new(cache_dir: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }
}

impl Storage for FsStorage {
    fn create_temp_output(&self, name_hint: &str) -> HostResult<Location> {
        std::fs::create_dir_all(&self.cache_dir)
            .with_context(|| format!("failed to create {}", self.cache_dir.display()))?;

        // The file must outlive this call: a capture application writes
        // into it later, so it is persisted rather than dropped.
        let temp = tempfile::Builder::new()
            .prefix(name_hint)
            .suffix(".jpg")
            .tempfile_in(&self.cache_dir)
            .context("failed to create temporary capture file")?;
        let path = temp
            .into_temp_path()
            .keep()
            .context("failed to persist temporary capture file")?;

        log::debug!("allocated capture target {}", path.display());
        Ok(Location(path.to_string_lossy().into_owned()))
    }

    fn create_final_output(&self, name_hint: &str) -> HostResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("failed to create {}", self.output_dir.display()))?;
        Ok(self.output_dir.join(format!("{}.jpg", name_hint)))
    }
}
