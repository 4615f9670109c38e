//! Flat-directory fragment store
//!
//! Objects live directly under one directory, named `<logical>.part<index>`.
//! There is no index, no manifest and no locking: writes go straight to the
//! final path (a crash mid-write leaves a truncated object), and a retrieve
//! racing an overwrite or delete of the same name has undefined outcome.

use crate::common::{fragment, wire, Result};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncWriteExt};

pub struct FragmentStore {
    root: PathBuf,
}

impl FragmentStore {
    /// Open the store, creating the directory if needed.
    pub async fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).await?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, name: &str) -> Result<PathBuf> {
        fragment::validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// Write exactly `size` bytes from `reader`, creating or overwriting
    /// `name`.
    pub async fn write_from<R>(
        &self,
        name: &str,
        size: u64,
        reader: &mut R,
        chunk_size: usize,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let path = self.object_path(name)?;
        let mut file = File::create(&path).await?;
        wire::copy_exact(reader, &mut file, size, chunk_size).await?;
        file.flush().await?;
        Ok(())
    }

    /// Open `name` for reading, returning its size and handle.
    pub async fn open_read(&self, name: &str) -> Result<(u64, File)> {
        let path = self.object_path(name)?;
        let file = File::open(&path).await?;
        let size = file.metadata().await?.len();
        Ok((size, file))
    }

    /// Every object name currently in the namespace, primaries and replicas
    /// alike.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                if let Ok(name) = entry.file_name().into_string() {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    /// Delete every object whose name starts with `stem + ".part"`.
    /// Ok(true) only if every matched object was removed; a stem matching
    /// nothing is still a success.
    pub async fn delete_prefix(&self, stem: &str) -> Result<bool> {
        fragment::validate_name(stem)?;
        let prefix = fragment::fragment_prefix(stem);

        let mut all_deleted = true;
        for name in self.list().await? {
            if !name.starts_with(&prefix) {
                continue;
            }
            if let Err(e) = fs::remove_file(self.root.join(&name)).await {
                tracing::warn!("failed to delete {}: {}", name, e);
                all_deleted = false;
            }
        }
        Ok(all_deleted)
    }
}

impl std::fmt::Debug for FragmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentStore")
            .field("root", &self.root)
            .finish()
    }
}
