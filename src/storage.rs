use crate::saving::{load_gzip_backup, save_gzip_backup, write_atomically};
use std::ffi::OsString;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// The canonical workbook on disk
///
/// Reads never block on writers: a replacement is written to a temporary
/// file and renamed into place. Replacements are serialized.
pub struct WorkbookStore {
    path: PathBuf,
    keep_backup: bool,
    write_lock: Mutex<()>,
}

impl WorkbookStore {
    pub fn new(path: impl Into<PathBuf>, keep_backup: bool) -> Self {
        WorkbookStore {
            path: path.into(),
            keep_backup,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name offered to browsers on download
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workbook.xlsx".to_string())
    }

    /// `<name>.bak.gz` next to the workbook
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("workbook.xlsx"));
        name.push(".bak.gz");
        self.path.with_file_name(name)
    }

    /// Current workbook bytes, `None` when no workbook has been stored
    pub async fn read(&self) -> io::Result<Option<Vec<u8>>> {
        read_if_exists(&self.path).await
    }

    /// The previous workbook, decompressed, if a backup exists
    pub async fn read_backup(&self) -> io::Result<Option<Vec<u8>>> {
        let backup = self.backup_path();
        tokio::task::spawn_blocking(move || match load_gzip_backup(&backup) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        })
        .await
        .map_err(io::Error::other)?
    }

    /// Replace the workbook with `bytes`
    ///
    /// When backups are enabled the current workbook is compressed to the
    /// backup path first. The workbook is untouched if anything fails before
    /// the final rename.
    pub async fn replace(&self, bytes: Vec<u8>) -> io::Result<()> {
        let _guard = self.write_lock.lock().await;

        let path = self.path.clone();
        let backup = self.keep_backup.then(|| self.backup_path());

        tokio::task::spawn_blocking(move || {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }

            if let Some(backup) = backup {
                match fs::read(&path) {
                    Ok(current) => {
                        save_gzip_backup(&current, &backup)?;
                        log::debug!("Backed up previous workbook to {}", backup.display());
                    }
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e),
                }
            }

            write_atomically(&path, &bytes)
        })
        .await
        .map_err(io::Error::other)?
    }
}

async fn read_if_exists(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
