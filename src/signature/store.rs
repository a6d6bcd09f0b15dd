//! A folder of saved signature PNGs named `<name>_<YYYYMMDD_HHMMSS>.png`.
//!
//! Saves within the same second get a `_2`, `_3`, ... suffix instead of
//! replacing the earlier file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::Local;

use crate::error::{AppError, AppResult};

use super::raster::SignatureImage;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSignature {
    pub path: PathBuf,
    pub stem: String,
    pub modified: SystemTime,
}

#[derive(Debug, Clone)]
pub struct SignatureStore {
    dir: PathBuf,
}

impl SignatureStore {
    /// Opens the store, creating the directory on first use.
    pub fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        if dir.exists() && !dir.is_dir() {
            return Err(AppError::invalid_argument(format!(
                "signature store is not a directory: {}",
                dir.display()
            )));
        }
        fs::create_dir_all(&dir).map_err(|source| {
            AppError::io_with_context(
                source,
                format!("failed to create signature store: {}", dir.display()),
            )
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, name: &str, signature: &SignatureImage) -> AppResult<SavedSignature> {
        let name = validate_name(name)?;
        let base = format!("{name}_{}", Local::now().format(TIMESTAMP_FORMAT));
        let png = signature.encode_png()?;

        let (stem, path, mut file) = self.create_unique(&base)?;
        if let Err(source) = file.write_all(&png) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(AppError::io_with_context(
                source,
                format!("failed to write signature: {}", path.display()),
            ));
        }
        tracing::info!(path = %path.display(), "saved signature");

        let modified = modified_time(&path)?;
        Ok(SavedSignature {
            path,
            stem,
            modified,
        })
    }

    /// Creates `<base>.png`, or the first free `<base>_<n>.png`, without replacing anything.
    fn create_unique(&self, base: &str) -> AppResult<(String, PathBuf, File)> {
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let stem = if attempt == 1 {
                base.to_string()
            } else {
                format!("{base}_{attempt}")
            };
            let path = self.dir.join(format!("{stem}.png"));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((stem, path, file)),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(source) => {
                    return Err(AppError::io_with_context(
                        source,
                        format!("failed to create signature: {}", path.display()),
                    ));
                }
            }
        }
        Err(AppError::invalid_argument(format!(
            "too many signatures named {base}"
        )))
    }

    /// Saved signatures, newest first by modification time.
    pub fn list(&self) -> AppResult<Vec<SavedSignature>> {
        let entries = fs::read_dir(&self.dir).map_err(|source| {
            AppError::io_with_context(
                source,
                format!("failed to list signature store: {}", self.dir.display()),
            )
        })?;

        let mut saved = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || !is_png(&path) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let stem = stem.to_string();
            let modified = modified_time(&path)?;
            saved.push(SavedSignature {
                path,
                stem,
                modified,
            });
        }

        saved.sort_by(|left, right| {
            right
                .modified
                .cmp(&left.modified)
                .then_with(|| right.stem.cmp(&left.stem))
        });
        Ok(saved)
    }

    pub fn find(&self, stem: &str) -> AppResult<SavedSignature> {
        self.list()?
            .into_iter()
            .find(|saved| saved.stem == stem)
            .ok_or_else(|| AppError::invalid_argument(format!("no saved signature named {stem}")))
    }

    pub fn load(&self, stem: &str) -> AppResult<SignatureImage> {
        let saved = self.find(stem)?;
        SignatureImage::load(&saved.path)
    }

    pub fn delete(&self, stem: &str) -> AppResult<()> {
        let saved = self.find(stem)?;
        fs::remove_file(&saved.path).map_err(|source| {
            AppError::io_with_context(
                source,
                format!("failed to delete signature: {}", saved.path.display()),
            )
        })?;
        tracing::info!(path = %saved.path.display(), "deleted signature");
        Ok(())
    }
}

fn validate_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::invalid_argument("signature name must not be empty"));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(AppError::invalid_argument(
            "signature name must not contain path separators",
        ));
    }
    Ok(name)
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}

fn modified_time(path: &Path) -> AppResult<SystemTime> {
    fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map_err(|source| {
            AppError::io_with_context(source, format!("failed to stat {}", path.display()))
        })
}
