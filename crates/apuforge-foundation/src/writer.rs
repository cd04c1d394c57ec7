//! Atomic artifact writer.
//!
//! Each file is written to a temporary file in the output directory,
//! `fsync`'d, then renamed over the target, so consumers polling the
//! directory never observe a partial document. A manifest records what the
//! last run produced; files it lists that the current set no longer
//! contains are removed.

use crate::artifact::ArtifactSet;
use crate::error::WriteError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const MANIFEST_FILE: &str = ".apuforge-manifest.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    files: Vec<String>,
}

/// Outcome of [`ArtifactWriter::write`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
    pub pruned: Vec<String>,
}

/// Differences between an artifact set and the output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DriftReport {
    pub missing: Vec<String>,
    pub changed: Vec<String>,
    /// Files from a previous run the current set would prune.
    pub stale: Vec<String>,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.changed.is_empty() && self.stale.is_empty()
    }
}

pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write every artifact, then prune files left over from the previous run.
    pub fn write(&self, set: &ArtifactSet) -> Result<WriteReport, WriteError> {
        fs::create_dir_all(&self.dir).map_err(|source| WriteError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let previous = self.read_manifest()?;
        let mut report = WriteReport::default();

        for artifact in set {
            let target = self.dir.join(&artifact.file_name);
            if self.read_existing(&target)?.as_deref() == Some(artifact.contents.as_str()) {
                debug!(file = %artifact.file_name, "artifact unchanged");
                report.unchanged.push(artifact.file_name.clone());
                continue;
            }
            self.persist(&target, artifact.contents.as_bytes())?;
            info!(file = %target.display(), "wrote artifact");
            report.written.push(artifact.file_name.clone());
        }

        let current: BTreeSet<&str> = set.file_names().into_iter().collect();
        for name in previous.files.iter().filter(|f| !current.contains(f.as_str())) {
            let path = self.dir.join(name);
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!(file = %path.display(), "pruned stale artifact");
                    report.pruned.push(name.clone());
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(WriteError::Io { path, source }),
            }
        }

        let manifest = Manifest {
            files: set.file_names().into_iter().map(str::to_string).collect(),
        };
        let payload = serde_json::to_vec_pretty(&manifest)?;
        self.persist(&self.dir.join(MANIFEST_FILE), &payload)?;

        Ok(report)
    }

    /// Compare `set` with the directory without writing anything.
    pub fn check(&self, set: &ArtifactSet) -> Result<DriftReport, WriteError> {
        let mut report = DriftReport::default();
        for artifact in set {
            let target = self.dir.join(&artifact.file_name);
            match self.read_existing(&target)? {
                None => report.missing.push(artifact.file_name.clone()),
                Some(existing) if existing != artifact.contents => {
                    report.changed.push(artifact.file_name.clone())
                }
                Some(_) => {}
            }
        }

        let current: BTreeSet<&str> = set.file_names().into_iter().collect();
        for name in self.read_manifest()?.files {
            if !current.contains(name.as_str()) && self.dir.join(&name).exists() {
                report.stale.push(name);
            }
        }
        Ok(report)
    }

    fn read_existing(&self, path: &Path) -> Result<Option<String>, WriteError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(WriteError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn read_manifest(&self) -> Result<Manifest, WriteError> {
        let path = self.dir.join(MANIFEST_FILE);
        match self.read_existing(&path)? {
            None => Ok(Manifest::default()),
            Some(raw) => {
                serde_json::from_str(&raw).map_err(|source| WriteError::Manifest { path, source })
            }
        }
    }

    fn persist(&self, target: &Path, payload: &[u8]) -> Result<(), WriteError> {
        let io_err = |source| WriteError::Io {
            path: target.to_path_buf(),
            source,
        };

        // Same directory keeps the rename on one filesystem.
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(payload).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(target).map_err(|e| WriteError::Persist {
            path: target.to_path_buf(),
            source: e.error,
        })?;
        Ok(())
    }
}
