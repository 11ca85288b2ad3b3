//! Study persistence.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use pw_types::{BackendError, PwResult};

use crate::study::Study;

/// Storage seam for studies.
///
/// Loading is load-if-exists: a missing study is created and persisted
/// immediately so asked-but-unscored trials survive a failed render.
pub trait StudyStore {
    fn create_or_load(&self, name: &str) -> PwResult<Study>;
    fn save(&self, study: &Study) -> PwResult<()>;
}

/// File-backed store: one JSON document per study under a root directory.
///
/// Accepts `json://<dir>` URLs or bare directory paths; an empty URL means
/// the default store under the user data directory.
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn open(url: &str) -> PwResult<Self> {
        let root = if url.is_empty() {
            Self::default_root()
        } else if let Some(path) = url.strip_prefix("json://") {
            PathBuf::from(path)
        } else if url.contains("://") {
            return Err(BackendError::UnsupportedStorageUrl {
                url: url.to_string(),
            }
            .into());
        } else {
            PathBuf::from(url)
        };

        std::fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened study store");
        Ok(Self { root })
    }

    /// Default store location under the user data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("promptweave")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn study_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }
}

impl StudyStore for JsonFileStore {
    fn create_or_load(&self, name: &str) -> PwResult<Study> {
        if name.contains(['/', '\\']) {
            return Err(BackendError::StudyCorrupted {
                name: name.to_string(),
                message: "study name must not contain path separators".to_string(),
            }
            .into());
        }

        let path = self.study_path(name);
        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let study: Study =
                serde_json::from_str(&raw).map_err(|e| BackendError::StudyCorrupted {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
            info!(study = name, trials = study.trials.len(), "loaded study");
            return Ok(study);
        }

        let study = Study::new(name);
        self.save(&study)?;
        info!(study = name, "created study");
        Ok(study)
    }

    fn save(&self, study: &Study) -> PwResult<()> {
        let path = self.study_path(&study.name);
        let raw = serde_json::to_string_pretty(study)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}
