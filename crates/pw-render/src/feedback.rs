//! Feedback surface seam and a file-system implementation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use pw_types::{BackendError, PwResult};

/// Feedback-form schema registered with the surface: a fixed choice scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackForm {
    pub choices: Vec<String>,
    pub values: Vec<i64>,
    pub description: String,
}

impl FeedbackForm {
    /// The standard 3-point human-perception scale.
    pub fn three_point() -> Self {
        Self {
            choices: vec![
                "Good 👍".to_string(),
                "So so 👋".to_string(),
                "Bad 👎".to_string(),
            ],
            values: vec![-1, 0, 1],
            description: "Choose Good 👍, So so 👋 or Bad 👎.".to_string(),
        }
    }
}

/// The external human-feedback surface. This system only registers
/// objective metadata and hands over artifacts; scoring happens there,
/// asynchronously, and ownership of an uploaded artifact transfers.
pub trait FeedbackSurface {
    fn register_objective_names(&mut self, study_name: &str, names: &[String]) -> PwResult<()>;

    fn register_feedback_form(&mut self, study_name: &str, form: &FeedbackForm) -> PwResult<()>;

    /// Upload a staged artifact bound to a trial; returns its stored
    /// location.
    fn upload_artifact(
        &mut self,
        study_name: &str,
        trial_number: u64,
        path: &Path,
    ) -> PwResult<PathBuf>;
}

/// File-system feedback backend rooted at the artifact directory.
///
/// Registrations are persisted as JSON documents per study; re-registering
/// with identical content is idempotent, conflicting content is an error.
#[derive(Debug)]
pub struct FileSystemFeedback {
    root: PathBuf,
}

impl FileSystemFeedback {
    pub fn new<P: AsRef<Path>>(root: P) -> PwResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn study_dir(&self, study_name: &str) -> PathBuf {
        self.root.join(study_name)
    }

    fn register_document<T>(&self, path: PathBuf, document: &T, what: &str) -> PwResult<()>
    where
        T: Serialize + PartialEq + for<'de> Deserialize<'de>,
    {
        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let existing: T = serde_json::from_str(&raw)?;
            if &existing != document {
                return Err(BackendError::SchemaConflict {
                    message: format!("{what} already registered with different values"),
                }
                .into());
            }
            debug!(path = %path.display(), "{what} already registered");
            return Ok(());
        }
        std::fs::write(&path, serde_json::to_string_pretty(document)?)?;
        Ok(())
    }
}

impl FeedbackSurface for FileSystemFeedback {
    fn register_objective_names(&mut self, study_name: &str, names: &[String]) -> PwResult<()> {
        let dir = self.study_dir(study_name);
        std::fs::create_dir_all(&dir)?;
        self.register_document(dir.join("objectives.json"), &names.to_vec(), "objectives")?;
        info!(study = study_name, ?names, "registered objective names");
        Ok(())
    }

    fn register_feedback_form(&mut self, study_name: &str, form: &FeedbackForm) -> PwResult<()> {
        let dir = self.study_dir(study_name);
        std::fs::create_dir_all(&dir)?;
        self.register_document(dir.join("form.json"), form, "feedback form")?;
        info!(study = study_name, "registered feedback form");
        Ok(())
    }

    fn upload_artifact(
        &mut self,
        study_name: &str,
        trial_number: u64,
        path: &Path,
    ) -> PwResult<PathBuf> {
        let dir = self.study_dir(study_name).join("artifacts");
        std::fs::create_dir_all(&dir)?;
        let stored = dir.join(format!("{trial_number}-{}.png", Uuid::new_v4()));
        std::fs::copy(path, &stored)?;
        debug!(trial = trial_number, stored = %stored.display(), "uploaded artifact");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_point_form_shape() {
        let form = FeedbackForm::three_point();
        assert_eq!(form.choices.len(), 3);
        assert_eq!(form.values, vec![-1, 0, 1]);
    }

    #[test]
    fn registration_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut surface = FileSystemFeedback::new(dir.path()).unwrap();

        let names = vec!["Human Perception".to_string()];
        surface.register_objective_names("cars", &names).unwrap();
        surface.register_objective_names("cars", &names).unwrap();

        let form = FeedbackForm::three_point();
        surface.register_feedback_form("cars", &form).unwrap();
        surface.register_feedback_form("cars", &form).unwrap();
    }

    #[test]
    fn conflicting_registration_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut surface = FileSystemFeedback::new(dir.path()).unwrap();

        surface
            .register_objective_names("cars", &["Human Perception".to_string()])
            .unwrap();
        let err = surface.register_objective_names("cars", &["Aesthetics".to_string()]);
        assert!(err.is_err());

        surface
            .register_feedback_form("cars", &FeedbackForm::three_point())
            .unwrap();
        let mut other = FeedbackForm::three_point();
        other.values = vec![1, 0, -1];
        assert!(surface.register_feedback_form("cars", &other).is_err());
    }

    #[test]
    fn upload_copies_into_study_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let mut surface = FileSystemFeedback::new(dir.path()).unwrap();

        let staged = dir.path().join("3.png");
        std::fs::write(&staged, b"fake image").unwrap();

        let stored = surface.upload_artifact("cars", 3, &staged).unwrap();
        assert!(stored.exists());
        assert!(stored.file_name().unwrap().to_str().unwrap().starts_with("3-"));
        assert_eq!(std::fs::read(&stored).unwrap(), b"fake image");
    }
}
