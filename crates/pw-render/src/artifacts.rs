//! Candidate-to-artifact bookkeeping.

use std::path::{Path, PathBuf};

use tracing::info;

use pw_types::PwResult;

use crate::feedback::FeedbackSurface;
use crate::render::RenderedImage;

/// Persist each trial's image under a per-trial-number staging path, then
/// upload it to the feedback surface bound to that trial.
///
/// Called only after the whole batch rendered successfully, so a failed
/// render never leaves partial uploads. Staged files are not cleaned up;
/// the operator may want to inspect them after a failed upload.
pub fn stage_and_upload(
    feedback: &mut dyn FeedbackSurface,
    study_name: &str,
    batch: &[(u64, RenderedImage)],
    staging_dir: &Path,
) -> PwResult<Vec<PathBuf>> {
    std::fs::create_dir_all(staging_dir)?;

    let mut staged = Vec::with_capacity(batch.len());
    for (trial_number, image) in batch {
        let path = staging_dir.join(format!("{trial_number}.png"));
        std::fs::write(&path, &image.bytes)?;
        staged.push((*trial_number, path));
    }

    let mut stored = Vec::with_capacity(staged.len());
    for (trial_number, path) in &staged {
        stored.push(feedback.upload_artifact(study_name, *trial_number, path)?);
    }

    info!(study = study_name, count = stored.len(), "uploaded artifacts");
    Ok(stored)
}
