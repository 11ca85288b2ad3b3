//! Cross-run prompt consistency guard.

use tracing::debug;

use pw_types::{ConsistencyError, PwResult};

use crate::study::Study;

/// User-attribute key the source prompt is stored under.
pub const PROMPT_ATTR: &str = "prompt";

/// Gate a resumed study against its stored source prompt.
///
/// Runs once per invocation, after load and before any ask. A study with
/// prior trials must match the current prompt byte-for-byte; a mismatch is
/// fatal and never auto-resolved, because the trial history was built
/// against that prompt's search space. An empty study adopts the current
/// prompt as its original.
pub fn guard_prompt_consistency(study: &mut Study, current_prompt: &str) -> PwResult<()> {
    if study.trials.is_empty() {
        study.set_user_attr(PROMPT_ATTR, current_prompt);
        debug!(study = %study.name, "stored original prompt");
        return Ok(());
    }

    let stored = study.user_attr(PROMPT_ATTR).unwrap_or_default();
    if stored != current_prompt {
        return Err(ConsistencyError::PromptChanged {
            stored: stored.to_string(),
            current: current_prompt.to_string(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::RandomSampler;
    use pw_types::FloatDistribution;
    use std::collections::BTreeMap;

    fn study_with_one_trial(prompt: &str) -> Study {
        let mut study = Study::new("test");
        guard_prompt_consistency(&mut study, prompt).unwrap();
        let mut dists = BTreeMap::new();
        dists.insert("1:red".to_string(), FloatDistribution::new(0.5, 2.0).unwrap());
        study
            .ask(&mut RandomSampler::seeded(1), &dists)
            .unwrap();
        study
    }

    #[test]
    fn empty_study_adopts_current_prompt() {
        let mut study = Study::new("test");
        guard_prompt_consistency(&mut study, "a (red:1.4) car").unwrap();
        assert_eq!(study.user_attr(PROMPT_ATTR), Some("a (red:1.4) car"));
    }

    #[test]
    fn unchanged_prompt_passes() {
        let mut study = study_with_one_trial("a (red:1.4) car");
        assert!(guard_prompt_consistency(&mut study, "a (red:1.4) car").is_ok());
    }

    #[test]
    fn any_changed_character_aborts() {
        let mut study = study_with_one_trial("a (red:1.4) car");
        assert!(guard_prompt_consistency(&mut study, "a (blue:1.4) car").is_err());
        assert!(guard_prompt_consistency(&mut study, "a (red:1.5) car").is_err());
        assert!(guard_prompt_consistency(&mut study, "a (red:1.4) car ").is_err());
    }

    #[test]
    fn mismatch_never_overwrites_stored_prompt() {
        let mut study = study_with_one_trial("a (red:1.4) car");
        let _ = guard_prompt_consistency(&mut study, "a (blue:1.4) car");
        assert_eq!(study.user_attr(PROMPT_ATTR), Some("a (red:1.4) car"));
    }
}
