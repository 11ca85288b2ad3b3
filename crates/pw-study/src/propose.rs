//! Baseline-seeded trial proposal loop.

use std::collections::BTreeMap;

use tracing::{info, warn};

use pw_types::{FloatDistribution, PwResult};

use crate::sampler::Sampler;
use crate::store::StudyStore;
use crate::study::Study;

/// A realized (trial, concrete value) pair. Exists only for one batch.
///
/// `R` is the candidate's concrete form: a realized prompt string for the
/// prompt-weight variant, a bare scale for the conditioning-scale variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<R> {
    pub trial_number: u64,
    pub realization: R,
}

/// Ask trials until the batch quota is met, realizing each into a candidate.
///
/// A fresh study is first seeded with the default parameter set as an
/// exact-valued trial, so trial 0 is always the neutral baseline and the
/// baseline candidate is emitted first. Asking is unconditional and never
/// waits for prior trials to be scored; the study is persisted after every
/// ask so asked-but-unscored trials survive a later render failure.
///
/// With an empty tunable space there is nothing to explore: a fresh study
/// yields exactly the baseline regardless of batch size, a resumed one
/// yields no candidates.
pub fn propose_batch<R, F>(
    study: &mut Study,
    store: &dyn StudyStore,
    sampler: &mut dyn Sampler,
    distributions: &BTreeMap<String, FloatDistribution>,
    default_params: &BTreeMap<String, f64>,
    batch_size: u32,
    baseline: R,
    mut realize: F,
) -> PwResult<Vec<Candidate<R>>>
where
    F: FnMut(&BTreeMap<String, f64>) -> R,
{
    let mut candidates = Vec::with_capacity(batch_size as usize);

    if study.trials.is_empty() {
        // Try the default weights first as a baseline.
        study.enqueue_exact(default_params.clone());
        let trial = study.ask(sampler, distributions)?;
        store.save(study)?;
        info!(trial = trial.number, "seeded baseline trial");
        candidates.push(Candidate {
            trial_number: trial.number,
            realization: baseline,
        });
    }

    if distributions.is_empty() {
        if (candidates.len() as u32) < batch_size {
            warn!("no tunable parameters; skipping exploratory trials");
        }
        return Ok(candidates);
    }

    while (candidates.len() as u32) < batch_size {
        let trial = study.ask(sampler, distributions)?;
        store.save(study)?;
        let realization = realize(&trial.params);
        candidates.push(Candidate {
            trial_number: trial.number,
            realization,
        });
    }

    Ok(candidates)
}
