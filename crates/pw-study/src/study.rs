//! Study and trial tracking.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pw_types::{BackendError, FloatDistribution, PwResult};

use crate::sampler::Sampler;

/// Unique study identifier.
pub type StudyId = Uuid;

/// One proposed parameter assignment within a study.
///
/// Trials are created open by asking; the objective value is recorded out
/// of band by the human feedback surface and is never set by this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Monotonic number, unique within the study, assigned at ask time.
    pub number: u64,
    pub params: BTreeMap<String, f64>,
    pub created_at: DateTime<Utc>,
    pub value: Option<f64>,
}

/// A persistent, named optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub id: StudyId,
    pub name: String,
    pub created_at: DateTime<Utc>,

    /// User-attached attributes (e.g. the original prompt).
    pub user_attrs: BTreeMap<String, String>,

    /// Ordered trial history. Never rewritten or truncated.
    pub trials: Vec<Trial>,

    /// Exact parameter sets returned by the next asks, in queue order.
    pub queued: VecDeque<BTreeMap<String, f64>>,
}

impl Study {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            user_attrs: BTreeMap::new(),
            trials: Vec::new(),
            queued: VecDeque::new(),
        }
    }

    pub fn set_user_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.user_attrs.insert(key.into(), value.into());
    }

    pub fn user_attr(&self, key: &str) -> Option<&str> {
        self.user_attrs.get(key).map(String::as_str)
    }

    /// Pre-register an exact parameter set; the next ask returns it
    /// verbatim instead of sampling.
    pub fn enqueue_exact(&mut self, params: BTreeMap<String, f64>) {
        self.queued.push_back(params);
    }

    /// Ask for the next trial under a fixed distribution map.
    ///
    /// Enqueued exact sets are returned first and bypass the bound check
    /// (an authored baseline weight may sit outside the search bounds);
    /// sampled proposals must lie within their declared distribution.
    pub fn ask(
        &mut self,
        sampler: &mut dyn Sampler,
        distributions: &BTreeMap<String, FloatDistribution>,
    ) -> PwResult<Trial> {
        let params = match self.queued.pop_front() {
            Some(exact) => {
                check_shape(&exact, distributions)?;
                exact
            }
            None => {
                let sampled = sampler.sample(distributions, &self.trials)?;
                check_shape(&sampled, distributions)?;
                for (name, value) in &sampled {
                    let dist = &distributions[name];
                    if !dist.contains(*value) {
                        return Err(BackendError::SuggestionOutOfBounds {
                            name: name.clone(),
                            value: *value,
                            lower: dist.low,
                            upper: dist.high,
                        }
                        .into());
                    }
                }
                sampled
            }
        };

        let trial = Trial {
            number: self.trials.len() as u64,
            params,
            created_at: Utc::now(),
            value: None,
        };
        self.trials.push(trial.clone());
        Ok(trial)
    }
}

/// The parameter names of an ask must match the study's declared space
/// exactly, or the backend's replay/seeding would diverge from history.
fn check_shape(
    params: &BTreeMap<String, f64>,
    distributions: &BTreeMap<String, FloatDistribution>,
) -> PwResult<()> {
    let got: BTreeSet<&String> = params.keys().collect();
    let want: BTreeSet<&String> = distributions.keys().collect();
    if got != want {
        return Err(BackendError::ShapeMismatch {
            message: format!("expected parameters {want:?}, got {got:?}"),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::RandomSampler;

    fn dists() -> BTreeMap<String, FloatDistribution> {
        let mut m = BTreeMap::new();
        m.insert(
            "1:red".to_string(),
            FloatDistribution::new(0.5, 2.0).unwrap(),
        );
        m
    }

    #[test]
    fn enqueued_exact_values_returned_verbatim() {
        let mut study = Study::new("test");
        let mut sampler = RandomSampler::seeded(7);

        let mut exact = BTreeMap::new();
        // Authored weight outside the search bounds is still returned as-is.
        exact.insert("1:red".to_string(), 2.5);
        study.enqueue_exact(exact);

        let trial = study.ask(&mut sampler, &dists()).unwrap();
        assert_eq!(trial.number, 0);
        assert_eq!(trial.params.get("1:red"), Some(&2.5));
    }

    #[test]
    fn sampled_trials_respect_bounds() {
        let mut study = Study::new("test");
        let mut sampler = RandomSampler::seeded(7);

        for expected in 0..20u64 {
            let trial = study.ask(&mut sampler, &dists()).unwrap();
            assert_eq!(trial.number, expected);
            let v = trial.params["1:red"];
            assert!((0.5..=2.0).contains(&v), "out of bounds: {v}");
        }
        assert_eq!(study.trials.len(), 20);
    }

    #[test]
    fn enqueued_shape_mismatch_rejected() {
        let mut study = Study::new("test");
        let mut sampler = RandomSampler::seeded(7);

        let mut exact = BTreeMap::new();
        exact.insert("0:blue".to_string(), 1.0);
        study.enqueue_exact(exact);

        assert!(study.ask(&mut sampler, &dists()).is_err());
    }

    #[test]
    fn user_attrs_round_trip() {
        let mut study = Study::new("test");
        study.set_user_attr("prompt", "a (red:1.4) car");
        assert_eq!(study.user_attr("prompt"), Some("a (red:1.4) car"));
        assert_eq!(study.user_attr("missing"), None);
    }

    #[test]
    fn study_serialization_round_trip() {
        let mut study = Study::new("test");
        let mut sampler = RandomSampler::seeded(7);
        study.set_user_attr("prompt", "a (red:1.4) car");
        study.ask(&mut sampler, &dists()).unwrap();

        let json = serde_json::to_string(&study).unwrap();
        let back: Study = serde_json::from_str(&json).unwrap();
        assert_eq!(study, back);
    }
}
