//! Sampler seam and built-in sampling strategies.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use pw_types::{FloatDistribution, PwResult};

use crate::study::Trial;

/// Whether the objective is minimized or maximized.
///
/// The default feedback form maps Good to -1 and Bad to 1, so the built-in
/// model sampler minimizes by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveDirection {
    Minimize,
    Maximize,
}

impl Default for ObjectiveDirection {
    fn default() -> Self {
        Self::Minimize
    }
}

/// The injected optimizer capability: propose one parameter set per call.
///
/// Implementations see the study's full trial history, including scored
/// trials, and may use it to bias later proposals. Proposals must stay
/// within the declared distributions; the study re-validates post hoc.
pub trait Sampler {
    fn sample(
        &mut self,
        distributions: &BTreeMap<String, FloatDistribution>,
        history: &[Trial],
    ) -> PwResult<BTreeMap<String, f64>>;

    /// Human-readable sampler name.
    fn name(&self) -> &str;
}

// ---- Random sampling ----

/// Independent uniform sampling across the declared distributions.
#[derive(Debug)]
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RandomSampler {
    fn sample(
        &mut self,
        distributions: &BTreeMap<String, FloatDistribution>,
        _history: &[Trial],
    ) -> PwResult<BTreeMap<String, f64>> {
        Ok(distributions
            .iter()
            .map(|(name, dist)| (name.clone(), self.rng.gen_range(dist.low..=dist.high)))
            .collect())
    }

    fn name(&self) -> &str {
        "random"
    }
}

// ---- Model-based sampling ----

/// Sequential model-based sampling over scored history.
///
/// Tracks the best scored trial and perturbs it jointly across all
/// parameters, exploring uniformly with probability `exploration_weight`
/// or while no scored trials exist. Scoring happens out of band, so early
/// invocations behave like random search and sharpen as feedback arrives.
#[derive(Debug)]
pub struct ModelSampler {
    exploration_weight: f64,
    direction: ObjectiveDirection,
    rng: StdRng,
}

impl ModelSampler {
    pub fn new(exploration_weight: f64) -> Self {
        Self {
            exploration_weight,
            direction: ObjectiveDirection::default(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(exploration_weight: f64, seed: u64) -> Self {
        Self {
            exploration_weight,
            direction: ObjectiveDirection::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_direction(mut self, direction: ObjectiveDirection) -> Self {
        self.direction = direction;
        self
    }

    fn best_scored<'a>(&self, history: &'a [Trial]) -> Option<&'a Trial> {
        let scored = history.iter().filter(|t| t.value.is_some());
        match self.direction {
            ObjectiveDirection::Minimize => scored.min_by(|a, b| {
                a.value
                    .partial_cmp(&b.value)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            ObjectiveDirection::Maximize => scored.max_by(|a, b| {
                a.value
                    .partial_cmp(&b.value)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
        }
    }

    fn explore(
        &mut self,
        distributions: &BTreeMap<String, FloatDistribution>,
    ) -> BTreeMap<String, f64> {
        distributions
            .iter()
            .map(|(name, dist)| (name.clone(), self.rng.gen_range(dist.low..=dist.high)))
            .collect()
    }

    fn exploit(
        &mut self,
        distributions: &BTreeMap<String, FloatDistribution>,
        best: &Trial,
    ) -> BTreeMap<String, f64> {
        distributions
            .iter()
            .map(|(name, dist)| {
                let value = match best.params.get(name) {
                    Some(base) => {
                        let noise = self.rng.gen_range(-0.1..0.1) * (dist.high - dist.low);
                        (base + noise).clamp(dist.low, dist.high)
                    }
                    // History predates this parameter; sample it fresh.
                    None => self.rng.gen_range(dist.low..=dist.high),
                };
                (name.clone(), value)
            })
            .collect()
    }
}

impl Sampler for ModelSampler {
    fn sample(
        &mut self,
        distributions: &BTreeMap<String, FloatDistribution>,
        history: &[Trial],
    ) -> PwResult<BTreeMap<String, f64>> {
        let explore = self.rng.gen::<f64>() < self.exploration_weight;
        match self.best_scored(history) {
            Some(best) if !explore => {
                let best = best.clone();
                Ok(self.exploit(distributions, &best))
            }
            _ => Ok(self.explore(distributions)),
        }
    }

    fn name(&self) -> &str {
        "model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dists() -> BTreeMap<String, FloatDistribution> {
        let mut m = BTreeMap::new();
        m.insert(
            "0:red".to_string(),
            FloatDistribution::new(0.5, 2.0).unwrap(),
        );
        m.insert(
            "2:fog".to_string(),
            FloatDistribution::new(0.5, 2.0).unwrap(),
        );
        m
    }

    fn scored_trial(number: u64, weight: f64, value: f64) -> Trial {
        let mut params = BTreeMap::new();
        params.insert("0:red".to_string(), weight);
        params.insert("2:fog".to_string(), weight);
        Trial {
            number,
            params,
            created_at: Utc::now(),
            value: Some(value),
        }
    }

    #[test]
    fn random_sampler_stays_in_bounds() {
        let mut sampler = RandomSampler::seeded(42);
        for _ in 0..100 {
            let params = sampler.sample(&dists(), &[]).unwrap();
            assert_eq!(params.len(), 2);
            for v in params.values() {
                assert!((0.5..=2.0).contains(v));
            }
        }
    }

    #[test]
    fn seeded_random_sampler_is_deterministic() {
        let mut a = RandomSampler::seeded(42);
        let mut b = RandomSampler::seeded(42);
        assert_eq!(a.sample(&dists(), &[]).unwrap(), b.sample(&dists(), &[]).unwrap());
    }

    #[test]
    fn model_sampler_explores_without_scored_history() {
        let mut sampler = ModelSampler::seeded(0.0, 42);
        // No scored trials: falls back to uniform exploration.
        let params = sampler.sample(&dists(), &[]).unwrap();
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn model_sampler_perturbs_best_scored_trial() {
        // exploration_weight 0: always exploit once something is scored.
        let mut sampler = ModelSampler::seeded(0.0, 42);
        let history = vec![
            scored_trial(0, 1.0, 0.0),
            scored_trial(1, 1.8, 1.0), // worse under Minimize
            scored_trial(2, 0.9, -1.0), // best under Minimize
        ];

        for _ in 0..50 {
            let params = sampler.sample(&dists(), &history).unwrap();
            for v in params.values() {
                // Perturbation is at most 10% of the range around the best
                // point, then clamped.
                assert!((0.9 - 0.15..=0.9 + 0.15).contains(v), "far from best: {v}");
            }
        }
    }

    #[test]
    fn model_sampler_maximize_picks_highest() {
        let mut sampler =
            ModelSampler::seeded(0.0, 42).with_direction(ObjectiveDirection::Maximize);
        let history = vec![scored_trial(0, 0.6, -1.0), scored_trial(1, 1.9, 1.0)];
        let params = sampler.sample(&dists(), &history).unwrap();
        for v in params.values() {
            assert!(*v > 1.7, "expected perturbation near 1.9, got {v}");
        }
    }
}
