//! # pw-study
//!
//! Named, persistent studies and the trial proposal loop for PromptWeave.
//!
//! The optimizer is an injected capability behind the [`Sampler`] trait;
//! storage sits behind [`StudyStore`]. Built-in samplers cover independent
//! uniform sampling and best-point perturbation over scored history.

pub mod guard;
pub mod propose;
pub mod sampler;
pub mod store;
pub mod study;

pub use guard::{guard_prompt_consistency, PROMPT_ATTR};
pub use propose::{propose_batch, Candidate};
pub use sampler::{ModelSampler, ObjectiveDirection, RandomSampler, Sampler};
pub use store::{JsonFileStore, StudyStore};
pub use study::{Study, StudyId, Trial};
