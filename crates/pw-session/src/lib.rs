//! # pw-session
//!
//! Per-invocation drivers for the two PromptWeave variants.
//!
//! Each driver runs one synchronous invocation end to end: translate the
//! prompt into a parameter space, gate the study against its stored prompt,
//! propose a baseline-seeded batch of trials, render the batch in one call,
//! and hand each image to the feedback surface bound to its trial.
//! Optimization converges only across separate invocations, as the human
//! scores images between runs.

use std::path::PathBuf;

use tracing::info;
use uuid::Uuid;

use pw_prompt::{
    build_prompt_space, conditioning_space, parse_prompt_attention, realize_prompt,
    tokens_from_spans, CONDITIONING_SCALE_PARAM,
};
use pw_render::{
    stage_and_upload, FeedbackForm, FeedbackSurface, RenderBackend, RenderRequest, RenderedImage,
};
use pw_study::{guard_prompt_consistency, propose_batch, Sampler, StudyId, StudyStore};
use pw_types::{PwResult, RunConfig};

/// Objective registered with the feedback surface on first use of a study.
pub const OBJECTIVE_NAME: &str = "Human Perception";

/// Neutral default for the conditioning-scale variant.
pub const CONDITIONING_NEUTRAL: f64 = 1.0;

/// A candidate's concrete form as reported back to the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum RealizedCandidate {
    Prompt(String),
    Scale(f64),
}

/// What one invocation asked, realized, and uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub study_id: StudyId,
    pub study_name: String,
    pub trial_numbers: Vec<u64>,
    pub candidates: Vec<RealizedCandidate>,
    pub artifact_paths: Vec<PathBuf>,
}

/// Run one prompt-weight iteration.
///
/// Parses the prompt's emphasis markup, treats every non-neutral,
/// non-excluded span weight as a tunable parameter, and produces one
/// rendered artifact per proposed candidate.
pub fn run_prompt_weight_iteration(
    config: &RunConfig,
    store: &dyn StudyStore,
    sampler: &mut dyn Sampler,
    render: &mut dyn RenderBackend,
    feedback: &mut dyn FeedbackSurface,
) -> PwResult<IterationReport> {
    config.validate()?;
    let distribution = config.distribution()?;

    let spans = parse_prompt_attention(&config.prompt)?;
    info!(prompt = %config.prompt, spans = spans.len(), "parsed prompt");
    let excluded = config.excluded_set();
    if !excluded.is_empty() {
        info!(?excluded, "keywords excluded from weight optimization");
    }
    let space = build_prompt_space(tokens_from_spans(spans), &excluded, distribution);

    let study_name = resolve_study_name(&config.study_name);
    let mut study = store.create_or_load(&study_name)?;

    if study.trials.is_empty() {
        feedback.register_objective_names(&study_name, &[OBJECTIVE_NAME.to_string()])?;
        feedback.register_feedback_form(&study_name, &FeedbackForm::three_point())?;
    }

    guard_prompt_consistency(&mut study, &config.prompt)?;
    store.save(&study)?;

    let tokens = &space.tokens;
    let original = config.prompt.clone();
    let candidates = propose_batch(
        &mut study,
        store,
        sampler,
        &space.distributions,
        &space.default_params,
        config.n_trials_per_iter,
        original.clone(),
        |params| {
            let realized = realize_prompt(tokens, params);
            info!("{original} --> {realized}");
            realized
        },
    )?;

    let prompts: Vec<String> = candidates.iter().map(|c| c.realization.clone()).collect();
    let request = RenderRequest::for_prompts(prompts.clone(), config.base_seed);
    info!(batch = request.units.len(), "rendering candidate batch");
    let images = render.render(&request)?;
    request.check_response(&images)?;

    let batch: Vec<(u64, RenderedImage)> = candidates
        .iter()
        .map(|c| c.trial_number)
        .zip(images)
        .collect();
    let artifact_paths = stage_and_upload(feedback, &study_name, &batch, &staging_dir(&study_name))?;

    Ok(IterationReport {
        study_id: study.id,
        study_name,
        trial_numbers: candidates.iter().map(|c| c.trial_number).collect(),
        candidates: prompts.into_iter().map(RealizedCandidate::Prompt).collect(),
        artifact_paths,
    })
}

/// Run one conditioning-scale iteration.
///
/// The sibling variant: a fixed single-parameter space over the auxiliary
/// conditioning strength, independent of prompt content. The prompt still
/// gates study consistency and is rendered unchanged; the request carries
/// `script_control` so the pipeline accepts the per-candidate scale.
pub fn run_conditioning_scale_iteration(
    config: &RunConfig,
    store: &dyn StudyStore,
    sampler: &mut dyn Sampler,
    render: &mut dyn RenderBackend,
    feedback: &mut dyn FeedbackSurface,
) -> PwResult<IterationReport> {
    config.validate()?;
    let distribution = config.distribution()?;
    let (default_params, distributions) = conditioning_space(CONDITIONING_NEUTRAL, distribution);

    let study_name = resolve_study_name(&config.study_name);
    let mut study = store.create_or_load(&study_name)?;

    if study.trials.is_empty() {
        feedback.register_objective_names(&study_name, &[OBJECTIVE_NAME.to_string()])?;
        feedback.register_feedback_form(&study_name, &FeedbackForm::three_point())?;
    }

    guard_prompt_consistency(&mut study, &config.prompt)?;
    store.save(&study)?;

    let candidates = propose_batch(
        &mut study,
        store,
        sampler,
        &distributions,
        &default_params,
        config.n_trials_per_iter,
        CONDITIONING_NEUTRAL,
        |params| params[CONDITIONING_SCALE_PARAM],
    )?;

    let scales: Vec<f64> = candidates.iter().map(|c| c.realization).collect();
    info!(?scales, "proposed conditioning scales");
    let request = RenderRequest::for_scales(&config.prompt, scales.clone(), config.base_seed);
    let images = render.render(&request)?;
    request.check_response(&images)?;

    let batch: Vec<(u64, RenderedImage)> = candidates
        .iter()
        .map(|c| c.trial_number)
        .zip(images)
        .collect();
    let artifact_paths = stage_and_upload(feedback, &study_name, &batch, &staging_dir(&study_name))?;

    Ok(IterationReport {
        study_id: study.id,
        study_name,
        trial_numbers: candidates.iter().map(|c| c.trial_number).collect(),
        candidates: scales.into_iter().map(RealizedCandidate::Scale).collect(),
        artifact_paths,
    })
}

/// An empty study name gets a generated default so the store always has a
/// concrete document name.
fn resolve_study_name(name: &str) -> String {
    if name.is_empty() {
        let id = Uuid::new_v4().simple().to_string();
        format!("study-{}", &id[..8])
    } else {
        name.to_string()
    }
}

/// Per-study staging directory for temporary artifact files, keyed by
/// trial number inside.
fn staging_dir(study_name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("promptweave-{study_name}"))
}
