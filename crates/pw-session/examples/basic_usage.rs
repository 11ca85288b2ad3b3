use std::collections::BTreeMap;

use pw_render::{FeedbackForm, FileSystemFeedback, RenderBackend, RenderRequest, RenderedImage};
use pw_session::*;
use pw_study::{JsonFileStore, RandomSampler, StudyStore};
use pw_types::{PwResult, RunConfig};

/// Stand-in renderer that emits a tiny placeholder image per unit.
struct StubRender;

impl RenderBackend for StubRender {
    fn render(&mut self, request: &RenderRequest) -> PwResult<Vec<RenderedImage>> {
        let images = request
            .units
            .iter()
            .map(|unit| RenderedImage {
                bytes: unit.prompt.as_bytes().to_vec(),
            })
            .collect();
        Ok(images)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("🎨 PromptWeave Basic Usage Example");

    let workdir = tempfile::tempdir()?;

    let config = RunConfig::new("a (red:1.4) sports car, ((dramatic)) lighting, fog")
        .with_batch_size(4)
        .with_bounds(0.5, 2.0)
        .with_storage_url(workdir.path().join("studies").to_string_lossy())
        .with_study_name("red-car-demo")
        .with_artifact_dir(workdir.path().join("artifact"))
        .with_excluded_keywords("fog")
        .with_seed(42);

    let store = JsonFileStore::open(&config.storage_url)?;
    let mut sampler = RandomSampler::seeded(config.base_seed);
    let mut render = StubRender;
    let mut feedback = FileSystemFeedback::new(&config.artifact_dir)?;

    // First iteration on a fresh study: trial 0 is the untouched prompt.
    let report = run_prompt_weight_iteration(
        &config,
        &store,
        &mut sampler,
        &mut render,
        &mut feedback,
    )?;

    println!(
        "Study {} produced {} candidates:",
        report.study_name,
        report.candidates.len()
    );
    for (number, candidate) in report.trial_numbers.iter().zip(&report.candidates) {
        if let RealizedCandidate::Prompt(prompt) = candidate {
            println!("  trial {number}: {prompt}");
        }
    }
    println!("Artifacts stored under {:?}", config.artifact_dir);

    // Score the batch the way an external feedback surface would, then
    // resume. Resuming reuses the study; no second baseline is seeded.
    let mut study = store.create_or_load(&report.study_name)?;
    for number in &report.trial_numbers {
        study.trials[*number as usize].value = Some(if *number == 0 { 0.0 } else { -1.0 });
    }
    store.save(&study)?;
    println!("Scored {} trials with {:?}", report.trial_numbers.len(), FeedbackForm::three_point().choices);

    let resumed = run_prompt_weight_iteration(
        &config,
        &store,
        &mut sampler,
        &mut render,
        &mut feedback,
    )?;
    println!(
        "Resumed iteration asked trials {:?}",
        resumed.trial_numbers
    );

    // The sibling variant tunes a single conditioning scale instead of
    // per-token weights.
    let scale_config = RunConfig::new("a watercolor lighthouse at dusk")
        .with_batch_size(3)
        .with_bounds(0.0, 2.0)
        .with_storage_url(workdir.path().join("studies").to_string_lossy())
        .with_study_name("lighthouse-scale-demo")
        .with_artifact_dir(workdir.path().join("artifact"))
        .with_seed(7);

    let scale_report = run_conditioning_scale_iteration(
        &scale_config,
        &store,
        &mut sampler,
        &mut render,
        &mut feedback,
    )?;
    let mut scales = BTreeMap::new();
    for (number, candidate) in scale_report.trial_numbers.iter().zip(&scale_report.candidates) {
        if let RealizedCandidate::Scale(scale) = candidate {
            scales.insert(*number, *scale);
        }
    }
    println!("Conditioning scales by trial: {scales:?}");

    println!("✅ Both variants ran end to end");
    Ok(())
}
