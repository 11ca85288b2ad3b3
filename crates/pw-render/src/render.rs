//! Render seam: one blocking batch call, one image per candidate.

use serde::{Deserialize, Serialize};

use pw_types::{PwResult, RenderError};

/// One candidate's render input: its realized prompt, the auxiliary
/// conditioning scale when the variant tunes it, and its seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderUnit {
    pub prompt: String,
    pub conditioning_scale: Option<f64>,
    pub seed: u64,
}

/// A whole batch handed to the external render function in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub units: Vec<RenderUnit>,
    pub iteration_count: u32,

    /// Grants this invocation control over the pipeline's auxiliary
    /// conditioning input. Per-request, never a process-wide toggle.
    pub script_control: bool,
}

impl RenderRequest {
    /// Batch of realized prompts, every unit seeded with the same base
    /// seed so candidates differ only in their weights.
    pub fn for_prompts(prompts: Vec<String>, base_seed: u64) -> Self {
        let iteration_count = prompts.len() as u32;
        Self {
            units: prompts
                .into_iter()
                .map(|prompt| RenderUnit {
                    prompt,
                    conditioning_scale: None,
                    seed: base_seed,
                })
                .collect(),
            iteration_count,
            script_control: false,
        }
    }

    /// Batch of conditioning scales over one unchanged prompt.
    pub fn for_scales(prompt: &str, scales: Vec<f64>, base_seed: u64) -> Self {
        let iteration_count = scales.len() as u32;
        Self {
            units: scales
                .into_iter()
                .map(|scale| RenderUnit {
                    prompt: prompt.to_string(),
                    conditioning_scale: Some(scale),
                    seed: base_seed,
                })
                .collect(),
            iteration_count,
            script_control: true,
        }
    }

    /// A response must carry exactly one image per unit, in unit order.
    pub fn check_response(&self, images: &[RenderedImage]) -> PwResult<()> {
        if images.len() != self.units.len() {
            return Err(RenderError::BatchLengthMismatch {
                expected: self.units.len(),
                actual: images.len(),
            }
            .into());
        }
        Ok(())
    }
}

/// An opaque rendered image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
}

/// The external image-rendering pipeline, treated as an opaque blocking
/// batch function. Order-preserving: image `i` belongs to unit `i`.
pub trait RenderBackend {
    fn render(&mut self, request: &RenderRequest) -> PwResult<Vec<RenderedImage>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_batch_shares_the_base_seed() {
        let request = RenderRequest::for_prompts(
            vec!["a (red:1.4) car".to_string(), "a (red:0.8) car".to_string()],
            99,
        );
        assert_eq!(request.units.len(), 2);
        assert_eq!(request.iteration_count, 2);
        assert!(request.units.iter().all(|u| u.seed == 99));
        assert!(request.units.iter().all(|u| u.conditioning_scale.is_none()));
        assert!(!request.script_control);
    }

    #[test]
    fn scale_batch_keeps_prompt_unchanged() {
        let request = RenderRequest::for_scales("a red car", vec![1.0, 0.4], 7);
        assert!(request.script_control);
        assert!(request.units.iter().all(|u| u.prompt == "a red car"));
        assert_eq!(request.units[0].conditioning_scale, Some(1.0));
        assert_eq!(request.units[1].conditioning_scale, Some(0.4));
    }

    #[test]
    fn response_length_mismatch_rejected() {
        let request = RenderRequest::for_prompts(vec!["a".into(), "b".into()], 0);
        let one = vec![RenderedImage { bytes: vec![1] }];
        assert!(request.check_response(&one).is_err());

        let two = vec![
            RenderedImage { bytes: vec![1] },
            RenderedImage { bytes: vec![2] },
        ];
        assert!(request.check_response(&two).is_ok());
    }
}
