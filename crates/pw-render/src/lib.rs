//! # pw-render
//!
//! External collaborator seams for PromptWeave: the batch render function
//! and the human feedback surface, plus the candidate-to-artifact
//! bookkeeping between them.

pub mod artifacts;
pub mod feedback;
pub mod render;

pub use artifacts::stage_and_upload;
pub use feedback::{FeedbackForm, FeedbackSurface, FileSystemFeedback};
pub use render::{RenderBackend, RenderRequest, RenderUnit, RenderedImage};
