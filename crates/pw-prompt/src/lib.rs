//! # pw-prompt
//!
//! Prompt-to-parameter-space translation for PromptWeave.
//!
//! Parses emphasis markup into weighted spans, selects the tunable spans,
//! and realizes optimizer proposals back into concrete prompt strings.

pub mod parser;
pub mod space;
pub mod token;

pub use parser::parse_prompt_attention;
pub use space::{
    build_prompt_space, conditioning_space, realize_prompt, PromptSpace,
    CONDITIONING_SCALE_PARAM,
};
pub use token::{tokens_from_spans, PromptToken};
