use serde::{Deserialize, Serialize};

/// One parsed prompt span: position, text, and authored attention weight.
///
/// The index participates in the parameter identity because the same text
/// may recur at different positions or weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptToken {
    pub index: usize,
    pub text: String,
    pub weight: f64,
}

impl PromptToken {
    /// Stable parameter identity, `"{index}:{text}"`.
    pub fn param_name(&self) -> String {
        format!("{}:{}", self.index, self.text)
    }
}

/// Number the parsed spans into ordered tokens.
pub fn tokens_from_spans(spans: Vec<(String, f64)>) -> Vec<PromptToken> {
    spans
        .into_iter()
        .enumerate()
        .map(|(index, (text, weight))| PromptToken {
            index,
            text,
            weight,
        })
        .collect()
}
