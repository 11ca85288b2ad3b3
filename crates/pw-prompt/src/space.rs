//! Search-space construction and candidate realization.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use pw_types::FloatDistribution;

use crate::token::PromptToken;

/// Fixed parameter name for the conditioning-scale variant.
pub const CONDITIONING_SCALE_PARAM: &str = "conditioning_scale";

/// The tunable parameter space derived from a parsed prompt.
///
/// `default_params` maps each tunable parameter to its as-authored weight
/// (the seeded baseline); `distributions` assigns every tunable parameter
/// the invocation's shared suggestion range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSpace {
    pub tokens: Vec<PromptToken>,
    pub default_params: BTreeMap<String, f64>,
    pub distributions: BTreeMap<String, FloatDistribution>,
}

/// Select the tunable tokens and build their parameter space.
///
/// A token is tunable iff its weight differs from the neutral 1.0 and its
/// raw text is not in the exclusion set (exact, case-sensitive match).
pub fn build_prompt_space(
    tokens: Vec<PromptToken>,
    excluded: &HashSet<String>,
    distribution: FloatDistribution,
) -> PromptSpace {
    let mut default_params = BTreeMap::new();
    let mut distributions = BTreeMap::new();

    for token in &tokens {
        if token.weight == 1.0 || excluded.contains(&token.text) {
            continue;
        }
        let name = token.param_name();
        default_params.insert(name.clone(), token.weight);
        distributions.insert(name, distribution);
    }

    debug!(
        tunable = default_params.len(),
        total = tokens.len(),
        "built prompt search space"
    );

    PromptSpace {
        tokens,
        default_params,
        distributions,
    }
}

/// The fixed single-parameter space of the conditioning-scale variant,
/// independent of prompt content.
pub fn conditioning_space(
    neutral: f64,
    distribution: FloatDistribution,
) -> (BTreeMap<String, f64>, BTreeMap<String, FloatDistribution>) {
    let mut default_params = BTreeMap::new();
    let mut distributions = BTreeMap::new();
    default_params.insert(CONDITIONING_SCALE_PARAM.to_string(), neutral);
    distributions.insert(CONDITIONING_SCALE_PARAM.to_string(), distribution);
    (default_params, distributions)
}

/// Substitute proposed weights back into the token sequence and rejoin.
///
/// Tunable tokens take their proposed weight, non-tunable weighted tokens
/// keep their authored weight, neutral tokens pass through as bare text.
pub fn realize_prompt(tokens: &[PromptToken], proposed: &BTreeMap<String, f64>) -> String {
    tokens
        .iter()
        .map(|token| match proposed.get(&token.param_name()) {
            Some(weight) => format!("({}:{})", token.text, weight),
            None if token.weight != 1.0 => format!("({}:{})", token.text, token.weight),
            None => token.text.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_prompt_attention;
    use crate::token::tokens_from_spans;

    fn dist() -> FloatDistribution {
        FloatDistribution::new(0.5, 2.0).unwrap()
    }

    fn tokens(prompt: &str) -> Vec<PromptToken> {
        tokens_from_spans(parse_prompt_attention(prompt).unwrap())
    }

    #[test]
    fn neutral_tokens_are_not_tunable() {
        let space = build_prompt_space(tokens("a red car"), &HashSet::new(), dist());
        assert!(space.default_params.is_empty());
        assert!(space.distributions.is_empty());
    }

    #[test]
    fn weighted_token_becomes_parameter_with_authored_default() {
        let space = build_prompt_space(tokens("a (red:1.4) car"), &HashSet::new(), dist());
        assert_eq!(space.default_params.len(), 1);
        assert_eq!(space.default_params.get("1:red"), Some(&1.4));
        assert_eq!(space.distributions.get("1:red"), Some(&dist()));
    }

    #[test]
    fn excluded_keyword_is_removed_from_tunable_set() {
        let excluded: HashSet<String> = ["red".to_string()].into();
        let space = build_prompt_space(
            tokens("a (red:1.4) car with (fog:0.8)"),
            &excluded,
            dist(),
        );
        assert!(!space.default_params.contains_key("1:red"));
        assert_eq!(space.default_params.len(), 1);
        assert!(space.default_params.contains_key("3:fog"));
    }

    #[test]
    fn exclusion_is_case_sensitive() {
        let excluded: HashSet<String> = ["Red".to_string()].into();
        let space = build_prompt_space(tokens("a (red:1.4) car"), &excluded, dist());
        assert!(space.default_params.contains_key("1:red"));
    }

    #[test]
    fn repeated_text_disambiguated_by_index() {
        let space = build_prompt_space(
            tokens("(red:1.4) car next to a (red:0.8) sign"),
            &HashSet::new(),
            dist(),
        );
        assert_eq!(space.default_params.len(), 2);
        assert_eq!(space.default_params.get("0:red"), Some(&1.4));
        assert_eq!(space.default_params.get("2:red"), Some(&0.8));
    }

    #[test]
    fn realize_substitutes_proposed_weight() {
        let toks = tokens("a (red:1.4) car");
        let mut proposed = BTreeMap::new();
        proposed.insert("1:red".to_string(), 0.75);
        assert_eq!(realize_prompt(&toks, &proposed), "a (red:0.75) car");
    }

    #[test]
    fn realize_keeps_excluded_weighted_token_authored() {
        let toks = tokens("a (red:1.4) car");
        // "red" excluded: no proposal for it, authored weight preserved.
        assert_eq!(realize_prompt(&toks, &BTreeMap::new()), "a (red:1.4) car");
    }

    #[test]
    fn realize_unweighted_prompt_is_identity() {
        let toks = tokens("a red car");
        assert_eq!(realize_prompt(&toks, &BTreeMap::new()), "a red car");
    }

    #[test]
    fn conditioning_space_is_prompt_independent() {
        let (defaults, dists) = conditioning_space(1.0, dist());
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults.get(CONDITIONING_SCALE_PARAM), Some(&1.0));
        assert_eq!(dists.get(CONDITIONING_SCALE_PARAM), Some(&dist()));
    }
}
