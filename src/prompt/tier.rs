//! Model tier inference from model identifiers.
//!
//! Small models need verbose prompts with examples; large models do better
//! with a minimal specification. The tier is inferred from the parameter-size
//! token that most model identifiers carry (`qwen3:1.7b`, `llama3:70b`,
//! `Meta-Llama-3.1-8B-Instruct`).

use std::fmt;

use serde::Serialize;

/// Prompt verbosity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Small,
    Medium,
    Large,
}

/// Upper bounds (in billions of parameters) checked in order.
const TIER_RULES: &[(f64, ModelTier)] = &[
    (2.0, ModelTier::Small),
    (30.0, ModelTier::Medium),
];

/// Characters separating tokens in a model identifier.
const TOKEN_SEPARATORS: &[char] = &[':', '/', '-', '_', '@', ' ', '\t'];

impl ModelTier {
    /// Infer the tier from a model identifier.
    ///
    /// Identifiers without a size token, or with conflicting size tokens,
    /// classify as [`ModelTier::Medium`].
    pub fn classify(model_id: &str) -> Self {
        match parameter_billions(model_id) {
            Some(billions) => Self::for_billions(billions),
            None => ModelTier::Medium,
        }
    }

    /// Map a parameter count in billions to a tier.
    pub fn for_billions(billions: f64) -> Self {
        TIER_RULES
            .iter()
            .find(|(limit, tier)| match tier {
                ModelTier::Small => billions <= *limit,
                _ => billions < *limit,
            })
            .map(|(_, tier)| *tier)
            .unwrap_or(ModelTier::Large)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Small => "small",
            ModelTier::Medium => "medium",
            ModelTier::Large => "large",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extract the parameter count in billions, if exactly one size is named.
pub fn parameter_billions(model_id: &str) -> Option<f64> {
    let mut found: Option<f64> = None;
    for token in model_id.split(TOKEN_SEPARATORS) {
        let Some(size) = parse_size_token(token) else {
            continue;
        };
        match found {
            Some(prev) if (prev - size).abs() > f64::EPSILON => return None,
            _ => found = Some(size),
        }
    }
    found
}

/// Parse tokens like `7b`, `1.7B` or `135m`.
fn parse_size_token(token: &str) -> Option<f64> {
    let token = token.trim();
    let (number, scale) = match token.char_indices().last()? {
        (idx, 'b' | 'B') => (&token[..idx], 1.0),
        (idx, 'm' | 'M') => (&token[..idx], 0.001),
        _ => return None,
    };
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if !number.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let value: f64 = number.parse().ok()?;
    (value > 0.0).then_some(value * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_examples() {
        assert_eq!(ModelTier::classify("qwen2.5:3b"), ModelTier::Medium);
        assert_eq!(ModelTier::classify("llama3:70b"), ModelTier::Large);
        assert_eq!(ModelTier::classify("tinymodel:1.7b"), ModelTier::Small);
        assert_eq!(ModelTier::classify("unknown-model"), ModelTier::Medium);
    }

    #[test]
    fn test_classify_provider_style_ids() {
        assert_eq!(ModelTier::classify("google/gemini-flash-1.5-8b"), ModelTier::Medium);
        assert_eq!(
            ModelTier::classify("qwen/qwen-2.5-coder-32b-instruct:free"),
            ModelTier::Large
        );
        assert_eq!(ModelTier::classify("Meta-Llama-3.1-8B-Instruct"), ModelTier::Medium);
        assert_eq!(ModelTier::classify("qwen3:4b-instruct-q4_K_M"), ModelTier::Medium);
        assert_eq!(ModelTier::classify("smollm:135m"), ModelTier::Small);
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(ModelTier::for_billions(2.0), ModelTier::Small);
        assert_eq!(ModelTier::for_billions(3.0), ModelTier::Medium);
        assert_eq!(ModelTier::for_billions(10.0), ModelTier::Medium);
        assert_eq!(ModelTier::for_billions(30.0), ModelTier::Large);
        assert_eq!(ModelTier::for_billions(405.0), ModelTier::Large);
    }

    #[test]
    fn test_ambiguous_defaults_to_medium() {
        // Two different sizes named
        assert_eq!(ModelTier::classify("merge-1b-70b"), ModelTier::Medium);
        // Mixture-of-experts notation is not a plain size token
        assert_eq!(ModelTier::classify("mixtral-8x7b"), ModelTier::Medium);
        assert_eq!(ModelTier::classify(""), ModelTier::Medium);
        assert_eq!(ModelTier::classify("default"), ModelTier::Medium);
    }

    #[test]
    fn test_version_numbers_are_not_sizes() {
        assert_eq!(parameter_billions("qwen2.5"), None);
        assert_eq!(parameter_billions("gpt-4o"), None);
        assert_eq!(parameter_billions("claude-3.5-sonnet"), None);
    }

    #[test]
    fn test_classify_is_deterministic() {
        for id in ["qwen3:1.7b", "llama3:70b", "weird::id//", "phi3:mini"] {
            assert_eq!(ModelTier::classify(id), ModelTier::classify(id));
        }
    }
}
