//! Canonical LLM provider keys.
//!
//! The upstream API reports the model as a free-text display name
//! (e.g. "DeepSeek Chat (DeepSeek)"). Follow-up requests need the
//! canonical key, so the display name is folded down via substring match.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical provider key accepted by the follow-up endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Deepseek,
    Claude,
    Openai,
    Olmo,
}

impl Default for LlmProvider {
    fn default() -> Self {
        Self::Deepseek
    }
}

impl LlmProvider {
    /// Map a free-text display name to a canonical key.
    ///
    /// Case-insensitive substring match, checked in a fixed order so a
    /// name mentioning several providers resolves deterministically.
    /// Unrecognized names default to `deepseek`. Idempotent: feeding a
    /// canonical key back in yields the same key.
    pub fn from_display_name(name: &str) -> Self {
        let lower = name.to_lowercase();

        if lower.contains("deepseek") {
            Self::Deepseek
        } else if lower.contains("claude") || lower.contains("anthropic") {
            Self::Claude
        } else if lower.contains("openai") || lower.contains("gpt") {
            Self::Openai
        } else if lower.contains("olmo") || lower.contains("openrouter") {
            Self::Olmo
        } else {
            Self::default()
        }
    }

    /// The canonical key sent on the wire
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::Deepseek => "deepseek",
            Self::Claude => "claude",
            Self::Openai => "openai",
            Self::Olmo => "olmo",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_mapping() {
        assert_eq!(
            LlmProvider::from_display_name("DeepSeek Chat (DeepSeek)"),
            LlmProvider::Deepseek
        );
        assert_eq!(
            LlmProvider::from_display_name("Claude 3.5 Sonnet (Anthropic)"),
            LlmProvider::Claude
        );
        assert_eq!(
            LlmProvider::from_display_name("GPT-4o"),
            LlmProvider::Openai
        );
        assert_eq!(
            LlmProvider::from_display_name("OLMo 2 via OpenRouter"),
            LlmProvider::Olmo
        );
    }

    #[test]
    fn test_unknown_defaults_to_deepseek() {
        assert_eq!(
            LlmProvider::from_display_name("Mystery Model 9000"),
            LlmProvider::Deepseek
        );
        assert_eq!(LlmProvider::from_display_name(""), LlmProvider::Deepseek);
    }

    #[test]
    fn test_canonical_keys_are_idempotent() {
        for provider in [
            LlmProvider::Deepseek,
            LlmProvider::Claude,
            LlmProvider::Openai,
            LlmProvider::Olmo,
        ] {
            assert_eq!(LlmProvider::from_display_name(provider.as_key()), provider);
        }
    }

    #[test]
    fn test_serde_uses_lowercase_keys() {
        let json = serde_json::to_string(&LlmProvider::Claude).unwrap();
        assert_eq!(json, "\"claude\"");

        let parsed: LlmProvider = serde_json::from_str("\"olmo\"").unwrap();
        assert_eq!(parsed, LlmProvider::Olmo);
    }
}
