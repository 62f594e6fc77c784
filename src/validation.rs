use crate::language::{self, LanguageTag};
use thiserror::Error;

pub const MIN_PROMPT_CHARS: usize = 3;
pub const MAX_PROMPT_CHARS: usize = 1000;

pub const SUPPORTED_LANGUAGES: &[LanguageTag] =
    &[LanguageTag::English, LanguageTag::Arabic, LanguageTag::Kurdish];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptRejection {
    #[error("Prompt must be at least {min} characters long (got {actual})")]
    TooShort { min: usize, actual: usize },
    #[error("Prompt must be at most {max} characters long (got {actual})")]
    TooLong { max: usize, actual: usize },
    #[error("Unsupported prompt language: {0}")]
    UnsupportedLanguage(LanguageTag),
}

/// Accepts a prompt whose trimmed length is within bounds and whose language is supported.
///
/// Returns the detected language so callers don't classify twice. The prompt itself is not
/// modified; trimming only applies to the length check.
pub fn validate_prompt(prompt: &str) -> Result<LanguageTag, PromptRejection> {
    let tag = language::classify(prompt);
    if !SUPPORTED_LANGUAGES.contains(&tag) {
        return Err(PromptRejection::UnsupportedLanguage(tag));
    }

    let length = prompt.trim().chars().count();
    if length < MIN_PROMPT_CHARS {
        return Err(PromptRejection::TooShort {
            min: MIN_PROMPT_CHARS,
            actual: length,
        });
    }
    if length > MAX_PROMPT_CHARS {
        return Err(PromptRejection::TooLong {
            max: MAX_PROMPT_CHARS,
            actual: length,
        });
    }

    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_prompt_mentions_minimum() {
        let err = validate_prompt("").unwrap_err();
        assert_eq!(err, PromptRejection::TooShort { min: 3, actual: 0 });
        assert!(err.to_string().contains("at least 3"));
    }

    #[test]
    fn whitespace_is_trimmed_before_counting() {
        assert!(validate_prompt("   ab   ").is_err());
        assert_eq!(validate_prompt("  abc  "), Ok(LanguageTag::English));
    }

    #[test]
    fn too_long_prompt_mentions_maximum() {
        let prompt = "a".repeat(1001);
        let err = validate_prompt(&prompt).unwrap_err();
        assert!(matches!(err, PromptRejection::TooLong { max: 1000, actual: 1001 }));
        assert!(err.to_string().contains("at most 1000"));
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert!(validate_prompt("abc").is_ok());
        assert!(validate_prompt(&"a".repeat(1000)).is_ok());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 400 two-byte characters: 800 bytes but well under the limit
        let prompt = "ج".repeat(400);
        assert_eq!(validate_prompt(&prompt), Ok(LanguageTag::Arabic));
    }

    #[test]
    fn arabic_prompt_is_accepted() {
        assert_eq!(validate_prompt("هذا اختبار"), Ok(LanguageTag::Arabic));
    }
}
