//! Script-range and keyword heuristic for telling English, Arabic and Kurdish prompts apart.
//!
//! This is not a language identifier. Any Arabic-script character rules out English; after that
//! the decision is a count of common function words, and a tie goes to Arabic.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    English,
    Arabic,
    Kurdish,
}

impl LanguageTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageTag::English => "English",
            LanguageTag::Arabic => "Arabic",
            LanguageTag::Kurdish => "Kurdish",
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arabic, Arabic Supplement, Arabic Extended-A.
const ARABIC_SCRIPT_RANGES: &[(char, char)] = &[
    ('\u{0600}', '\u{06FF}'),
    ('\u{0750}', '\u{077F}'),
    ('\u{08A0}', '\u{08FF}'),
];

const ARABIC_KEYWORDS: &[&str] = &[
    "في", "من", "على", "إلى", "هذا", "هذه", "التي", "الذي", "عن", "مع", "كان", "أن",
];

// Sorani function words
const KURDISH_KEYWORDS: &[&str] = &[
    "لە", "بۆ", "ئەم", "ئەو", "کە", "لەگەڵ", "دەکات", "هەیە", "نییە", "بە",
];

pub fn is_arabic_script(c: char) -> bool {
    ARABIC_SCRIPT_RANGES
        .iter()
        .any(|&(start, end)| (start..=end).contains(&c))
}

fn keyword_hits(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().map(|word| text.matches(word).count()).sum()
}

pub fn classify(text: &str) -> LanguageTag {
    if !text.chars().any(is_arabic_script) {
        return LanguageTag::English;
    }

    let arabic = keyword_hits(text, ARABIC_KEYWORDS);
    let kurdish = keyword_hits(text, KURDISH_KEYWORDS);
    log::trace!("Keyword hits: arabic={} kurdish={}", arabic, kurdish);

    if kurdish > arabic {
        LanguageTag::Kurdish
    } else {
        LanguageTag::Arabic
    }
}
