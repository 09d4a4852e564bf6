//! Question language routing
//!
//! Only two answer languages exist. Anything detected as French is French,
//! any other detected language is answered in English, and text whose
//! language cannot be detected falls back to French.
//!
//! Detection is restricted to the languages employees actually write in.
//! Short questions otherwise score closest to Latin, Turkish or Finnish.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;
use whatlang::{Detector, Lang};

/// Languages the detector may answer with
pub const CANDIDATE_LANGUAGES: [Lang; 7] = [
    Lang::Fra,
    Lang::Eng,
    Lang::Deu,
    Lang::Spa,
    Lang::Ita,
    Lang::Por,
    Lang::Nld,
];

static DETECTOR: LazyLock<Detector> =
    LazyLock::new(|| Detector::with_allowlist(CANDIDATE_LANGUAGES.to_vec()));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    French,
    English,
}

impl Language {
    #[inline]
    pub fn detect(text: &str) -> Self {
        let detected = DETECTOR.detect_lang(text);
        let language = Self::from_detected(detected);
        debug!("Detected {:?} for question, answering in {}", detected, language);
        language
    }

    /// Map a detector result onto an answer language.
    #[inline]
    pub fn from_detected(detected: Option<Lang>) -> Self {
        match detected {
            Some(Lang::Fra) | None => Self::French,
            Some(_) => Self::English,
        }
    }

    /// ISO 639-1 code
    #[inline]
    pub fn code(self) -> &'static str {
        match self {
            Self::French => "fr",
            Self::English => "en",
        }
    }
}

impl fmt::Display for Language {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
