//! Language families and suffix classification

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A source language family, identified purely by file suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// `.c`
    C,
    /// `.cc`
    Cxx,
}

impl Language {
    /// Parse a configured language name
    pub fn from_name(name: &str) -> BuildResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "c" => Ok(Self::C),
            "c++" | "cxx" | "cpp" => Ok(Self::Cxx),
            _ => Err(BuildError::UnknownLanguage(name.to_string())),
        }
    }

    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cxx => "cc",
        }
    }

    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cxx => "c++",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The language families accepted by one build profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSet {
    languages: Vec<Language>,
}

impl LanguageSet {
    /// Create a set; duplicates are dropped, first occurrence wins
    pub fn new(languages: impl IntoIterator<Item = Language>) -> Self {
        let mut unique = Vec::new();
        for language in languages {
            if !unique.contains(&language) {
                unique.push(language);
            }
        }
        Self { languages: unique }
    }

    /// Parse configured names
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> BuildResult<Self> {
        let languages = names
            .iter()
            .map(|n| Language::from_name(n.as_ref()))
            .collect::<BuildResult<Vec<_>>>()?;
        Ok(Self::new(languages))
    }

    /// Both C and C++
    pub fn all() -> Self {
        Self::new([Language::C, Language::Cxx])
    }

    /// Accepted languages in configured order
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn contains(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }

    /// Classify a file name by its final extension
    pub fn classify(&self, file_name: &str) -> Option<Language> {
        let (_, extension) = file_name.rsplit_once('.')?;
        self.languages
            .iter()
            .copied()
            .find(|l| l.extension() == extension)
    }

    /// Strip the accepted language extension from a file name
    pub fn strip_extension<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        self.classify(file_name)
            .and_then(|_| file_name.rsplit_once('.'))
            .map(|(stem, _)| stem)
    }
}

impl Default for LanguageSet {
    fn default() -> Self {
        Self::all()
    }
}
