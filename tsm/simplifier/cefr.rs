use std::{collections::HashMap, fmt, fs, path::Path, str::FromStr};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common European Framework vocabulary level, easiest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    /// Breakthrough.
    A1,
    /// Waystage.
    A2,
    /// Threshold.
    B1,
    /// Vantage.
    B2,
    /// Effective operational proficiency.
    C1,
    /// Mastery.
    C2,
}

/// Input that is not one of `A1`..`C2`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown CEFR level: {0}")]
pub struct ParseCefrError(String);

impl CefrLevel {
    /// Level implied by a Zipf word frequency (log10 per billion words).
    #[must_use]
    pub fn from_zipf(zipf: f64) -> Self {
        if zipf > 6.0 {
            Self::A1
        } else if zipf > 5.0 {
            Self::A2
        } else if zipf > 4.5 {
            Self::B1
        } else if zipf > 4.0 {
            Self::B2
        } else if zipf > 3.5 {
            Self::C1
        } else {
            Self::C2
        }
    }

    /// Label such as `"B2"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CefrLevel {
    type Err = ParseCefrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "B1" => Ok(Self::B1),
            "B2" => Ok(Self::B2),
            "C1" => Ok(Self::C1),
            "C2" => Ok(Self::C2),
            _ => Err(ParseCefrError(s.to_string())),
        }
    }
}

/// Whether a word is harder than the reader's level. Unknown levels are never
/// difficult.
#[must_use]
pub fn is_difficult(word: Option<CefrLevel>, user: Option<CefrLevel>) -> bool {
    matches!((word, user), (Some(word), Some(user)) if word > user)
}

/// Assigns vocabulary levels to words.
pub trait DifficultyClassifier: Send + Sync {
    /// Level of `word`, `None` when it cannot be rated.
    fn level(&self, word: &str) -> Option<CefrLevel>;
}

/// Classifier backed by a Zipf frequency table.
#[derive(Debug, Clone, Default)]
pub struct ZipfDifficultyClassifier {
    frequencies: HashMap<String, f64>,
}

#[derive(Deserialize)]
struct FrequencyFile {
    frequencies: HashMap<String, f64>,
}

impl ZipfDifficultyClassifier {
    /// Loads `{"frequencies": {"word": zipf, ...}}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading frequency table {}", path.display()))?;
        let file: FrequencyFile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing frequency table {}", path.display()))?;
        Ok(Self::from_map(file.frequencies))
    }

    /// Builds from an in-memory table; keys are lowercased.
    #[must_use]
    pub fn from_map(frequencies: HashMap<String, f64>) -> Self {
        Self {
            frequencies: frequencies
                .into_iter()
                .map(|(word, zipf)| (word.to_lowercase(), zipf))
                .collect(),
        }
    }

    /// Number of known words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

impl DifficultyClassifier for ZipfDifficultyClassifier {
    fn level(&self, word: &str) -> Option<CefrLevel> {
        let zipf = self
            .frequencies
            .get(&word.to_lowercase())
            .copied()
            .unwrap_or(0.0);
        Some(CefrLevel::from_zipf(zipf))
    }
}

/// Classifier that rates nothing; every token gets no level.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnratedClassifier;

impl DifficultyClassifier for UnratedClassifier {
    fn level(&self, _word: &str) -> Option<CefrLevel> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn zipf_thresholds_are_exclusive() {
        assert_eq!(CefrLevel::from_zipf(7.3), CefrLevel::A1);
        assert_eq!(CefrLevel::from_zipf(6.0), CefrLevel::A2);
        assert_eq!(CefrLevel::from_zipf(5.2), CefrLevel::A2);
        assert_eq!(CefrLevel::from_zipf(4.6), CefrLevel::B1);
        assert_eq!(CefrLevel::from_zipf(4.5), CefrLevel::B2);
        assert_eq!(CefrLevel::from_zipf(3.9), CefrLevel::C1);
        assert_eq!(CefrLevel::from_zipf(3.5), CefrLevel::C2);
        assert_eq!(CefrLevel::from_zipf(0.0), CefrLevel::C2);
    }

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!("b2".parse::<CefrLevel>(), Ok(CefrLevel::B2));
        assert_eq!(" C1 ".parse::<CefrLevel>(), Ok(CefrLevel::C1));
        assert!("D1".parse::<CefrLevel>().is_err());
        assert_eq!(CefrLevel::B1.to_string(), "B1");
    }

    #[test]
    fn difficulty_is_strictly_harder() {
        assert!(is_difficult(Some(CefrLevel::C1), Some(CefrLevel::B2)));
        assert!(!is_difficult(Some(CefrLevel::B2), Some(CefrLevel::B2)));
        assert!(!is_difficult(Some(CefrLevel::C2), None));
        assert!(!is_difficult(None, Some(CefrLevel::A1)));
    }

    #[test]
    fn loads_frequency_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("freq.json");
        fs::write(
            &path,
            r#"{"frequencies": {"The": 7.7, "court": 5.1, "estoppel": 2.4}}"#,
        )
        .unwrap();
        let classifier = ZipfDifficultyClassifier::load(&path).unwrap();
        assert_eq!(classifier.len(), 3);
        assert_eq!(classifier.level("the"), Some(CefrLevel::A1));
        assert_eq!(classifier.level("Court"), Some(CefrLevel::A2));
        assert_eq!(classifier.level("estoppel"), Some(CefrLevel::C2));
        assert_eq!(classifier.level("unlisted"), Some(CefrLevel::C2));
        assert_eq!(UnratedClassifier.level("the"), None);
    }

    #[test]
    fn malformed_table_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("freq.json");
        fs::write(&path, "[1, 2]").unwrap();
        let err = ZipfDifficultyClassifier::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("freq.json"));
    }
}
