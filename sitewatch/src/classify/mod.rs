//! Construction phase classification.
//!
//! Deciding what a composite shows is delegated to a vision model behind the
//! [`Classifier`] trait. [`HttpClassifier`] talks to an OpenAI-compatible
//! chat completions endpoint; tests and offline runs can supply their own.

mod http;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::{
    ClassifierConfig, HttpClassifier, DEFAULT_CLASSIFIER_ENDPOINT, DEFAULT_CLASSIFIER_MODEL,
};

/// Construction phase of the building at the centre of a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConstructionPhase {
    Groundworks,
    Construction,
    Complete,
}

impl ConstructionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstructionPhase::Groundworks => "GROUNDWORKS",
            ConstructionPhase::Construction => "CONSTRUCTION",
            ConstructionPhase::Complete => "COMPLETE",
        }
    }

    /// Phases that count as unfinished work.
    pub fn is_in_progress(&self) -> bool {
        !matches!(self, ConstructionPhase::Complete)
    }
}

impl fmt::Display for ConstructionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConstructionPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GROUNDWORKS" => Ok(ConstructionPhase::Groundworks),
            "CONSTRUCTION" => Ok(ConstructionPhase::Construction),
            "COMPLETE" => Ok(ConstructionPhase::Complete),
            other => Err(format!("unknown construction phase '{}'", other)),
        }
    }
}

/// Result of classifying one composite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub phase: ConstructionPhase,
    /// 0 to 100.
    pub confidence: u8,
    pub reasoning: String,
}

impl Classification {
    /// Builds a classification, clamping `confidence` into 0..=100.
    pub fn new(phase: ConstructionPhase, confidence: i64, reasoning: impl Into<String>) -> Self {
        Self {
            phase,
            confidence: confidence.clamp(0, 100) as u8,
            reasoning: reasoning.into(),
        }
    }
}

/// Errors from a classification call.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("classifier API key is not configured")]
    MissingApiKey,

    #[error("classifier request failed: {0}")]
    Http(String),

    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected classifier response: {0}")]
    Response(String),
}

/// Assigns a construction phase to a composite image on disk.
pub trait Classifier {
    fn classify(&self, image_path: &Path) -> Result<Classification, ClassifyError>;
}

impl<T: Classifier + ?Sized> Classifier for &T {
    fn classify(&self, image_path: &Path) -> Result<Classification, ClassifyError> {
        (**self).classify(image_path)
    }
}

impl<T: Classifier + ?Sized> Classifier for Box<T> {
    fn classify(&self, image_path: &Path) -> Result<Classification, ClassifyError> {
        (**self).classify(image_path)
    }
}
