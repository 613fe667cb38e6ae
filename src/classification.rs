use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The remote model that processes an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelChoice {
    #[default]
    #[serde(rename = "Cat vs Dog")]
    CatVsDog,
    #[serde(rename = "Bear Classifier")]
    BearClassifier,
}

impl ModelChoice {
    pub const ALL: [ModelChoice; 2] = [ModelChoice::CatVsDog, ModelChoice::BearClassifier];

    /// Value the inference service expects for its model parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::CatVsDog => "Cat vs Dog",
            ModelChoice::BearClassifier => "Bear Classifier",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelChoice::ALL
            .into_iter()
            .find(|choice| choice.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "{} is not a supported model. Use either `Cat vs Dog` or `Bear Classifier`.",
                    s
                )
            })
    }
}

impl TryFrom<String> for ModelChoice {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub label: String,
    pub confidence: f64,
}

/// Label plus confidences ranked best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    pub confidences: Vec<Confidence>,
}

impl ClassificationResult {
    pub fn best(&self) -> Option<&Confidence> {
        self.confidences.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

#[derive(Error, Debug)]
#[error("Unsupported image data ({0} bytes)")]
pub struct UnsupportedImage(pub usize);

/// Image bytes as the workflow carries them, whether uploaded or loaded from an example.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub bytes: Bytes,
    pub file_name: String,
    pub content_type: String,
}

impl ImageFile {
    pub fn new(bytes: Bytes, file_name: &str, content_type: &str) -> Self {
        Self {
            bytes,
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
        }
    }

    /// Accepts only bytes that sniff as a known image format.
    pub fn from_upload(bytes: Bytes) -> Result<Self, UnsupportedImage> {
        let format = image::guess_format(&bytes).map_err(|_| UnsupportedImage(bytes.len()))?;
        let extension = format.extensions_str().first().copied().unwrap_or("img");

        Ok(Self {
            file_name: format!("upload.{}", extension),
            content_type: format.to_mime_type().to_string(),
            bytes,
        })
    }
}
