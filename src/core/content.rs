//! Letter Content Loading
//!
//! Letter records, the sources they come from, and a small per-letter cache.
//! A letter that cannot be fetched or parsed is replaced by a built-in
//! fallback so the page always has something to render.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error! status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Embedded source has no document of this type")]
    NotEmbedded,
}

pub type Result<T> = std::result::Result<T, ContentError>;

// ============================================================================
// Sources
// ============================================================================

/// Where a JSON document is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Compiled into the binary.
    Embedded,
    File(PathBuf),
    Url(Url),
}

impl FromStr for ContentSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("embedded") {
            return Ok(ContentSource::Embedded);
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            if let Ok(url) = Url::parse(s) {
                return Ok(ContentSource::Url(url));
            }
        }
        Ok(ContentSource::File(PathBuf::from(s)))
    }
}

impl fmt::Display for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSource::Embedded => f.write_str("embedded"),
            ContentSource::File(path) => write!(f, "{}", path.display()),
            ContentSource::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Fetch and decode a single static JSON document.
pub async fn fetch_json<T: DeserializeOwned>(source: &ContentSource) -> Result<T> {
    let body = match source {
        ContentSource::Embedded => return Err(ContentError::NotEmbedded),
        ContentSource::File(path) => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ContentError::Io {
                    path: path.clone(),
                    source,
                })?
        }
        ContentSource::Url(url) => {
            let response = reqwest::get(url.clone()).await?;
            if !response.status().is_success() {
                return Err(ContentError::Status(response.status()));
            }
            response.text().await?
        }
    };
    Ok(serde_json::from_str(&body)?)
}

// ============================================================================
// Letter Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterData {
    pub metadata: LetterMetadata,
    pub content: LetterContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterMetadata {
    pub sender: Sender,
    pub recipient: String,
    pub date: LetterDate,
    pub delivery_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sender {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterDate {
    /// Machine-readable value for the `datetime` attribute.
    pub datetime: String,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
    pub paragraphs: Vec<Paragraph>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postscript: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: String,
    /// Structural class such as `narrative` or `mechanical`.
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    #[serde(default)]
    pub title: String,
}

const EMBEDDED_LETTER: &str = include_str!("../../data/vellynne-letter.json");

impl LetterData {
    /// The sample letter compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Ok(serde_json::from_str(EMBEDDED_LETTER)?)
    }
}

/// Letter used when the configured source cannot be loaded.
pub fn fallback_letter() -> LetterData {
    LetterData {
        metadata: LetterMetadata {
            sender: Sender {
                title: "Correspondence from Vellynne Harpell".to_string(),
                subtitle: "Tenth Black Staff of Blackstaff Academy".to_string(),
            },
            recipient: "Rothbart".to_string(),
            date: LetterDate {
                datetime: "1489".to_string(),
                display: "1489 DR, Hammer (Second Tenday)".to_string(),
            },
            delivery_method: "Delivered by snowy owl familiar".to_string(),
        },
        content: LetterContent {
            greeting: Some("Dear Rothbart,".to_string()),
            paragraphs: vec![
                Paragraph {
                    id: "1".to_string(),
                    kind: "body".to_string(),
                    text: "I trust this missive finds you well-rested after your eventful journey. \
                           Word travels quickly through the Ten Towns, and your party's heroic \
                           efforts have not gone unnoticed."
                        .to_string(),
                },
                Paragraph {
                    id: "2".to_string(),
                    kind: "body".to_string(),
                    text: "The magical theorist in me is absolutely fascinated by your recent \
                           acquisitions. Such artifacts represent sophisticated enchantment work \
                           from ages past."
                        .to_string(),
                },
            ],
            closing: Some("With anticipation of our collaboration,".to_string()),
            signature: Some(Signature {
                name: "Vellynne Harpell".to_string(),
                title: "Tenth Black Staff of Blackstaff Academy".to_string(),
            }),
            postscript: Some("I look forward to our continued adventures together.".to_string()),
        },
    }
}

// ============================================================================
// Content Manager
// ============================================================================

/// Loads letters and remembers the ones that loaded successfully.
#[derive(Debug, Default)]
pub struct ContentManager {
    cache: HashMap<String, LetterData>,
    caching: bool,
}

impl ContentManager {
    pub fn new(caching: bool) -> Self {
        Self {
            cache: HashMap::new(),
            caching,
        }
    }

    /// Load a letter, never failing: errors are logged and the fallback
    /// letter is returned (and not cached).
    pub async fn load_letter(&mut self, letter_id: &str, source: &ContentSource) -> LetterData {
        if let Some(cached) = self.cache.get(letter_id) {
            log::debug!("Letter {letter_id} served from cache");
            return cached.clone();
        }

        match Self::fetch_letter(source).await {
            Ok(letter) => {
                log::info!("Loaded letter {letter_id} from {source}");
                if self.caching {
                    self.cache.insert(letter_id.to_string(), letter.clone());
                }
                letter
            }
            Err(e) => {
                log::error!("Failed to load letter: {letter_id} from {source}: {e}");
                fallback_letter()
            }
        }
    }

    async fn fetch_letter(source: &ContentSource) -> Result<LetterData> {
        match source {
            ContentSource::Embedded => LetterData::embedded(),
            other => fetch_json(other).await,
        }
    }

    pub fn is_cached(&self, letter_id: &str) -> bool {
        self.cache.contains_key(letter_id)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
