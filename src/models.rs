use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ScoutError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    De,
    En,
}

impl FromStr for Locale {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "de" | "de-de" | "german" => Ok(Locale::De),
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::En),
            other => Err(ScoutError::Validation(format!(
                "Unknown locale '{}'. Available: de, en",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SearchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStatus::Pending => "pending",
            SearchStatus::Processing => "processing",
            SearchStatus::Completed => "completed",
            SearchStatus::Failed => "failed",
        }
    }

    /// Completed and failed searches expect no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchStatus::Completed | SearchStatus::Failed)
    }

    pub fn label(&self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::De, SearchStatus::Pending) => "ausstehend",
            (Locale::De, SearchStatus::Processing) => "verarbeitung",
            (Locale::De, SearchStatus::Completed) => "abgeschlossen",
            (Locale::De, SearchStatus::Failed) => "fehlgeschlagen",
            (Locale::En, SearchStatus::Pending) => "pending",
            (Locale::En, SearchStatus::Processing) => "processing",
            (Locale::En, SearchStatus::Completed) => "completed",
            (Locale::En, SearchStatus::Failed) => "failed",
        }
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchStatus {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(SearchStatus::Pending),
            "processing" => Ok(SearchStatus::Processing),
            "completed" => Ok(SearchStatus::Completed),
            "failed" => Ok(SearchStatus::Failed),
            other => Err(ScoutError::InvalidStatus(other.to_string())),
        }
    }
}

/// A search as stored. Never mutated after it has been fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    pub id: i64,
    pub name: Option<String>,
    pub search_keywords: String,
    pub location: Option<String>,
    pub resume_last_updated_days: Option<u32>,
    pub target_candidates: Option<u32>,
    pub max_radius: Option<u32>,
    pub recipient_email: Option<String>,
    pub user_prompt: Option<String>,
    pub system_prompt: Option<String>,
    pub status: String, // kept raw; parsed when rendering
    pub results: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SearchRecord {
    /// Name if set, otherwise the keywords.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.search_keywords,
        }
    }

    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    pub fn parsed_status(&self) -> Result<SearchStatus> {
        self.status.parse()
    }
}

/// Fields collected for a new search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewSearch {
    pub name: Option<String>,
    pub search_keywords: String,
    pub location: Option<String>,
    pub resume_last_updated_days: Option<u32>,
    pub target_candidates: Option<u32>,
    pub max_radius: Option<u32>,
    pub recipient_email: Option<String>,
    pub user_prompt: Option<String>,
    pub system_prompt: Option<String>,
}

impl NewSearch {
    /// Pre-fills a form from an existing search's filters.
    pub fn copy_from(record: &SearchRecord) -> Self {
        let name = match record.name.as_deref() {
            Some(name) if !name.is_empty() => format!("Kopie von {}", name),
            _ => "Kopie".to_string(),
        };
        Self {
            name: Some(name),
            search_keywords: record.search_keywords.clone(),
            location: record.location.clone(),
            resume_last_updated_days: record.resume_last_updated_days,
            target_candidates: record.target_candidates,
            max_radius: record.max_radius,
            recipient_email: record.recipient_email.clone(),
            user_prompt: record.user_prompt.clone(),
            system_prompt: record.system_prompt.clone(),
        }
    }

    /// Blank optional strings become `None`; keywords must be present.
    pub fn validated(self) -> Result<Self> {
        let search_keywords = self.search_keywords.trim().to_string();
        if search_keywords.is_empty() {
            return Err(ScoutError::Validation(
                "search keywords are required".to_string(),
            ));
        }
        Ok(Self {
            name: blank_to_none(self.name),
            search_keywords,
            location: blank_to_none(self.location),
            resume_last_updated_days: self.resume_last_updated_days,
            target_candidates: self.target_candidates,
            max_radius: self.max_radius,
            recipient_email: blank_to_none(self.recipient_email),
            user_prompt: blank_to_none(self.user_prompt),
            system_prompt: blank_to_none(self.system_prompt),
        })
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// One sourced candidate, derived from a completed search's results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub position: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
    pub profile_url: Option<String>,
    pub profile_links: Vec<String>,
}
