use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one backend research job. `Unknown` covers wire values this
/// client does not recognize; it is non-terminal so polling keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Started,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "started" => JobStatus::Started,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Started => "started",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        }
    }

    /// Terminal statuses stop polling; nothing transitions out of them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Percent complete; only meaningful while the status is non-terminal.
    pub progress: u8,
    pub message: String,
    pub created_at: Option<String>,
    pub completed_at: Option<String>,
    pub leads: Vec<Lead>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Absent for transient results embedded in a job that the backend has
    /// not assigned an identifier yet.
    pub id: Option<String>,
    pub company: String,
    pub contact_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    /// Normalized to 0.0..=1.0 by the gateway adapter.
    pub confidence: f64,
    pub source: Option<String>,
    pub status: Option<String>,
    /// Local-only flag; the sole client-side mutation a lead ever sees.
    #[serde(default)]
    pub starred: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DashboardMetrics {
    pub total_leads: u64,
    pub active_jobs: u64,
    pub success_rate: f64,
    pub verified_contacts: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub lead_count: u32,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(ChatRole::User),
            "assistant" => Some(ChatRole::Assistant),
            _ => None,
        }
    }
}

/// One turn of the audience-discovery conversation. Append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: i64,
    pub role: ChatRole,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectedSheet {
    pub id: String,
    pub name: String,
    pub url: String,
    pub columns: Vec<String>,
    pub connected: bool,
    pub last_synced: Option<String>,
    pub row_count: Option<u32>,
}

/// Metadata for a document fed to the audience workflow. The file itself is
/// uploaded to the backend; only this record survives locally.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: i64,
    pub name: String,
    pub size_bytes: i64,
    pub content_type: String,
    pub uploaded_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMapping {
    pub sheet_id: String,
    pub source_header: String,
    pub lead_field: String,
}

// --- Audience profile ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(default)]
    pub age_range: String,
    #[serde(default)]
    pub job_titles: Vec<String>,
    #[serde(default)]
    pub education: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Psychographics {
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Firmographics {
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub company_sizes: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub revenue_range: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub buying_triggers: Vec<String>,
    #[serde(default)]
    pub objections: Vec<String>,
}

/// Structured description of the ideal customer. Regeneration replaces the
/// whole record; there is no field-level merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudienceProfile {
    #[serde(default)]
    pub demographics: Demographics,
    #[serde(default)]
    pub psychographics: Psychographics,
    #[serde(default)]
    pub firmographics: Firmographics,
    #[serde(default)]
    pub behavior: Behavior,
}

impl AudienceProfile {
    /// Starting point shown before any chat-driven generation has run.
    pub fn starter() -> Self {
        AudienceProfile {
            demographics: Demographics {
                age_range: "25-55".to_string(),
                job_titles: vec![
                    "Founder".to_string(),
                    "Head of Sales".to_string(),
                    "Marketing Director".to_string(),
                ],
                education: "Any".to_string(),
            },
            psychographics: Psychographics {
                pain_points: vec!["Slow lead discovery".to_string()],
                goals: vec!["Grow qualified pipeline".to_string()],
                values: vec!["Data quality".to_string()],
            },
            firmographics: Firmographics {
                industries: vec!["Software".to_string()],
                company_sizes: vec!["11-50".to_string(), "51-200".to_string()],
                locations: vec!["United States".to_string()],
                revenue_range: "$1M-$50M".to_string(),
            },
            behavior: Behavior {
                channels: vec!["Email".to_string(), "LinkedIn".to_string()],
                buying_triggers: vec!["New funding round".to_string()],
                objections: vec!["Already using a competitor".to_string()],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_known_wire_values() {
        assert_eq!(JobStatus::from_wire("started"), JobStatus::Started);
        assert_eq!(JobStatus::from_wire("Processing"), JobStatus::Processing);
        assert_eq!(JobStatus::from_wire(" completed "), JobStatus::Completed);
        assert_eq!(JobStatus::from_wire("failed"), JobStatus::Failed);
    }

    #[test]
    fn status_maps_unrecognized_values_to_unknown() {
        assert_eq!(JobStatus::from_wire("queued"), JobStatus::Unknown);
        assert_eq!(JobStatus::from_wire(""), JobStatus::Unknown);
        assert!(!JobStatus::from_wire("queued").is_terminal());
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Started.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(!JobStatus::Unknown.is_terminal());
    }

    #[test]
    fn profile_roundtrips_through_json() {
        let profile = AudienceProfile::starter();
        let text = serde_json::to_string(&profile).unwrap();
        let back: AudienceProfile = serde_json::from_str(&text).unwrap();
        assert_eq!(back, profile);
    }
}
