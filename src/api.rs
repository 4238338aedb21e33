use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::models::{
    AudienceProfile, Campaign, ConnectedSheet, DashboardMetrics, HealthStatus, Job, JobStatus,
    Lead,
};

pub const DEV_FALLBACK_URL: &str = "http://localhost:8000";
pub const BASE_URL_ENV: &str = "PROSPECT_API_URL";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolution order: explicit flag, then `PROSPECT_API_URL`, then the fixed
/// development fallback.
pub fn resolve_base_url(explicit: Option<&str>) -> String {
    if let Some(url) = explicit {
        return url.trim_end_matches('/').to_string();
    }
    if let Ok(url) = env::var(BASE_URL_ENV) {
        let trimmed = url.trim();
        if !trimmed.is_empty() {
            return trimmed.trim_end_matches('/').to_string();
        }
    }
    DEV_FALLBACK_URL.to_string()
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested entity does not exist (HTTP 404). Distinct from a
    /// transport failure so views can render it as its own condition.
    #[error("{0} not found")]
    NotFound(String),
    #[error("request failed with status {status} {status_text}")]
    Status { status: u16, status_text: String },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

// --- Request payloads ---

#[derive(Debug, Clone, Serialize)]
pub struct CreateJobRequest {
    pub prompt: String,
    pub target_count: u32,
    pub quality_threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

impl CreateJobRequest {
    pub fn new(prompt: impl Into<String>, target_count: u32) -> Self {
        Self {
            prompt: prompt.into(),
            target_count,
            quality_threshold: 0.7,
            industry: None,
            location: None,
            company_size: None,
            keywords: Vec::new(),
            exclude_keywords: Vec::new(),
            data_sources: Vec::new(),
            verification_level: None,
            output_format: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One transcript turn as the audience endpoints expect it.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    pub reply: String,
    /// Present when the backend decided the conversation holds enough signal
    /// to (re)generate the profile.
    pub profile: Option<AudienceProfile>,
}

#[derive(Debug, Clone, Serialize)]
struct MappingEntry<'a> {
    source_header: &'a str,
    lead_field: &'a str,
}

// --- Wire shapes ---
//
// The backend is loose about field names (`id` vs `job_id`, `name` vs
// `contact_name`, confidence as a fraction or a percentage). Everything
// below exists so the rest of the crate only ever sees the canonical
// models: parse the raw shape, then normalize exactly once, here.

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Text(text) => text,
            WireId::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawJob {
    id: Option<WireId>,
    job_id: Option<WireId>,
    status: Option<String>,
    progress: Option<f64>,
    message: Option<String>,
    created_at: Option<String>,
    completed_at: Option<String>,
    leads: Option<Vec<RawLead>>,
    error: Option<String>,
}

impl RawJob {
    fn normalize(self) -> Result<Job, ApiError> {
        let id = self
            .id
            .or(self.job_id)
            .map(WireId::into_string)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::Decode("job record has no id".to_string()))?;
        let status = self
            .status
            .as_deref()
            .map(JobStatus::from_wire)
            .unwrap_or(JobStatus::Unknown);
        Ok(Job {
            id,
            status,
            progress: normalize_progress(self.progress),
            message: self.message.unwrap_or_default(),
            created_at: self.created_at,
            completed_at: self.completed_at,
            leads: self
                .leads
                .unwrap_or_default()
                .into_iter()
                .map(RawLead::normalize)
                .collect(),
            error: self.error,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawLead {
    id: Option<WireId>,
    lead_id: Option<WireId>,
    company: Option<String>,
    company_name: Option<String>,
    contact_name: Option<String>,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    industry: Option<String>,
    location: Option<String>,
    confidence: Option<f64>,
    score: Option<f64>,
    source: Option<String>,
    status: Option<String>,
}

impl RawLead {
    fn normalize(self) -> Lead {
        Lead {
            id: self.id.or(self.lead_id).map(WireId::into_string),
            company: self.company.or(self.company_name).unwrap_or_default(),
            contact_name: self.contact_name.or(self.name).unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone,
            industry: self.industry,
            location: self.location,
            confidence: normalize_confidence(self.confidence.or(self.score)),
            source: self.source,
            status: self.status.map(|s| s.trim().to_lowercase()),
            starred: false,
        }
    }
}

/// Progress arrives as a percentage; clamp stray values into 0..=100.
fn normalize_progress(raw: Option<f64>) -> u8 {
    raw.unwrap_or(0.0).clamp(0.0, 100.0).round() as u8
}

/// Confidence above 1.0 is a percentage in disguise.
fn normalize_confidence(raw: Option<f64>) -> f64 {
    let value = raw.unwrap_or(0.0);
    let scaled = if value > 1.0 { value / 100.0 } else { value };
    scaled.clamp(0.0, 1.0)
}

#[derive(Debug, Deserialize)]
struct JobsEnvelope {
    #[serde(default)]
    jobs: Vec<RawJob>,
}

#[derive(Debug, Deserialize)]
struct LeadsEnvelope {
    #[serde(default)]
    leads: Vec<RawLead>,
}

#[derive(Debug, Deserialize)]
struct CampaignsEnvelope {
    #[serde(default)]
    campaigns: Vec<Campaign>,
}

#[derive(Debug, Deserialize)]
struct ChatEnvelope {
    reply: String,
    profile: Option<AudienceProfile>,
}

#[derive(Debug, Deserialize)]
struct RawSheet {
    id: Option<WireId>,
    sheet_id: Option<WireId>,
    name: Option<String>,
    #[serde(default)]
    columns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SyncEnvelope {
    rows_synced: u32,
}

// --- Client ---

/// The only HTTP access point in the crate. One method per endpoint, one
/// round trip per call: no retries, no caching, no deduplication.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn check(
        &self,
        response: reqwest::blocking::Response,
        what: &str,
    ) -> Result<reqwest::blocking::Response, ApiError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
            });
        }
        Ok(response)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T, ApiError> {
        log::debug!("GET {}{}", self.base_url, path);
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()?;
        self.check(response, what)?
            .json::<T>()
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        what: &str,
    ) -> Result<T, ApiError> {
        log::debug!("POST {}{}", self.base_url, path);
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()?;
        self.check(response, what)?
            .json::<T>()
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    // --- Dashboard / health ---

    pub fn dashboard_metrics(&self) -> Result<DashboardMetrics, ApiError> {
        self.get("/dashboard/metrics", "dashboard metrics")
    }

    pub fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get("/health", "health endpoint")
    }

    // --- Jobs ---

    pub fn create_job(&self, request: &CreateJobRequest) -> Result<Job, ApiError> {
        let raw: RawJob = self.post("/jobs/", request, "job endpoint")?;
        raw.normalize()
    }

    pub fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        let envelope: JobsEnvelope = self.get("/jobs/", "job list")?;
        envelope
            .jobs
            .into_iter()
            .map(RawJob::normalize)
            .collect()
    }

    pub fn get_job(&self, id: &str) -> Result<Job, ApiError> {
        let raw: RawJob = self.get(&format!("/jobs/{id}"), &format!("job {id}"))?;
        raw.normalize()
    }

    // --- Leads ---

    pub fn list_leads(&self) -> Result<Vec<Lead>, ApiError> {
        let envelope: LeadsEnvelope = self.get("/leads/", "lead list")?;
        Ok(envelope.leads.into_iter().map(RawLead::normalize).collect())
    }

    pub fn get_lead(&self, id: &str) -> Result<Lead, ApiError> {
        let raw: RawLead = self.get(&format!("/leads/{id}"), &format!("lead {id}"))?;
        Ok(raw.normalize())
    }

    // --- Campaigns ---

    pub fn list_campaigns(&self) -> Result<Vec<Campaign>, ApiError> {
        let envelope: CampaignsEnvelope = self.get("/campaigns/", "campaign list")?;
        Ok(envelope.campaigns)
    }

    pub fn create_campaign(&self, request: &CreateCampaignRequest) -> Result<Campaign, ApiError> {
        self.post("/campaigns/", request, "campaign endpoint")
    }

    // --- Audience (opaque collaborator endpoints) ---

    pub fn audience_chat(&self, transcript: &[ChatTurn]) -> Result<ChatOutcome, ApiError> {
        let envelope: ChatEnvelope = self.post(
            "/audience/chat",
            &serde_json::json!({ "messages": transcript }),
            "audience chat",
        )?;
        Ok(ChatOutcome {
            reply: envelope.reply,
            profile: envelope.profile,
        })
    }

    pub fn generate_profile(&self, transcript: &[ChatTurn]) -> Result<AudienceProfile, ApiError> {
        self.post(
            "/audience/generate",
            &serde_json::json!({ "messages": transcript }),
            "audience profile",
        )
    }

    // --- Sheets (opaque collaborator endpoints) ---

    pub fn connect_sheet(&self, url: &str) -> Result<ConnectedSheet, ApiError> {
        let raw: RawSheet = self.post(
            "/sheets/connect",
            &serde_json::json!({ "url": url }),
            "sheet endpoint",
        )?;
        let id = raw
            .id
            .or(raw.sheet_id)
            .map(WireId::into_string)
            .ok_or_else(|| ApiError::Decode("sheet record has no id".to_string()))?;
        Ok(ConnectedSheet {
            name: raw.name.unwrap_or_else(|| id.clone()),
            id,
            url: url.to_string(),
            columns: raw.columns,
            connected: true,
            last_synced: None,
            row_count: None,
        })
    }

    pub fn sync_sheet(
        &self,
        sheet_id: &str,
        mappings: &[(String, String)],
    ) -> Result<u32, ApiError> {
        let entries: Vec<MappingEntry<'_>> = mappings
            .iter()
            .map(|(source, field)| MappingEntry {
                source_header: source,
                lead_field: field,
            })
            .collect();
        let envelope: SyncEnvelope = self.post(
            &format!("/sheets/{sheet_id}/sync"),
            &serde_json::json!({ "mappings": entries }),
            &format!("sheet {sheet_id}"),
        )?;
        Ok(envelope.rows_synced)
    }
}
