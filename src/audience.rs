use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

use crate::api::{ApiClient, ChatOutcome, ChatTurn, CreateJobRequest};
use crate::models::{AudienceProfile, ChatMessage, ChatRole, StoredDocument};
use crate::store::Database;

pub const GREETING: &str =
    "Hi! I can help you define your target audience. Tell me about your product and the customers you want to reach.";

const MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

// --- Workflow ---

/// The audience setup flow. Upload and SheetMapping are optional; a
/// generated profile alone is enough to reach Ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    Chat,
    Upload,
    SheetMapping,
    Ready,
}

impl WorkflowStep {
    pub fn label(&self) -> &'static str {
        match self {
            WorkflowStep::Chat => "chat",
            WorkflowStep::Upload => "upload",
            WorkflowStep::SheetMapping => "sheet mapping",
            WorkflowStep::Ready => "ready",
        }
    }

    pub fn is_skippable(&self) -> bool {
        matches!(self, WorkflowStep::Upload | WorkflowStep::SheetMapping)
    }
}

#[derive(Debug)]
pub struct WorkflowStatus {
    pub step: WorkflowStep,
    pub messages: usize,
    pub documents: usize,
    pub sheets: usize,
    pub has_profile: bool,
}

/// Derives the current step from what the store holds rather than keeping
/// a separate cursor: a saved profile means Ready, otherwise the furthest
/// stage with any material in it.
pub fn workflow_status(db: &Database) -> Result<WorkflowStatus> {
    let messages = db.chat_history()?.len();
    let documents = db.list_documents()?.len();
    let sheets = db.list_sheets()?.len();
    let has_profile = db.load_profile()?.is_some();

    let step = if has_profile {
        WorkflowStep::Ready
    } else if sheets > 0 {
        WorkflowStep::SheetMapping
    } else if documents > 0 {
        WorkflowStep::Upload
    } else {
        WorkflowStep::Chat
    };

    Ok(WorkflowStatus {
        step,
        messages,
        documents,
        sheets,
        has_profile,
    })
}

// --- Chat ---

/// Append the user turn, send the whole transcript to the backend, and
/// persist the reply. When the backend decides the conversation holds
/// enough signal it sends a profile back; that replaces the stored one.
pub fn send_chat(api: &ApiClient, db: &Database, text: &str) -> Result<ChatOutcome> {
    db.seed_chat(GREETING)?;
    db.append_chat(ChatRole::User, text)?;

    let transcript = transcript_turns(db)?;
    let outcome = api
        .audience_chat(&transcript)
        .context("Audience chat request failed")?;

    db.append_chat(ChatRole::Assistant, &outcome.reply)?;
    if let Some(profile) = &outcome.profile {
        db.save_profile(profile)?;
    }
    Ok(outcome)
}

pub fn history(db: &Database) -> Result<Vec<ChatMessage>> {
    db.seed_chat(GREETING)?;
    db.chat_history()
}

fn transcript_turns(db: &Database) -> Result<Vec<ChatTurn>> {
    Ok(db
        .chat_history()?
        .into_iter()
        .map(|message| ChatTurn {
            role: message.role.as_str().to_string(),
            content: message.content,
        })
        .collect())
}

// --- Profile ---

/// The stored profile, or the starter profile before anything has been
/// generated.
pub fn current_profile(db: &Database) -> Result<AudienceProfile> {
    Ok(db.load_profile()?.unwrap_or_else(AudienceProfile::starter))
}

pub fn regenerate_profile(api: &ApiClient, db: &Database) -> Result<AudienceProfile> {
    let transcript = transcript_turns(db)?;
    let profile = api
        .generate_profile(&transcript)
        .context("Profile generation failed")?;
    db.save_profile(&profile)?;
    Ok(profile)
}

/// Fold the profile into a search request. Values already set on the
/// request win; the profile only fills blanks.
pub fn apply_profile(request: &mut CreateJobRequest, profile: &AudienceProfile) {
    if request.industry.is_none() {
        request.industry = first_non_empty(&profile.firmographics.industries);
    }
    if request.location.is_none() {
        request.location = first_non_empty(&profile.firmographics.locations);
    }
    if request.company_size.is_none() {
        request.company_size = first_non_empty(&profile.firmographics.company_sizes);
    }
    if request.keywords.is_empty() {
        request.keywords = profile
            .demographics
            .job_titles
            .iter()
            .filter(|t| !t.trim().is_empty())
            .cloned()
            .collect();
    }
}

fn first_non_empty(values: &[String]) -> Option<String> {
    values
        .iter()
        .find(|v| !v.trim().is_empty())
        .cloned()
}

// --- Documents ---

pub fn upload_document(db: &Database, path: &Path) -> Result<StoredDocument> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    anyhow::ensure!(meta.is_file(), "{} is not a file", path.display());
    anyhow::ensure!(
        meta.len() <= MAX_DOCUMENT_BYTES,
        "{} is larger than the 10 MB upload limit",
        path.display()
    );

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();
    let content_type = content_type_for(&name).ok_or_else(|| {
        anyhow::anyhow!("Unsupported file type for {name} (use pdf, csv, txt, md or docx)")
    })?;

    db.add_document(&name, meta.len() as i64, content_type)
}

fn content_type_for(name: &str) -> Option<&'static str> {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())?;
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "csv" => Some("text/csv"),
        "txt" | "md" => Some("text/plain"),
        "doc" | "docx" => Some("application/msword"),
        _ => None,
    }
}

// --- Header mapping ---

pub const LEAD_FIELDS: &[&str] = &[
    "company",
    "contact_name",
    "email",
    "phone",
    "industry",
    "location",
];

const FUZZY_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub source_header: String,
    pub lead_field: Option<&'static str>,
}

/// Suggest a canonical lead field for each sheet header. Known aliases
/// match exactly; everything else falls back to Jaro-Winkler similarity.
/// Each lead field is claimed at most once, first header wins.
pub fn suggest_mappings(headers: &[String]) -> Vec<Suggestion> {
    let mut claimed: HashSet<&'static str> = HashSet::new();
    headers
        .iter()
        .map(|header| {
            let normalized = normalize_header(header);
            let candidate = alias_target(&normalized).or_else(|| fuzzy_target(&normalized));
            let lead_field = candidate.filter(|field| claimed.insert(field));
            Suggestion {
                source_header: header.clone(),
                lead_field,
            }
        })
        .collect()
}

fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .replace(['_', '-', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn alias_target(normalized: &str) -> Option<&'static str> {
    match normalized {
        "company" | "company name" | "organization" | "organisation" | "employer"
        | "business" | "account" => Some("company"),
        "name" | "full name" | "contact" | "contact name" | "person" | "lead name" => {
            Some("contact_name")
        }
        "email" | "e mail" | "email address" | "e mail address" | "mail" => Some("email"),
        "phone" | "phone number" | "telephone" | "mobile" | "cell" => Some("phone"),
        "industry" | "sector" | "vertical" => Some("industry"),
        "location" | "city" | "region" | "country" | "state" | "address" => Some("location"),
        _ => None,
    }
}

fn fuzzy_target(normalized: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, f64)> = None;
    for field in LEAD_FIELDS {
        let target = field.replace('_', " ");
        let score = strsim::jaro_winkler(normalized, &target);
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((field, score));
        }
    }
    best.filter(|(_, score)| *score >= FUZZY_THRESHOLD)
        .map(|(field, _)| field)
}
