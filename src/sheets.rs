use anyhow::{anyhow, Context, Result};
use regex::Regex;

use crate::api::ApiClient;
use crate::audience;
use crate::models::{ConnectedSheet, HeaderMapping};
use crate::store::Database;

/// Pull the spreadsheet id out of a Google Sheets URL, e.g.
/// https://docs.google.com/spreadsheets/d/<id>/edit#gid=0
pub fn sheet_id_from_url(url: &str) -> Option<String> {
    let re = Regex::new(r"docs\.google\.com/spreadsheets/d/([A-Za-z0-9_-]+)").ok()?;
    Some(re.captures(url)?.get(1)?.as_str().to_string())
}

/// Register the sheet with the backend and persist the returned record
/// locally. The backend reads the header row; we keep its column list for
/// mapping suggestions.
pub fn connect(api: &ApiClient, db: &Database, url: &str) -> Result<ConnectedSheet> {
    anyhow::ensure!(
        sheet_id_from_url(url).is_some(),
        "That does not look like a Google Sheets URL (expected .../spreadsheets/d/<id>/...)"
    );
    let sheet = api.connect_sheet(url).context("Sheet connection failed")?;
    db.upsert_sheet(&sheet)?;
    Ok(sheet)
}

/// Suggestions for a connected sheet, keeping only headers that resolved
/// to a lead field.
pub fn suggested_mappings_for(sheet: &ConnectedSheet) -> Vec<HeaderMapping> {
    audience::suggest_mappings(&sheet.columns)
        .into_iter()
        .filter_map(|suggestion| {
            suggestion.lead_field.map(|field| HeaderMapping {
                sheet_id: sheet.id.clone(),
                source_header: suggestion.source_header,
                lead_field: field.to_string(),
            })
        })
        .collect()
}

/// Push the saved header mappings to the backend and record the sync
/// result locally. Requires mappings to exist; syncing an unmapped sheet
/// would import nothing.
pub fn sync(api: &ApiClient, db: &Database, sheet_id: &str) -> Result<u32> {
    let sheet = db
        .get_sheet(sheet_id)?
        .ok_or_else(|| anyhow!("Sheet {sheet_id} is not connected"))?;
    let mappings = db.mappings_for(sheet_id)?;
    anyhow::ensure!(
        !mappings.is_empty(),
        "No header mappings saved for {sheet_id}. Run 'prospect audience map {sheet_id} --apply' first."
    );

    let pairs: Vec<(String, String)> = mappings
        .into_iter()
        .map(|m| (m.source_header, m.lead_field))
        .collect();
    let rows = api
        .sync_sheet(&sheet.id, &pairs)
        .context("Sheet sync failed")?;
    db.mark_sheet_synced(&sheet.id, rows)?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_db(dir: &TempDir) -> Database {
        Database::open_at(dir.path().join("prospect.db")).unwrap()
    }

    #[test]
    fn extracts_id_from_sheet_urls() {
        assert_eq!(
            sheet_id_from_url("https://docs.google.com/spreadsheets/d/1AbC_d-42/edit#gid=0"),
            Some("1AbC_d-42".to_string())
        );
        assert_eq!(
            sheet_id_from_url("https://docs.google.com/spreadsheets/d/xyz"),
            Some("xyz".to_string())
        );
        assert_eq!(sheet_id_from_url("https://example.com/spreadsheets/d/xyz"), None);
        assert_eq!(sheet_id_from_url("https://docs.google.com/document/d/xyz"), None);
    }

    #[test]
    fn connect_rejects_non_sheet_urls_before_any_request() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        // Deliberately unreachable endpoint: validation must fail first.
        let api = ApiClient::new("http://127.0.0.1:1");

        let err = connect(&api, &db, "https://example.com/not-a-sheet").unwrap_err();
        assert!(err.to_string().contains("Google Sheets URL"));
        assert!(db.list_sheets().unwrap().is_empty());
    }

    #[test]
    fn connect_persists_backend_record() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/sheets/connect")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "sh-1", "name": "Q3 Prospects", "columns": ["Company", "Email"]}"#)
            .create();

        let api = ApiClient::new(server.url());
        let sheet = connect(
            &api,
            &db,
            "https://docs.google.com/spreadsheets/d/abc123/edit",
        )
        .unwrap();

        assert_eq!(sheet.id, "sh-1");
        let stored = db.get_sheet("sh-1").unwrap().unwrap();
        assert_eq!(stored.columns, vec!["Company", "Email"]);
        assert!(stored.connected);
    }

    #[test]
    fn sync_pushes_mappings_and_records_result() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        db.upsert_sheet(&ConnectedSheet {
            id: "sh-1".to_string(),
            name: "Prospects".to_string(),
            url: "https://docs.google.com/spreadsheets/d/abc/edit".to_string(),
            columns: vec!["Company".to_string()],
            connected: true,
            last_synced: None,
            row_count: None,
        })
        .unwrap();
        db.save_mappings(
            "sh-1",
            &[HeaderMapping {
                sheet_id: "sh-1".to_string(),
                source_header: "Company".to_string(),
                lead_field: "company".to_string(),
            }],
        )
        .unwrap();

        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/sheets/sh-1/sync")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "mappings": [{"source_header": "Company", "lead_field": "company"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"rows_synced": 57}"#)
            .create();

        let api = ApiClient::new(server.url());
        let rows = sync(&api, &db, "sh-1").unwrap();
        assert_eq!(rows, 57);
        mock.assert();

        let stored = db.get_sheet("sh-1").unwrap().unwrap();
        assert_eq!(stored.row_count, Some(57));
        assert!(stored.last_synced.is_some());
    }

    #[test]
    fn sync_requires_saved_mappings() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        db.upsert_sheet(&ConnectedSheet {
            id: "sh-2".to_string(),
            name: "Bare".to_string(),
            url: "https://docs.google.com/spreadsheets/d/bare/edit".to_string(),
            columns: vec![],
            connected: true,
            last_synced: None,
            row_count: None,
        })
        .unwrap();

        let api = ApiClient::new("http://127.0.0.1:1");
        let err = sync(&api, &db, "sh-2").unwrap_err();
        assert!(err.to_string().contains("No header mappings"));
    }

    #[test]
    fn unknown_sheet_fails_with_hint() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        let api = ApiClient::new("http://127.0.0.1:1");

        let err = sync(&api, &db, "nope").unwrap_err();
        assert!(err.to_string().contains("not connected"));
    }

    #[test]
    fn suggestions_skip_unresolved_headers() {
        let sheet = ConnectedSheet {
            id: "sh-1".to_string(),
            name: "Prospects".to_string(),
            url: String::new(),
            columns: vec![
                "Company".to_string(),
                "Favorite Color".to_string(),
                "E-mail".to_string(),
            ],
            connected: true,
            last_synced: None,
            row_count: None,
        };
        let mappings = suggested_mappings_for(&sheet);
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].source_header, "Company");
        assert_eq!(mappings[1].lead_field, "email");
    }
}
