use std::cmp::Ordering;

use crate::models::Lead;

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Confidence bands used for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBucket {
    High,
    Medium,
    Low,
}

impl ConfidenceBucket {
    pub fn of(confidence: f64) -> Self {
        if confidence >= 0.8 {
            ConfidenceBucket::High
        } else if confidence >= 0.5 {
            ConfidenceBucket::Medium
        } else {
            ConfidenceBucket::Low
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "high" => Some(ConfidenceBucket::High),
            "medium" | "med" => Some(ConfidenceBucket::Medium),
            "low" => Some(ConfidenceBucket::Low),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceBucket::High => "High",
            ConfidenceBucket::Medium => "Medium",
            ConfidenceBucket::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Company,
    Contact,
    Email,
    Confidence,
    Industry,
    Location,
    Source,
    Status,
}

impl SortKey {
    pub fn from_str(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "company" => Some(SortKey::Company),
            "contact" | "name" => Some(SortKey::Contact),
            "email" => Some(SortKey::Email),
            "confidence" | "score" => Some(SortKey::Confidence),
            "industry" => Some(SortKey::Industry),
            "location" => Some(SortKey::Location),
            "source" => Some(SortKey::Source),
            "status" => Some(SortKey::Status),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Company => "company",
            SortKey::Contact => "contact",
            SortKey::Email => "email",
            SortKey::Confidence => "confidence",
            SortKey::Industry => "industry",
            SortKey::Location => "location",
            SortKey::Source => "source",
            SortKey::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "^",
            SortDirection::Descending => "v",
        }
    }
}

/// Everything the leads table needs to turn the canonical lead list into
/// the rows on screen. Filters compose with AND; the free-text search ORs
/// across company, contact name, email, industry and location.
#[derive(Debug, Clone, Default)]
pub struct LeadQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub industry: Option<String>,
    pub bucket: Option<ConfidenceBucket>,
    pub starred_only: bool,
    pub sort: SortKey,
    pub direction: SortDirection,
}

impl LeadQuery {
    /// Selecting the active sort key flips the direction; selecting a new
    /// key starts over ascending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        if self.sort == key {
            self.direction = self.direction.flip();
        } else {
            self.sort = key;
            self.direction = SortDirection::Ascending;
        }
    }

    pub fn apply(&self, leads: &[Lead]) -> Vec<Lead> {
        let needle = self
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut rows: Vec<Lead> = leads
            .iter()
            .filter(|lead| {
                if let Some(needle) = &needle {
                    if !matches_search(lead, needle) {
                        return false;
                    }
                }
                if let Some(status) = &self.status {
                    if !eq_ignore_case(lead.status.as_deref(), status) {
                        return false;
                    }
                }
                if let Some(source) = &self.source {
                    if !eq_ignore_case(lead.source.as_deref(), source) {
                        return false;
                    }
                }
                if let Some(industry) = &self.industry {
                    if !eq_ignore_case(lead.industry.as_deref(), industry) {
                        return false;
                    }
                }
                if let Some(bucket) = self.bucket {
                    if ConfidenceBucket::of(lead.confidence) != bucket {
                        return false;
                    }
                }
                if self.starred_only && !lead.starred {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        // Stable sort keeps the incoming order for ties.
        rows.sort_by(|a, b| match self.direction {
            SortDirection::Ascending => compare(a, b, self.sort),
            SortDirection::Descending => compare(b, a, self.sort),
        });
        rows
    }
}

fn matches_search(lead: &Lead, needle: &str) -> bool {
    lead.company.to_lowercase().contains(needle)
        || lead.contact_name.to_lowercase().contains(needle)
        || lead.email.to_lowercase().contains(needle)
        || contains_ignore_case(lead.industry.as_deref(), needle)
        || contains_ignore_case(lead.location.as_deref(), needle)
}

fn contains_ignore_case(value: Option<&str>, needle: &str) -> bool {
    value.is_some_and(|v| v.to_lowercase().contains(needle))
}

fn eq_ignore_case(value: Option<&str>, wanted: &str) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case(wanted))
}

fn compare(a: &Lead, b: &Lead, key: SortKey) -> Ordering {
    match key {
        SortKey::Company => a.company.to_lowercase().cmp(&b.company.to_lowercase()),
        SortKey::Contact => a
            .contact_name
            .to_lowercase()
            .cmp(&b.contact_name.to_lowercase()),
        SortKey::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
        SortKey::Confidence => a
            .confidence
            .partial_cmp(&b.confidence)
            .unwrap_or(Ordering::Equal),
        SortKey::Industry => cmp_opt(a.industry.as_deref(), b.industry.as_deref()),
        SortKey::Location => cmp_opt(a.location.as_deref(), b.location.as_deref()),
        SortKey::Source => cmp_opt(a.source.as_deref(), b.source.as_deref()),
        SortKey::Status => cmp_opt(a.status.as_deref(), b.status.as_deref()),
    }
}

// Missing values sort first either way.
fn cmp_opt(a: Option<&str>, b: Option<&str>) -> Ordering {
    a.unwrap_or("")
        .to_lowercase()
        .cmp(&b.unwrap_or("").to_lowercase())
}

#[derive(Debug)]
pub struct Page<'a> {
    pub items: &'a [Lead],
    /// 1-based, clamped into range.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice one page out of an already filtered and sorted list. Out-of-range
/// pages clamp to the nearest valid page rather than erroring.
pub fn paginate(leads: &[Lead], page: usize, per_page: usize) -> Page<'_> {
    let per_page = per_page.max(1);
    let total_items = leads.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total_items);
    Page {
        items: &leads[start..end],
        page,
        total_pages,
        total_items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(company: &str, contact: &str, email: &str, confidence: f64) -> Lead {
        Lead {
            id: Some(format!("{company}-{contact}")),
            company: company.to_string(),
            contact_name: contact.to_string(),
            email: email.to_string(),
            phone: None,
            industry: None,
            location: None,
            confidence,
            source: None,
            status: None,
            starred: false,
        }
    }

    fn sample() -> Vec<Lead> {
        let mut acme = lead("Acme", "Jo Field", "jo@acme.io", 0.93);
        acme.status = Some("verified".to_string());
        acme.source = Some("crunchbase".to_string());
        acme.industry = Some("Software".to_string());
        acme.location = Some("San Francisco".to_string());

        let mut globex = lead("Globex", "Sam Oak", "sam@globex.io", 0.61);
        globex.status = Some("new".to_string());
        globex.source = Some("linkedin".to_string());
        globex.industry = Some("Manufacturing".to_string());
        globex.location = Some("Austin".to_string());

        let mut initech = lead("Initech", "Ada Byron", "ada@initech.dev", 0.34);
        initech.status = Some("new".to_string());
        initech.source = Some("crunchbase".to_string());
        initech.industry = Some("Software".to_string());
        initech.location = Some("Denver".to_string());
        initech.starred = true;

        vec![acme, globex, initech]
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let leads = sample();
        let query = LeadQuery {
            search: Some("ACME".to_string()),
            ..Default::default()
        };
        assert_eq!(query.apply(&leads).len(), 1);

        // Matches the email field too.
        let query = LeadQuery {
            search: Some("initech.dev".to_string()),
            ..Default::default()
        };
        assert_eq!(query.apply(&leads)[0].company, "Initech");

        // Blank search is a no-op.
        let query = LeadQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.apply(&leads).len(), 3);
    }

    #[test]
    fn search_reaches_industry_and_location() {
        let leads = sample();
        let query = LeadQuery {
            search: Some("software".to_string()),
            ..Default::default()
        };
        assert_eq!(query.apply(&leads).len(), 2);

        let query = LeadQuery {
            search: Some("austin".to_string()),
            ..Default::default()
        };
        let rows = query.apply(&leads);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].company, "Globex");
    }

    #[test]
    fn filters_compose_with_and() {
        let leads = sample();
        let query = LeadQuery {
            status: Some("new".to_string()),
            source: Some("crunchbase".to_string()),
            ..Default::default()
        };
        let rows = query.apply(&leads);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].company, "Initech");
    }

    #[test]
    fn search_composes_with_filters() {
        let leads = sample();
        let query = LeadQuery {
            search: Some("a".to_string()),
            status: Some("new".to_string()),
            ..Default::default()
        };
        // "a" matches everything here; the status filter narrows it.
        let rows = query.apply(&leads);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|l| l.status.as_deref() == Some("new")));
    }

    #[test]
    fn bucket_boundaries() {
        assert_eq!(ConfidenceBucket::of(0.8), ConfidenceBucket::High);
        assert_eq!(ConfidenceBucket::of(0.79), ConfidenceBucket::Medium);
        assert_eq!(ConfidenceBucket::of(0.5), ConfidenceBucket::Medium);
        assert_eq!(ConfidenceBucket::of(0.49), ConfidenceBucket::Low);
        assert_eq!(ConfidenceBucket::of(0.0), ConfidenceBucket::Low);
    }

    #[test]
    fn bucket_filter_selects_band() {
        let leads = sample();
        let query = LeadQuery {
            bucket: Some(ConfidenceBucket::Medium),
            ..Default::default()
        };
        let rows = query.apply(&leads);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].company, "Globex");
    }

    #[test]
    fn starred_only_filter() {
        let leads = sample();
        let query = LeadQuery {
            starred_only: true,
            ..Default::default()
        };
        let rows = query.apply(&leads);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].company, "Initech");
    }

    #[test]
    fn toggling_sort_twice_restores_original_order() {
        let leads = sample();
        let mut query = LeadQuery::default();
        query.toggle_sort(SortKey::Confidence);
        let first = query.apply(&leads);
        assert_eq!(query.direction, SortDirection::Ascending);

        query.toggle_sort(SortKey::Confidence);
        let second = query.apply(&leads);
        assert_eq!(query.direction, SortDirection::Descending);
        let reversed: Vec<_> = first.iter().rev().map(|l| l.company.clone()).collect();
        let got: Vec<_> = second.iter().map(|l| l.company.clone()).collect();
        assert_eq!(got, reversed);

        query.toggle_sort(SortKey::Confidence);
        let third = query.apply(&leads);
        assert_eq!(
            first.iter().map(|l| &l.company).collect::<Vec<_>>(),
            third.iter().map(|l| &l.company).collect::<Vec<_>>()
        );
    }

    #[test]
    fn switching_sort_key_resets_to_ascending() {
        let mut query = LeadQuery::default();
        query.toggle_sort(SortKey::Company);
        query.toggle_sort(SortKey::Company);
        assert_eq!(query.direction, SortDirection::Descending);

        query.toggle_sort(SortKey::Email);
        assert_eq!(query.sort, SortKey::Email);
        assert_eq!(query.direction, SortDirection::Ascending);
    }

    #[test]
    fn sort_by_industry_groups_leads() {
        let leads = sample();
        let query = LeadQuery {
            sort: SortKey::Industry,
            ..Default::default()
        };
        let rows = query.apply(&leads);
        let companies: Vec<_> = rows.iter().map(|l| l.company.as_str()).collect();
        // Manufacturing sorts before Software; the Software pair keeps
        // its incoming order.
        assert_eq!(companies, ["Globex", "Acme", "Initech"]);
    }

    #[test]
    fn sort_ties_keep_incoming_order() {
        let mut leads = sample();
        // Same confidence for all three: sort must not shuffle them.
        for lead in &mut leads {
            lead.confidence = 0.5;
        }
        let query = LeadQuery {
            sort: SortKey::Confidence,
            ..Default::default()
        };
        let rows = query.apply(&leads);
        let companies: Vec<_> = rows.iter().map(|l| l.company.as_str()).collect();
        assert_eq!(companies, ["Acme", "Globex", "Initech"]);
    }

    #[test]
    fn pagination_clamps_and_slices() {
        let leads: Vec<Lead> = (0..7)
            .map(|i| lead(&format!("C{i}"), "X", "x@x.io", 0.5))
            .collect();

        let page = paginate(&leads, 1, 3);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 7);

        // Last page holds the remainder.
        let page = paginate(&leads, 3, 3);
        assert_eq!(page.items.len(), 1);

        // Out of range clamps to the last page.
        let page = paginate(&leads, 99, 3);
        assert_eq!(page.page, 3);
        assert_eq!(page.items.len(), 1);

        // Page zero clamps up to one.
        let page = paginate(&leads, 0, 3);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn empty_list_paginates_to_one_empty_page() {
        let page = paginate(&[], 1, 25);
        assert!(page.items.is_empty());
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total_items, 0);
    }
}
