use crate::models::SearchRecord;

/// Records whose recipient email contains `filter`, ignoring case.
/// An empty or missing filter keeps every record. Order is preserved.
pub fn filter_by_recipient<'a>(
    records: &'a [SearchRecord],
    filter: Option<&str>,
) -> Vec<&'a SearchRecord> {
    let needle = match filter {
        Some(f) if !f.is_empty() => f.to_lowercase(),
        _ => return records.iter().collect(),
    };

    records
        .iter()
        .filter(|record| {
            record
                .recipient_email
                .as_deref()
                .is_some_and(|email| email.to_lowercase().contains(&needle))
        })
        .collect()
}

/// "Showing N of M searches for <filter>", when a filter is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSummary {
    pub shown: usize,
    pub total: usize,
    pub filter: String,
}

impl FilterSummary {
    pub fn new(shown: usize, total: usize, filter: Option<&str>) -> Option<Self> {
        match filter {
            Some(f) if !f.is_empty() => Some(Self {
                shown,
                total,
                filter: f.to_string(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: i64, email: Option<&str>) -> SearchRecord {
        SearchRecord {
            id,
            name: None,
            search_keywords: format!("search {}", id),
            location: None,
            resume_last_updated_days: None,
            target_candidates: None,
            max_radius: None,
            recipient_email: email.map(String::from),
            user_prompt: None,
            system_prompt: None,
            status: "pending".to_string(),
            results: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn ids(records: &[&SearchRecord]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    fn sample() -> Vec<SearchRecord> {
        vec![
            record(3, Some("Anna@Example.com")),
            record(2, None),
            record(1, Some("bob@other.org")),
            record(0, Some("hr@example.com")),
        ]
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let records = sample();
        assert_eq!(ids(&filter_by_recipient(&records, None)), vec![3, 2, 1, 0]);
        assert_eq!(ids(&filter_by_recipient(&records, Some(""))), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_case_insensitive_substring() {
        let records = sample();
        assert_eq!(ids(&filter_by_recipient(&records, Some("EXAMPLE"))), vec![3, 0]);
        assert_eq!(ids(&filter_by_recipient(&records, Some("b@oth"))), vec![1]);
        assert!(filter_by_recipient(&records, Some("nobody")).is_empty());
    }

    #[test]
    fn test_missing_email_never_matches() {
        let records = vec![record(1, None)];
        assert!(filter_by_recipient(&records, Some("@")).is_empty());
    }

    #[test]
    fn test_summary() {
        assert_eq!(FilterSummary::new(1, 4, None), None);
        assert_eq!(FilterSummary::new(1, 4, Some("")), None);
        let summary = FilterSummary::new(2, 4, Some("example")).unwrap();
        assert_eq!(summary.shown, 2);
        assert_eq!(summary.filter, "example");
    }
}
