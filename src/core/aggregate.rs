use std::{cmp::Ordering, collections::HashMap};

use chrono::NaiveDate;

use crate::{
    core::normalize::{display_name, normalize},
    store::entities::Session,
};

/// Summed minutes for one canonical activity, labeled with its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityTotal {
    pub text: String,
    pub minutes: u32,
}

/// Folds the session table, restricted by `predicate` over the session date,
/// into per-canonical-activity minute totals. Each canonical key appears at most
/// once; output order is unspecified, consumers sort as they need.
pub fn aggregate(
    sessions: &[Session],
    predicate: impl Fn(NaiveDate) -> bool,
    names: &HashMap<String, String>,
) -> Vec<ActivityTotal> {
    let mut totals = HashMap::<String, u32>::new();

    for session in sessions.iter().filter(|s| predicate(s.date)) {
        *totals.entry(session.canonical()).or_default() += session.minutes;
    }

    totals
        .into_iter()
        .map(|(key, minutes)| ActivityTotal {
            text: display_name(&key, names).to_string(),
            minutes,
        })
        .collect()
}

/// Distinct display names ordered for autocomplete: most recently used first,
/// never-used activities after all used ones in case-insensitive alphabetical
/// order. The three tiers are explicit branches so the comparator stays a single
/// total order; treating a missing timestamp as 0 would interleave never-used
/// names with genuinely old ones.
pub fn rank_activities(
    sessions: &[Session],
    usage: &HashMap<String, i64>,
    names: &HashMap<String, String>,
) -> Vec<String> {
    let mut keys: Vec<String> = sessions.iter().map(|s| s.canonical()).collect();
    keys.sort();
    keys.dedup();

    keys.sort_by(|a, b| match (usage.get(a), usage.get(b)) {
        (Some(ta), Some(tb)) => tb.cmp(ta).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        // Keys are already lowercased, so plain ordering is the
        // case-insensitive alphabetical order of the display names.
        (None, None) => a.cmp(b),
    });

    keys.into_iter()
        .map(|key| display_name(&key, names).to_string())
        .collect()
}

/// Scans for a session that would collide with inserting `activity` on `date`.
/// Comparison goes through the canonical key, so case variants collide.
pub fn find_duplicate<'a>(
    sessions: &'a [Session],
    activity: &str,
    date: NaiveDate,
) -> Option<&'a Session> {
    let key = normalize(activity);
    sessions
        .iter()
        .find(|s| s.date == date && s.canonical() == key)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;

    use super::*;

    fn session(activity: &str, minutes: u32, date: &str) -> Session {
        Session {
            id: format!("{activity}-{date}").into(),
            activity: activity.into(),
            minutes,
            date: date.parse().unwrap(),
        }
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn case_variants_sum_into_one_bucket() {
        let sessions = vec![
            session("Running", 30, "2025-10-14"),
            session("running ", 15, "2025-10-15"),
        ];
        let mut names = HashMap::new();
        names.insert("running".to_string(), "Running".to_string());

        let totals = aggregate(&sessions, |_| true, &names);

        assert_eq!(
            totals,
            vec![ActivityTotal {
                text: "Running".to_string(),
                minutes: 45
            }]
        );
    }

    #[test]
    fn unmapped_keys_fall_back_to_the_canonical_label() {
        let sessions = vec![session("Reading", 20, "2025-10-14")];

        let totals = aggregate(&sessions, |_| true, &HashMap::new());

        assert_eq!(totals[0].text, "reading");
    }

    #[test]
    fn predicate_restricts_the_fold() {
        let sessions = vec![
            session("Running", 30, "2025-10-14"),
            session("Running", 15, "2025-10-15"),
            session("Reading", 60, "2025-10-15"),
        ];

        let totals = aggregate(&sessions, |date| date == d("2025-10-15"), &HashMap::new());

        let mut labels: Vec<_> = totals.iter().map(|t| (t.text.as_str(), t.minutes)).collect();
        labels.sort();
        assert_eq!(labels, vec![("reading", 60), ("running", 15)]);
    }

    #[test]
    fn aggregation_is_idempotent_under_prefiltering() {
        let sessions = vec![
            session("Running", 30, "2025-10-14"),
            session("Running", 15, "2025-10-15"),
            session("Reading", 60, "2025-10-15"),
        ];
        let only_15th: Vec<_> = sessions
            .iter()
            .filter(|s| s.date == d("2025-10-15"))
            .cloned()
            .collect();

        let mut from_full = aggregate(&sessions, |date| date == d("2025-10-15"), &HashMap::new());
        let mut from_prefiltered = aggregate(&only_15th, |_| true, &HashMap::new());
        from_full.sort_by(|a, b| a.text.cmp(&b.text));
        from_prefiltered.sort_by(|a, b| a.text.cmp(&b.text));

        assert_eq!(from_full, from_prefiltered);
    }

    #[test]
    fn ranking_puts_recent_first_then_used_then_alphabetical() {
        let sessions = vec![
            session("alpha", 10, "2025-10-01"),
            session("Beta", 10, "2025-10-01"),
            session("gamma", 10, "2025-10-01"),
            session("delta", 10, "2025-10-01"),
        ];
        let mut usage = HashMap::new();
        usage.insert("beta".to_string(), 2_000i64);
        usage.insert("gamma".to_string(), 1_000i64);
        let mut names = HashMap::new();
        names.insert("beta".to_string(), "Beta".to_string());

        let ranked = rank_activities(&sessions, &usage, &names);

        assert_eq!(ranked, vec!["Beta", "gamma", "alpha", "delta"]);
    }

    #[test]
    fn never_used_names_sort_case_insensitively() {
        let sessions = vec![
            session("Zulu", 10, "2025-10-01"),
            session("echo", 10, "2025-10-01"),
        ];
        let mut names = HashMap::new();
        names.insert("zulu".to_string(), "Zulu".to_string());

        let ranked = rank_activities(&sessions, &HashMap::new(), &names);

        assert_eq!(ranked, vec!["echo", "Zulu"]);
    }

    #[test]
    fn duplicate_scan_matches_across_casing_but_not_dates() {
        let sessions = vec![session("Running", 30, "2025-10-14")];

        assert!(find_duplicate(&sessions, " running", d("2025-10-14")).is_some());
        assert!(find_duplicate(&sessions, "running", d("2025-10-15")).is_none());
        assert!(find_duplicate(&sessions, "Reading", d("2025-10-14")).is_none());
    }
}
