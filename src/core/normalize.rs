use std::collections::HashMap;

/// Canonical comparison key for an activity name. Every comparison point in the
/// application (insertion, duplicate check, journal filter, aggregation key) must
/// go through this function, otherwise case variants fragment into separate buckets.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Maps a canonical key back to the casing the user chose for it. Falls back to
/// the key itself when the mapping was never recorded.
pub fn display_name<'a>(key: &'a str, names: &'a HashMap<String, String>) -> &'a str {
    names.get(key).map(String::as_str).unwrap_or(key)
}
