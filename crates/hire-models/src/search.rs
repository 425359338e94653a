//! Skill term extraction backing candidate text search.
//!
//! Candidates carry a derived `skill_terms` list next to their skills. A
//! search query is tokenized the same way and matches a candidate when any
//! query term is present in that list.

use std::collections::HashSet;

/// Upper bound on terms taken from a single query.
///
/// Matches the Firestore limit for `ARRAY_CONTAINS_ANY` filters.
pub const MAX_QUERY_TERMS: usize = 30;

fn is_term_char(c: char) -> bool {
    c.is_alphanumeric() || c == '+' || c == '#'
}

/// Split free text into lowercase, de-duplicated terms in first-seen order.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| !is_term_char(c))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Terms indexed for a candidate's skill list.
pub fn skill_terms(skills: &[String]) -> Vec<String> {
    tokenize(&skills.join(" "))
}

/// Terms used to search for a query string, capped at [`MAX_QUERY_TERMS`].
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms = tokenize(query);
    terms.truncate(MAX_QUERY_TERMS);
    terms
}

/// True when any query term is among the indexed terms.
pub fn matches_any(indexed: &[String], query: &[String]) -> bool {
    query.iter().any(|q| indexed.contains(q))
}
