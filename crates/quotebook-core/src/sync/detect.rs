//! Conflict detection and clean merge
//!
//! Quotes are matched by text only. For each local quote the first remote
//! quote with identical text is its counterpart.

use crate::models::{Conflict, Quote};

/// Local quotes whose first remote counterpart has a different category
///
/// Output follows the order of `local`. Quotes present on one side only are
/// merge candidates, not conflicts.
pub fn detect_conflicts(local: &[Quote], remote: &[Quote]) -> Vec<Conflict> {
    local
        .iter()
        .filter_map(|quote| {
            let counterpart = remote.iter().find(|r| r.text == quote.text)?;
            (counterpart.category != quote.category).then(|| Conflict {
                text: quote.text.clone(),
                local_category: quote.category.clone(),
                server_category: counterpart.category.clone(),
            })
        })
        .collect()
}

/// Remote set followed by every local quote the remote doesn't know
///
/// Server wins for shared text.
pub fn merge(local: &[Quote], remote: &[Quote]) -> Vec<Quote> {
    let mut merged = remote.to_vec();
    merged.extend(
        local
            .iter()
            .filter(|quote| !remote.iter().any(|r| r.text == quote.text))
            .cloned(),
    );
    merged
}
