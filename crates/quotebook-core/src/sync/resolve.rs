//! Conflict resolution strategies
//!
//! Each strategy only touches quotes named in the conflict list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Conflict, Quote};

/// User choice for a pending conflict round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// Discard the conflicts, change nothing
    KeepLocal,
    /// Overwrite the local category with the server's
    KeepServer,
    /// Append a server-category copy next to the local quote
    Merge,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [
        Resolution::KeepLocal,
        Resolution::KeepServer,
        Resolution::Merge,
    ];
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep-local" | "local" => Ok(Resolution::KeepLocal),
            "keep-server" | "server" => Ok(Resolution::KeepServer),
            "merge" | "both" => Ok(Resolution::Merge),
            other => Err(format!(
                "unknown strategy '{}' (use keep-local, keep-server or merge)",
                other
            )),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resolution::KeepLocal => "keep-local",
            Resolution::KeepServer => "keep-server",
            Resolution::Merge => "merge",
        };
        f.write_str(name)
    }
}

/// Apply a strategy to the local set; returns how many quotes were changed or added
pub fn apply_resolution(
    quotes: &mut Vec<Quote>,
    conflicts: &[Conflict],
    resolution: Resolution,
) -> usize {
    match resolution {
        Resolution::KeepLocal => 0,
        Resolution::KeepServer => conflicts
            .iter()
            .filter(|conflict| {
                match quotes.iter_mut().find(|q| q.text == conflict.text) {
                    Some(local) => {
                        local.category = conflict.server_category.clone();
                        true
                    }
                    None => false,
                }
            })
            .count(),
        Resolution::Merge => {
            let additions: Vec<Quote> = conflicts
                .iter()
                .filter(|conflict| quotes.iter().any(|q| q.text == conflict.text))
                .map(|conflict| Quote::new(&conflict.text, &conflict.server_category))
                .collect();
            let count = additions.len();
            quotes.extend(additions);
            count
        }
    }
}
