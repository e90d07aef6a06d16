//! Data models for Quotebook
//!
//! Defines the core data structures: Quote, Conflict, and CategoryFilter.
//! A quote's `text` is its only identity; there are no surrogate ids, so
//! two quotes with the same text are matched "first one wins".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QuoteError, Result};

/// A quote and the category it is filed under
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Quote {
    /// Quote text (identity key)
    pub text: String,
    /// Category label
    pub category: String,
}

impl Quote {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
        }
    }

    /// Build a quote from user input, trimming both fields
    ///
    /// Fails when either field is empty after trimming.
    pub fn validated(text: &str, category: &str) -> Result<Self> {
        let text = text.trim();
        let category = category.trim();

        if text.is_empty() || category.is_empty() {
            return Err(QuoteError::Validation(
                "please enter both a quote and a category".to_string(),
            ));
        }

        Ok(Self::new(text, category))
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" - {}", self.text, self.category)
    }
}

/// A quote whose category differs between the local and remote sets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub text: String,
    pub local_category: String,
    pub server_category: String,
}

/// Category selection used when browsing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every quote matches
    #[default]
    All,
    /// Only quotes with exactly this category
    Named(String),
}

impl CategoryFilter {
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(category) => quote.category == *category,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, CategoryFilter::All)
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "all" {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Named(s.to_string()))
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "all"),
            CategoryFilter::Named(category) => write!(f, "{}", category),
        }
    }
}

/// Quotes a fresh store starts with
pub fn default_quotes() -> Vec<Quote> {
    vec![
        Quote::new(
            "The only way to do great work is to love what you do.",
            "Motivation",
        ),
        Quote::new(
            "Life is what happens to you while you're busy making other plans.",
            "Life",
        ),
        Quote::new("In the middle of difficulty lies opportunity.", "Wisdom"),
        Quote::new(
            "It does not matter how slowly you go as long as you do not stop.",
            "Perseverance",
        ),
        Quote::new(
            "The future belongs to those who believe in the beauty of their dreams.",
            "Dreams",
        ),
        Quote::new("Be the change that you wish to see in the world.", "Inspiration"),
        Quote::new("The only true wisdom is in knowing you know nothing.", "Wisdom"),
        Quote::new(
            "Success is not final, failure is not fatal: it is the courage to continue that counts.",
            "Success",
        ),
    ]
}
