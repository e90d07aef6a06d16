//! Quote store
//!
//! The `QuoteStore` owns the canonical quote list and writes it through to
//! a `KeyValueStore` after every mutation.
//!
//! ## Change notification
//!
//! Views subscribe with [`QuoteStore::subscribe`] and receive the latest
//! [`StoreChange`]. A `Deleted` change means any quote displayed by position
//! may now be stale and the view should pick again.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = QuoteStore::open(Box::new(FileStore::open(path)?))?;
//! store.add(Quote::validated("Stay hungry.", "Motivation")?)?;
//!
//! let filter = CategoryFilter::Named("Motivation".into());
//! let quote = pick_random(store.filter_by(&filter))?;
//! ```

use rand::Rng;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{QuoteError, Result};
use crate::models::{default_quotes, CategoryFilter, Quote};
use crate::storage::{read_json, write_json, KeyValueStore, QUOTES_KEY};

/// Last mutation applied to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// Store was opened; nothing changed yet
    Loaded,
    /// One quote appended
    Added,
    /// Quote at this position removed
    Deleted { index: usize },
    /// Whole set swapped (sync, resolution)
    Replaced,
    /// Batch appended (import)
    Extended { count: usize },
}

/// Summary counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub total_quotes: usize,
    pub total_categories: usize,
}

/// Canonical quote collection
pub struct QuoteStore {
    quotes: Vec<Quote>,
    kv: Box<dyn KeyValueStore>,
    changes: watch::Sender<StoreChange>,
}

impl QuoteStore {
    /// Open the store, seeding the built-in quotes when nothing is persisted
    pub fn open(kv: Box<dyn KeyValueStore>) -> Result<Self> {
        let quotes = match read_json::<Vec<Quote>>(kv.as_ref(), QUOTES_KEY)? {
            Some(quotes) => quotes,
            None => {
                debug!("No persisted quotes, starting from defaults");
                default_quotes()
            }
        };

        let (changes, _) = watch::channel(StoreChange::Loaded);
        Ok(Self {
            quotes,
            kv,
            changes,
        })
    }

    /// All quotes in insertion order
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Subscribe to mutation notifications
    pub fn subscribe(&self) -> watch::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Underlying key-value store (shared with sync metadata)
    pub fn kv(&self) -> &dyn KeyValueStore {
        self.kv.as_ref()
    }

    /// Mutable access to the underlying key-value store
    pub fn kv_mut(&mut self) -> &mut dyn KeyValueStore {
        self.kv.as_mut()
    }

    // ==================== Mutations ====================

    /// Append a quote after validating it
    pub fn add(&mut self, quote: Quote) -> Result<()> {
        let quote = Quote::validated(&quote.text, &quote.category)?;
        self.quotes.push(quote);
        self.save()?;
        self.notify(StoreChange::Added);
        Ok(())
    }

    /// Remove the quote at `index`
    ///
    /// An out-of-range index leaves the store untouched.
    pub fn delete_at(&mut self, index: usize) -> Result<Quote> {
        if index >= self.quotes.len() {
            return Err(QuoteError::Index {
                index,
                len: self.quotes.len(),
            });
        }

        let removed = self.quotes.remove(index);
        self.save()?;
        self.notify(StoreChange::Deleted { index });
        Ok(removed)
    }

    /// Swap the whole set
    pub fn replace_all(&mut self, quotes: Vec<Quote>) -> Result<()> {
        self.quotes = quotes;
        self.save()?;
        self.notify(StoreChange::Replaced);
        Ok(())
    }

    /// Append an already validated batch, persisting once
    pub fn extend(&mut self, quotes: Vec<Quote>) -> Result<usize> {
        let count = quotes.len();
        self.quotes.extend(quotes);
        self.save()?;
        self.notify(StoreChange::Extended { count });
        Ok(count)
    }

    /// Apply an in-place edit to the set, then persist
    ///
    /// Persists even when `f` changes nothing.
    pub fn modify<F, R>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<Quote>) -> R,
    {
        let out = f(&mut self.quotes);
        self.save()?;
        self.notify(StoreChange::Replaced);
        Ok(out)
    }

    // ==================== Queries ====================

    /// Quotes matching the filter, in store order
    pub fn filter_by<'a>(
        &'a self,
        filter: &'a CategoryFilter,
    ) -> impl Iterator<Item = &'a Quote> + 'a {
        self.quotes.iter().filter(move |q| filter.matches(q))
    }

    /// Unique categories in first-seen order
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for quote in &self.quotes {
            if !seen.iter().any(|c| *c == quote.category) {
                seen.push(quote.category.clone());
            }
        }
        seen
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_quotes: self.quotes.len(),
            total_categories: self.categories().len(),
        }
    }

    fn save(&mut self) -> Result<()> {
        write_json(self.kv.as_mut(), QUOTES_KEY, &self.quotes)
    }

    fn notify(&self, change: StoreChange) {
        debug!(?change, total = self.quotes.len(), "Quote store changed");
        self.changes.send_replace(change);
    }
}

/// Pick a uniformly random element
pub fn pick_random<I>(items: I) -> Result<I::Item>
where
    I: IntoIterator,
{
    pick_random_with(items, &mut rand::thread_rng())
}

/// Pick a uniformly random element using the given generator
pub fn pick_random_with<I, R>(items: I, rng: &mut R) -> Result<I::Item>
where
    I: IntoIterator,
    R: Rng + ?Sized,
{
    let mut candidates: Vec<I::Item> = items.into_iter().collect();
    if candidates.is_empty() {
        return Err(QuoteError::EmptyCollection);
    }
    let index = rng.gen_range(0..candidates.len());
    Ok(candidates.swap_remove(index))
}
