//! Application state
//!
//! `App` is the single owner of everything a front end drives: the quote
//! store, the session store, the sync controller, the remote gateway and
//! the selected category filter. Front ends hold one `App` and call into
//! it; no state lives anywhere else.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::models::{CategoryFilter, Conflict, Quote};
use crate::storage::{
    read_json, write_json, FileStore, KeyValueStore, StorageError, LAST_FILTER_KEY,
    LAST_QUOTE_KEY,
};
use crate::store::{pick_random, QuoteStore, StoreStats};
use crate::sync::{
    HttpGateway, RemoteGateway, Resolution, SyncEngine, SyncMetadata, SyncOutcome,
};
use crate::transfer::{export_json, parse_import};

/// Application state owned by one controller
pub struct App {
    config: Config,
    store: QuoteStore,
    session: Box<dyn KeyValueStore>,
    engine: SyncEngine,
    gateway: Box<dyn RemoteGateway>,
    filter: CategoryFilter,
}

impl App {
    /// Open file-backed stores under the configured data directory
    pub fn open(config: Config) -> Result<Self> {
        let kv = FileStore::open(config.store_path())?;
        let session = FileStore::open(config.session_path())?;
        let gateway = HttpGateway::from_config(&config)?;
        Self::with_parts(config, Box::new(kv), Box::new(session), Box::new(gateway))
    }

    /// Assemble an app from explicit parts
    pub fn with_parts(
        config: Config,
        kv: Box<dyn KeyValueStore>,
        session: Box<dyn KeyValueStore>,
        gateway: Box<dyn RemoteGateway>,
    ) -> Result<Self> {
        let mut store = QuoteStore::open(kv)?;
        let engine = SyncEngine::new(&mut store)?;
        let filter = store
            .kv()
            .get(LAST_FILTER_KEY)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();

        debug!(quotes = store.len(), %filter, "App opened");
        Ok(Self {
            config,
            store,
            session,
            engine,
            gateway,
            filter,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &QuoteStore {
        &self.store
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    // ==================== Browsing ====================

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    /// Select a category (or all) and remember it across sessions
    pub fn set_filter(&mut self, filter: CategoryFilter) -> Result<()> {
        self.store
            .kv_mut()
            .set(LAST_FILTER_KEY, &filter.to_string())?;
        self.filter = filter;
        Ok(())
    }

    /// Pick a random quote from the current filter and remember it for the session
    pub fn show_random(&mut self) -> Result<Quote> {
        let filter = self.filter.clone();
        self.show_random_in(&filter)
    }

    /// Pick from `filter` once, leaving the remembered filter as it is
    pub fn show_random_in(&mut self, filter: &CategoryFilter) -> Result<Quote> {
        let quote = pick_random(self.store.filter_by(filter))?.clone();
        write_json(self.session.as_mut(), LAST_QUOTE_KEY, &quote)?;
        Ok(quote)
    }

    /// Quote shown last in this session, if any
    pub fn last_viewed(&self) -> Option<Quote> {
        read_json(self.session.as_ref(), LAST_QUOTE_KEY)
            .ok()
            .flatten()
    }

    /// Forget session-scoped state
    pub fn end_session(&mut self) -> Result<()> {
        self.session.clear()?;
        Ok(())
    }

    // ==================== Editing ====================

    pub fn add_quote(&mut self, text: &str, category: &str) -> Result<Quote> {
        let quote = Quote::validated(text, category)?;
        self.store.add(quote.clone())?;
        info!("Added quote in {}", quote.category);
        Ok(quote)
    }

    pub fn delete_quote(&mut self, index: usize) -> Result<Quote> {
        let removed = self.store.delete_at(index)?;
        info!("Deleted quote at {}", index);
        Ok(removed)
    }

    // ==================== Import / export ====================

    /// Append every quote of a JSON payload, or none on any invalid entry
    pub fn import_str(&mut self, content: &str) -> Result<usize> {
        let quotes = parse_import(content)?;
        let count = self.store.extend(quotes)?;
        info!("Imported {} quotes", count);
        Ok(count)
    }

    pub fn import_file(&mut self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path).map_err(|source| StorageError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        self.import_str(&content)
    }

    pub fn export_json(&self) -> Result<String> {
        export_json(self.store.quotes())
    }

    pub fn export_to(&self, path: &Path) -> Result<PathBuf> {
        let json = self.export_json()?;
        fs::write(path, json).map_err(|e| StorageError::from_io(e, path.to_path_buf()))?;
        info!("Exported {} quotes to {:?}", self.store.len(), path);
        Ok(path.to_path_buf())
    }

    // ==================== Sync ====================

    /// Run one sync cycle (skipped while another runs or conflicts are pending)
    pub async fn sync(&mut self) -> Result<SyncOutcome> {
        self.engine
            .sync_cycle(&mut self.store, self.gateway.as_ref())
            .await
    }

    pub fn resolve(&mut self, resolution: Resolution) -> Result<usize> {
        self.engine.resolve(&mut self.store, resolution)
    }

    pub async fn push(&self) -> Result<usize> {
        self.engine.push(&self.store, self.gateway.as_ref()).await
    }

    pub fn pending_conflicts(&self) -> &[Conflict] {
        self.engine.pending_conflicts()
    }

    pub fn sync_metadata(&self) -> &SyncMetadata {
        self.engine.metadata()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuoteError;
    use crate::storage::{MemoryStore, QUOTES_KEY};
    use crate::sync::FetchOutcome;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct StaticGateway(Vec<Quote>);

    #[async_trait]
    impl RemoteGateway for StaticGateway {
        async fn fetch(&self) -> FetchOutcome {
            FetchOutcome {
                quotes: self.0.clone(),
                degraded: false,
            }
        }

        async fn post(&self, quotes: &[Quote]) -> Result<usize> {
            Ok(quotes.len().min(5))
        }
    }

    fn app_with(quotes: Vec<Quote>, remote: Vec<Quote>) -> App {
        let mut kv = MemoryStore::new();
        kv.set(QUOTES_KEY, &serde_json::to_string(&quotes).unwrap())
            .unwrap();
        App::with_parts(
            Config::default(),
            Box::new(kv),
            Box::new(MemoryStore::new()),
            Box::new(StaticGateway(remote)),
        )
        .unwrap()
    }

    fn q(text: &str, category: &str) -> Quote {
        Quote::new(text, category)
    }

    #[test]
    fn test_show_random_respects_filter_and_remembers() {
        let mut app = app_with(vec![q("A", "X"), q("B", "Y")], vec![]);
        app.set_filter(CategoryFilter::Named("Y".to_string())).unwrap();

        let shown = app.show_random().unwrap();
        assert_eq!(shown, q("B", "Y"));
        assert_eq!(app.last_viewed(), Some(shown));

        app.end_session().unwrap();
        assert!(app.last_viewed().is_none());
    }

    #[test]
    fn test_show_random_in_keeps_remembered_filter() {
        let mut app = app_with(vec![q("A", "X"), q("B", "Y")], vec![]);
        let y = CategoryFilter::Named("Y".to_string());

        assert_eq!(app.show_random_in(&y).unwrap(), q("B", "Y"));
        assert_eq!(app.filter(), &CategoryFilter::All);
        assert!(app.store().kv().get(LAST_FILTER_KEY).is_none());
    }

    #[test]
    fn test_show_random_empty_category() {
        let mut app = app_with(vec![q("A", "X")], vec![]);
        app.set_filter(CategoryFilter::Named("Nope".to_string())).unwrap();
        assert!(matches!(app.show_random(), Err(QuoteError::EmptyCollection)));
        assert!(app.last_viewed().is_none());
    }

    #[test]
    fn test_import_rejection_leaves_store_unchanged() {
        let mut app = app_with(vec![q("A", "X")], vec![]);
        let err = app
            .import_str(r#"[{"text":"Q","category":""}]"#)
            .unwrap_err();
        assert!(matches!(err, QuoteError::MalformedImport(_)));
        assert_eq!(app.store().quotes(), &[q("A", "X")]);
    }

    #[test]
    fn test_import_appends() {
        let mut app = app_with(vec![q("A", "X")], vec![]);
        let count = app
            .import_str(r#"[{"text":"B","category":"Y"},{"text":"C","category":"Z"}]"#)
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(app.store().len(), 3);
    }

    #[test]
    fn test_export_and_import_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("quotes.json");

        let source = app_with(vec![q("A", "X"), q("B", "Y")], vec![]);
        source.export_to(&path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("\n  {"));

        let mut target = app_with(vec![], vec![]);
        assert_eq!(target.import_file(&path).unwrap(), 2);
        assert_eq!(target.store().quotes(), source.store().quotes());
    }

    #[test]
    fn test_import_missing_file_is_storage_error() {
        let mut app = app_with(vec![], vec![]);
        let err = app.import_file(Path::new("/no/such/quotes.json")).unwrap_err();
        assert!(matches!(err, QuoteError::Storage(_)));
    }

    #[test]
    fn test_filter_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };

        {
            let mut app = App::open(config.clone()).unwrap();
            app.set_filter(CategoryFilter::Named("Wisdom".to_string()))
                .unwrap();
        }

        let app = App::open(config).unwrap();
        assert_eq!(app.filter(), &CategoryFilter::Named("Wisdom".to_string()));
        assert_eq!(app.store().len(), 8);
    }

    #[tokio::test]
    async fn test_sync_then_resolve_through_app() {
        let mut app = app_with(vec![q("A", "X")], vec![q("A", "Y"), q("B", "Z")]);

        let outcome = app.sync().await.unwrap();
        assert!(matches!(outcome, SyncOutcome::ConflictsPending { .. }));
        assert_eq!(app.pending_conflicts().len(), 1);

        app.resolve(Resolution::KeepServer).unwrap();
        assert_eq!(app.store().quotes(), &[q("A", "Y")]);
        assert!(app.sync_metadata().last_sync_timestamp.is_some());
    }

    #[tokio::test]
    async fn test_push_through_app() {
        let app = app_with(vec![q("A", "X")], vec![]);
        assert_eq!(app.push().await.unwrap(), 1);
    }
}
