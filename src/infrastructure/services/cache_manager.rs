//! Introspection and management of a memoized function's cache

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::cache::{
    file_name, is_history_path, tokenize, CacheConfig, FunctionId, KeyForm, RecordKind,
};
use crate::domain::signature::{Arguments, CallArgs, Signature};
use crate::domain::MemoError;
use crate::infrastructure::backend::escape_literal;

use super::record_store::RecordStore;

/// Addresses a cache entry
#[derive(Debug, Clone, PartialEq)]
pub enum EntryRef {
    /// An explicit key, e.g. one returned by a listing
    Key(String),
    /// A call whose key is derived the same way a real call derives it
    Arguments(CallArgs),
}

impl From<&str> for EntryRef {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for EntryRef {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<CallArgs> for EntryRef {
    fn from(args: CallArgs) -> Self {
        Self::Arguments(args)
    }
}

/// Cache operations for one memoized function
#[derive(Debug, Clone)]
pub struct CacheManager {
    function: FunctionId,
    signature: Signature,
    config: Arc<CacheConfig>,
}

impl CacheManager {
    pub fn new(function: FunctionId, signature: Signature, config: Arc<CacheConfig>) -> Self {
        Self {
            function,
            signature,
            config,
        }
    }

    pub fn function(&self) -> &FunctionId {
        &self.function
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn config(&self) -> &Arc<CacheConfig> {
        &self.config
    }

    /// Directory holding this function's records
    pub fn base_path(&self) -> Result<String, MemoError> {
        self.config.base_path(&self.function)
    }

    /// Binds a call and drops excluded parameters, giving the keyed mapping
    pub fn keyed_arguments(&self, args: &CallArgs) -> Result<Arguments, MemoError> {
        let arguments = self.signature.bind(args)?;
        Ok(arguments.without(self.config.excluded()))
    }

    /// Key of the entry a call maps to
    pub fn tokenize(&self, args: &CallArgs) -> Result<String, MemoError> {
        let keyed = self.keyed_arguments(args)?;
        self.key_of(&keyed)
    }

    pub(crate) fn key_of(&self, keyed: &Arguments) -> Result<String, MemoError> {
        let (key, _) = tokenize(&keyed.to_value(), self.config.input_codec())?;
        Ok(key)
    }

    /// Whether a call would be served from the cache
    pub fn is_valid(&self, args: &CallArgs) -> Result<bool, MemoError> {
        let key = self.tokenize(args)?;
        let store = RecordStore::new(&self.config)?;
        let path = RecordKind::Output.path(&self.base_path()?, &key);

        Ok(self.config.validator_chain().is_valid(store.backend(), &path))
    }

    pub fn exists(&self, kind: RecordKind, entry: &EntryRef) -> Result<bool, MemoError> {
        let path = self.record_path(kind, entry)?;
        self.config.backend()?.exists(&path)
    }

    pub fn has_inputs(&self, entry: &EntryRef) -> Result<bool, MemoError> {
        self.exists(RecordKind::Inputs, entry)
    }

    pub fn has_output(&self, entry: &EntryRef) -> Result<bool, MemoError> {
        self.exists(RecordKind::Output, entry)
    }

    pub fn has_exception(&self, entry: &EntryRef) -> Result<bool, MemoError> {
        self.exists(RecordKind::Exception, entry)
    }

    /// Lazily walks the stored records of one kind
    ///
    /// Append-mode history versions are skipped. The iterator is consumed
    /// once; call again for a fresh listing.
    pub fn iter(
        &self,
        kind: RecordKind,
        form: KeyForm,
    ) -> Result<impl Iterator<Item = String> + use<>, MemoError> {
        let pattern = format!("{}/*{}", escape_literal(&self.base_path()?), kind.suffix());
        let paths = self.config.backend()?.glob(&pattern)?;

        Ok(paths
            .into_iter()
            .filter(move |path| kind.matches(file_name(path)) && !is_history_path(path))
            .map(move |path| match form {
                KeyForm::Key => kind.key_of(file_name(&path)).to_string(),
                KeyForm::Path => path,
            }))
    }

    pub fn list(&self, kind: RecordKind, form: KeyForm) -> Result<Vec<String>, MemoError> {
        Ok(self.iter(kind, form)?.collect())
    }

    pub fn load_inputs(&self, entry: &EntryRef) -> Result<Arguments, MemoError> {
        let (base, key) = self.locate(entry)?;
        RecordStore::new(&self.config)?.read_inputs(&base, &key)
    }

    pub fn load_output<T: DeserializeOwned>(&self, entry: &EntryRef) -> Result<T, MemoError> {
        let (base, key) = self.locate(entry)?;
        RecordStore::new(&self.config)?.read_output(&base, &key)
    }

    pub fn load_exception<E: DeserializeOwned>(&self, entry: &EntryRef) -> Result<E, MemoError> {
        let (base, key) = self.locate(entry)?;
        RecordStore::new(&self.config)?.read_exception(&base, &key)
    }

    /// Loads a superseded output kept under append expiry; 0 is the latest
    pub fn load_output_version<T: DeserializeOwned>(
        &self,
        entry: &EntryRef,
        version: usize,
    ) -> Result<T, MemoError> {
        let (base, key) = self.locate(entry)?;
        RecordStore::new(&self.config)?.read_output_version(&base, &key, version)
    }

    /// Removes one record; returns false when there was nothing to remove
    pub fn remove(&self, kind: RecordKind, entry: &EntryRef) -> Result<bool, MemoError> {
        let path = self.record_path(kind, entry)?;
        let backend = self.config.backend()?;

        if !backend.exists(&path)? {
            return Ok(false);
        }

        debug!(function = %self.function, kind = %kind, path = %path, "Removing record");
        backend.remove(&path)?;
        Ok(true)
    }

    /// Removes every listed record of one kind, returning how many went
    pub fn remove_all(&self, kind: RecordKind) -> Result<usize, MemoError> {
        let backend = self.config.backend()?;
        let paths = self.list(kind, KeyForm::Path)?;

        for path in &paths {
            backend.remove(path)?;
        }

        debug!(function = %self.function, kind = %kind, count = paths.len(), "Removed records");
        Ok(paths.len())
    }

    fn locate(&self, entry: &EntryRef) -> Result<(String, String), MemoError> {
        let key = match entry {
            EntryRef::Key(key) => key.clone(),
            EntryRef::Arguments(args) => self.tokenize(args)?,
        };

        Ok((self.base_path()?, key))
    }

    fn record_path(&self, kind: RecordKind, entry: &EntryRef) -> Result<String, MemoError> {
        let (base, key) = self.locate(entry)?;
        Ok(kind.path(&base, &key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::ExpiryMode;
    use crate::infrastructure::backend::InMemoryBackend;
    use serde_json::json;
    use std::time::Duration;

    fn manager(config: CacheConfig) -> CacheManager {
        CacheManager::new(
            FunctionId::new("demo", "add"),
            Signature::new().param("a").param("b"),
            Arc::new(config),
        )
    }

    fn seeded() -> (Arc<InMemoryBackend>, CacheManager) {
        let backend = Arc::new(InMemoryBackend::new());
        let manager = manager(CacheConfig::new().with_backend(backend.clone()));
        let store = RecordStore::new(&manager.config).unwrap();

        for (a, b) in [(1, 2), (3, 4)] {
            let args = CallArgs::new().arg(a).arg(b);
            let key = manager.tokenize(&args).unwrap();
            store
                .write_inputs("demo.add", &key, &manager.keyed_arguments(&args).unwrap())
                .unwrap();
            store.write_output("demo.add", &key, &(a + b)).unwrap();
        }

        let failing = CallArgs::new().arg(0).arg(0);
        let key = manager.tokenize(&failing).unwrap();
        store.write_exception("demo.add", &key, "boom").unwrap();

        (backend, manager)
    }

    #[test]
    fn test_key_independent_of_call_style() {
        let (_, manager) = seeded();

        let positional = manager.tokenize(&CallArgs::new().arg(1).arg(2)).unwrap();
        let keyword = manager
            .tokenize(&CallArgs::from_kwargs([("b", 2), ("a", 1)]))
            .unwrap();

        assert_eq!(positional, keyword);
        assert_eq!(positional.len(), 64);
    }

    #[test]
    fn test_list_by_kind() {
        let (_, manager) = seeded();

        assert_eq!(manager.list(RecordKind::Output, KeyForm::Key).unwrap().len(), 2);
        assert_eq!(manager.list(RecordKind::Inputs, KeyForm::Key).unwrap().len(), 2);
        assert_eq!(manager.list(RecordKind::Exception, KeyForm::Key).unwrap().len(), 1);

        let key = manager.tokenize(&CallArgs::new().arg(1).arg(2)).unwrap();
        let keys = manager.list(RecordKind::Inputs, KeyForm::Key).unwrap();
        assert!(keys.contains(&key));

        let paths = manager.list(RecordKind::Inputs, KeyForm::Path).unwrap();
        assert!(paths.contains(&format!("demo.add/{}.inputs", key)));
    }

    #[test]
    fn test_listing_skips_history() {
        let backend = Arc::new(InMemoryBackend::new());
        let manager = manager(
            CacheConfig::new()
                .with_backend(backend.clone())
                .with_ttl(Duration::from_secs(60))
                .with_expiry_mode(ExpiryMode::Append),
        );
        let store = RecordStore::new(&manager.config).unwrap();

        store.write_output("demo.add", "k", &1).unwrap();
        store.write_output("demo.add", "k", &2).unwrap();

        assert_eq!(
            manager.list(RecordKind::Output, KeyForm::Key).unwrap(),
            vec!["k".to_string()]
        );
        assert_eq!(
            manager
                .load_output_version::<i64>(&EntryRef::from("k"), 1)
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_load_by_key_and_by_arguments() {
        let (_, manager) = seeded();
        let args = CallArgs::new().arg(3).arg(4);
        let key = manager.tokenize(&args).unwrap();

        let by_args: i64 = manager.load_output(&EntryRef::from(args)).unwrap();
        let by_key: i64 = manager.load_output(&EntryRef::Key(key.clone())).unwrap();
        assert_eq!(by_args, 7);
        assert_eq!(by_key, 7);

        let inputs = manager.load_inputs(&EntryRef::Key(key)).unwrap();
        assert_eq!(inputs.get_raw("a"), Some(&json!(3)));

        let fault: String = manager
            .load_exception(&EntryRef::from(CallArgs::new().arg(0).arg(0)))
            .unwrap();
        assert_eq!(fault, "boom");
    }

    #[test]
    fn test_exists_per_kind() {
        let (_, manager) = seeded();
        let ok = EntryRef::from(CallArgs::new().arg(1).arg(2));
        let failed = EntryRef::from(CallArgs::new().arg(0).arg(0));

        assert!(manager.has_inputs(&ok).unwrap());
        assert!(manager.has_output(&ok).unwrap());
        assert!(!manager.has_exception(&ok).unwrap());
        assert!(manager.has_exception(&failed).unwrap());
        assert!(!manager.has_output(&failed).unwrap());
    }

    #[test]
    fn test_list_under_glob_metacharacter_prefix() {
        let backend = Arc::new(InMemoryBackend::new());
        let manager = manager(
            CacheConfig::new()
                .with_backend(backend.clone())
                .with_prefix("runs[1]"),
        );
        let store = RecordStore::new(&manager.config).unwrap();
        let base = manager.base_path().unwrap();
        let key = manager.tokenize(&CallArgs::new().arg(1).arg(2)).unwrap();

        store.write_inputs(&base, &key, &Arguments::new()).unwrap();
        store.write_output(&base, &key, &3).unwrap();

        assert_eq!(base, "runs[1]/demo.add");
        assert_eq!(
            manager.list(RecordKind::Output, KeyForm::Key).unwrap(),
            vec![key.clone()]
        );
        assert_eq!(
            manager.list(RecordKind::Inputs, KeyForm::Path).unwrap(),
            vec![format!("runs[1]/demo.add/{}.inputs", key)]
        );
        assert_eq!(manager.remove_all(RecordKind::Output).unwrap(), 1);
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let (_, manager) = seeded();
        let removed = manager
            .remove(RecordKind::Output, &EntryRef::from("nope"))
            .unwrap();
        assert!(!removed);
    }

    #[test]
    fn test_remove_all_exceptions_keeps_outputs() {
        let (backend, manager) = seeded();
        let before = backend.len();

        assert_eq!(manager.remove_all(RecordKind::Exception).unwrap(), 1);

        assert!(manager.list(RecordKind::Exception, KeyForm::Key).unwrap().is_empty());
        assert_eq!(manager.list(RecordKind::Output, KeyForm::Key).unwrap().len(), 2);
        assert_eq!(backend.len(), before - 1);
    }

    #[test]
    fn test_is_valid_follows_records() {
        let (_, manager) = seeded();

        assert!(manager.is_valid(&CallArgs::new().arg(1).arg(2)).unwrap());
        assert!(!manager.is_valid(&CallArgs::new().arg(5).arg(6)).unwrap());
        assert!(!manager.is_valid(&CallArgs::new().arg(0).arg(0)).unwrap());
    }

    #[test]
    fn test_binding_errors_surface() {
        let (_, manager) = seeded();
        let result = manager.tokenize(&CallArgs::new().arg(1));
        assert!(matches!(result, Err(MemoError::Binding { .. })));
    }
}
