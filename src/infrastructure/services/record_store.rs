//! Record persistence for cache entries

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::backend::Backend;
use crate::domain::cache::{
    history_index, history_path, is_exception_path, is_input_path, parent_of, CacheConfig, Codec,
    RecordKind,
};
use crate::domain::signature::Arguments;
use crate::domain::MemoError;
use crate::infrastructure::backend::escape_literal;

/// Reads and writes the records of one function's entries
///
/// Holds the backend resolved from the configuration for the lifetime of a
/// single operation.
pub struct RecordStore<'a> {
    config: &'a CacheConfig,
    backend: Arc<dyn Backend>,
}

impl<'a> RecordStore<'a> {
    pub fn new(config: &'a CacheConfig) -> Result<Self, MemoError> {
        Ok(Self {
            config,
            backend: config.backend()?,
        })
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn read_inputs(&self, base: &str, key: &str) -> Result<Arguments, MemoError> {
        let value = self.read_value(
            &RecordKind::Inputs.path(base, key),
            self.config.input_codec(),
        )?;
        Arguments::from_value(value)
    }

    pub fn read_output<T: DeserializeOwned>(&self, base: &str, key: &str) -> Result<T, MemoError> {
        self.read_typed(&RecordKind::Output.path(base, key))
    }

    pub fn read_exception<E: DeserializeOwned>(
        &self,
        base: &str,
        key: &str,
    ) -> Result<E, MemoError> {
        self.read_typed(&RecordKind::Exception.path(base, key))
    }

    /// Reads history version `version` of an output; 0 is the latest
    ///
    /// Numbering can have gaps when a version was removed between writes.
    pub fn read_output_version<T: DeserializeOwned>(
        &self,
        base: &str,
        key: &str,
        version: usize,
    ) -> Result<T, MemoError> {
        let entry = RecordKind::Output.path(base, key);
        self.read_typed(&history_path(&entry, version))
    }

    pub fn write_inputs(&self, base: &str, key: &str, inputs: &Arguments) -> Result<(), MemoError> {
        let bytes = self.config.input_codec().encode(&inputs.to_value())?;
        self.write(&RecordKind::Inputs.path(base, key), &bytes)
    }

    /// Writes an output, rotating older versions first under append expiry
    pub fn write_output<T: Serialize + ?Sized>(
        &self,
        base: &str,
        key: &str,
        output: &T,
    ) -> Result<(), MemoError> {
        let path = RecordKind::Output.path(base, key);
        let bytes = self.encode_output(output)?;

        if self.config.rotates_on_write() {
            self.rotate(&path)?;
        }

        self.write(&path, &bytes)
    }

    /// Writes a fault record; these are never rotated
    pub fn write_exception<E: Serialize + ?Sized>(
        &self,
        base: &str,
        key: &str,
        fault: &E,
    ) -> Result<(), MemoError> {
        let bytes = self.encode_output(fault)?;
        self.write(&RecordKind::Exception.path(base, key), &bytes)
    }

    /// Shifts every version of `entry` one index up, highest first
    ///
    /// Versions are renumbered as found, so removing one leaves a gap in
    /// the numbering after the next rotation.
    fn rotate(&self, entry: &str) -> Result<(), MemoError> {
        let mut versions: Vec<usize> = self
            .backend
            .glob(&format!("{}*", escape_literal(entry)))?
            .iter()
            .filter(|path| !is_input_path(path) && !is_exception_path(path))
            .filter_map(|path| history_index(entry, path))
            .collect();

        versions.sort_unstable_by(|a, b| b.cmp(a));

        for version in versions {
            let from = history_path(entry, version);
            let to = history_path(entry, version + 1);
            debug!(from = %from, to = %to, "Rotating output record");
            self.backend.rename(&from, &to)?;
        }

        Ok(())
    }

    fn read_typed<T: DeserializeOwned>(&self, path: &str) -> Result<T, MemoError> {
        let value = self.read_value(path, self.config.output_codec())?;
        serde_json::from_value(value).map_err(|e| {
            MemoError::serialization(format!("Failed to decode record {}: {}", path, e))
        })
    }

    fn read_value(&self, path: &str, codec: &dyn Codec) -> Result<Value, MemoError> {
        debug!("Reading {}://{}", self.backend.protocol(), path);
        let bytes = self.backend.read(path)?;
        codec.decode(&bytes)
    }

    fn encode_output<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, MemoError> {
        let value = serde_json::to_value(value)?;
        self.config.output_codec().encode(&value)
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), MemoError> {
        if let Some(parent) = parent_of(path) {
            self.ensure_parent(parent)?;
        }

        debug!(
            bytes = bytes.len(),
            "Writing {}://{}",
            self.backend.protocol(),
            path
        );
        self.backend.write(path, bytes)
    }

    fn ensure_parent(&self, parent: &str) -> Result<(), MemoError> {
        if self.config.knows_parent(parent)? {
            return Ok(());
        }

        if !self.backend.exists(parent)? {
            self.backend.mkdir(parent)?;
        }

        self.config.remember_parent(parent)?;
        Ok(())
    }
}
