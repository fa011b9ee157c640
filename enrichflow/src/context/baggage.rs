//! The shared per-run key/value store.
//!
//! `Baggage` is created fresh for every run and passed by `&mut` into each
//! tool in execution order. Only one tool holds it at a time, so it carries
//! no locks. Values are stored as JSON; [`BaggageKey`] gives each well-known
//! slot a fixed value type so tools read and write through typed accessors
//! instead of ad-hoc casts.
//!
//! Absence is a normal state. A key that was never written reads as
//! [`Lookup::Missing`]; a key a tool wrote as `null` ("ran, found nothing")
//! reads as [`Lookup::Empty`]. [`Baggage::get`] folds both into `None`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, warn};

/// A typed name for one baggage slot.
///
/// ```rust,ignore
/// pub const DECODED_CALL: BaggageKey<DecodedCall> = BaggageKey::new("decoded_call");
///
/// baggage.insert(&DECODED_CALL, &call)?;
/// let call = baggage.get(&DECODED_CALL);
/// ```
pub struct BaggageKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BaggageKey<T> {
    /// Declares a slot.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Returns the slot's string key.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for BaggageKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BaggageKey<T> {}

impl<T> fmt::Debug for BaggageKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BaggageKey").field(&self.name).finish()
    }
}

/// Result of a presence-aware read.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// No tool wrote the key.
    Missing,
    /// A tool wrote the key explicitly as empty.
    Empty,
    /// The key holds a value.
    Present(T),
}

impl<T> Lookup<T> {
    /// Converts to `Option`, treating `Missing` and `Empty` alike.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(v) => Some(v),
            Self::Missing | Self::Empty => None,
        }
    }

    /// Returns true if some tool wrote the key, even as empty.
    #[must_use]
    pub const fn was_written(&self) -> bool {
        !matches!(self, Self::Missing)
    }
}

/// The mutable store shared by all tools of one run.
#[derive(Debug, Default, Clone)]
pub struct Baggage {
    data: HashMap<String, serde_json::Value>,
    writers: HashMap<String, String>,
    current_writer: Option<String>,
}

impl Baggage {
    /// Creates an empty baggage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a baggage pre-seeded with caller-provided input.
    ///
    /// Seeded keys are attributed to no tool.
    #[must_use]
    pub fn from_data(data: HashMap<String, serde_json::Value>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Reads a typed slot. Missing, empty, and mistyped values all read as `None`.
    ///
    /// A mistyped value is logged at `warn`; use [`Baggage::try_get`] to see
    /// the decode error.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &BaggageKey<T>) -> Option<T> {
        match self.try_get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = key.name(), error = %e, "Baggage value has unexpected shape");
                None
            }
        }
    }

    /// Reads a typed slot, surfacing decode errors.
    pub fn try_get<T: DeserializeOwned>(
        &self,
        key: &BaggageKey<T>,
    ) -> Result<Option<T>, serde_json::Error> {
        match self.data.get(key.name()) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => T::deserialize(value).map(Some),
        }
    }

    /// Reads a typed slot, distinguishing "never written" from "written empty".
    pub fn lookup<T: DeserializeOwned>(
        &self,
        key: &BaggageKey<T>,
    ) -> Result<Lookup<T>, serde_json::Error> {
        match self.data.get(key.name()) {
            None => Ok(Lookup::Missing),
            Some(serde_json::Value::Null) => Ok(Lookup::Empty),
            Some(value) => T::deserialize(value).map(Lookup::Present),
        }
    }

    /// Writes a typed slot, replacing any previous value.
    pub fn insert<T: Serialize>(
        &mut self,
        key: &BaggageKey<T>,
        value: &T,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.insert_raw(key.name(), value);
        Ok(())
    }

    /// Marks a typed slot as written but holding nothing.
    pub fn insert_empty<T>(&mut self, key: &BaggageKey<T>) {
        self.insert_raw(key.name(), serde_json::Value::Null);
    }

    /// Reads a raw JSON value.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Writes a raw JSON value, replacing any previous value.
    pub fn insert_raw(&mut self, key: impl Into<String>, value: serde_json::Value) {
        let key = key.into();
        if let Some(writer) = &self.current_writer {
            if let Some(previous) = self.writers.get(&key) {
                if previous != writer {
                    debug!(key = %key, previous = %previous, writer = %writer, "Baggage key overwritten by another tool");
                }
            }
            self.writers.insert(key.clone(), writer.clone());
        }
        self.data.insert(key, value);
    }

    /// Checks if a key has been written (including as empty).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns the tool that last wrote `key`, if it was written during a run.
    #[must_use]
    pub fn written_by(&self, key: &str) -> Option<&str> {
        self.writers.get(key).map(String::as_str)
    }

    /// Returns the keys written by `tool`, sorted.
    #[must_use]
    pub fn keys_written_by(&self, tool: &str) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .writers
            .iter()
            .filter(|(_, w)| w.as_str() == tool)
            .map(|(k, _)| k.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Returns all keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.data.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the baggage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the baggage, returning its data for a final consumer.
    #[must_use]
    pub fn into_inner(self) -> HashMap<String, serde_json::Value> {
        self.data
    }

    pub(crate) fn set_current_writer(&mut self, tool: Option<&str>) {
        self.current_writer = tool.map(str::to_string);
    }
}
