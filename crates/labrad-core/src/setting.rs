//! Setting metadata and the startup-built settings table.
//!
//! A server declares each setting once with a [`SettingBuilder`], listing its
//! overloads in the order they should be tried. The resulting
//! [`SettingsTable`] maps numeric setting IDs to their dispatchers and never
//! changes afterwards, so it can be shared across tasks without locking.

use crate::data::{SettingId, TaggedValue, TypeSignature};
use crate::descriptor::RegistrationDescriptor;
use crate::dispatch::OverloadDispatcher;
use crate::error::{LabradError, Result};
use crate::handler::{Reply, SettingHandler};
use crate::unpack::{Args, Unpacker};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Metadata for one setting. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub id: SettingId,
    pub name: String,
    pub doc: String,
    /// Accepted signatures, in dispatch order.
    pub accepts: Vec<TypeSignature>,
    pub returns: Vec<TypeSignature>,
    pub notes: String,
}

/// Builder for one setting and its overloads.
pub struct SettingBuilder<T> {
    id: SettingId,
    name: String,
    doc: String,
    notes: String,
    returns: Vec<TypeSignature>,
    handlers: Vec<SettingHandler<T>>,
}

impl<T> SettingBuilder<T> {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: SettingId(id),
            name: name.into(),
            doc: String::new(),
            notes: String::new(),
            returns: Vec::new(),
            handlers: Vec::new(),
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Declare a returned signature. Call repeatedly for several.
    pub fn returns(mut self, signature: TypeSignature) -> Self {
        self.returns.push(signature);
        self
    }

    /// Add an overload with an explicit extraction plan.
    pub fn overload<F>(mut self, signature: TypeSignature, unpacker: Unpacker, func: F) -> Self
    where
        F: Fn(&T, Args) -> Result<Reply> + Send + Sync + 'static,
    {
        self.handlers
            .push(SettingHandler::new(self.name.clone(), signature, unpacker, func));
        self
    }

    /// Add an overload whose extraction plan follows from the signature.
    pub fn accepts<F>(self, signature: TypeSignature, func: F) -> Self
    where
        F: Fn(&T, Args) -> Result<Reply> + Send + Sync + 'static,
    {
        let unpacker = Unpacker::for_signature(&signature);
        self.overload(signature, unpacker, func)
    }

    /// Validate and produce the setting metadata plus its dispatcher.
    pub fn build(self) -> Result<(Setting, OverloadDispatcher<T>)> {
        if self.name.trim().is_empty() {
            return Err(LabradError::Validation {
                field: format!("setting {}", self.id),
                message: "setting name must not be empty".to_string(),
            });
        }

        let accepts: Vec<TypeSignature> = self
            .handlers
            .iter()
            .map(|handler| handler.signature().clone())
            .collect();
        let dispatcher = OverloadDispatcher::new(self.name.clone(), self.handlers)?;

        let setting = Setting {
            id: self.id,
            name: self.name,
            doc: self.doc,
            accepts,
            returns: self.returns,
            notes: self.notes,
        };
        Ok((setting, dispatcher))
    }
}

struct Entry<T> {
    setting: Setting,
    dispatcher: OverloadDispatcher<T>,
}

/// Startup-built table of every setting a server exposes, keyed by ID.
pub struct SettingsTable<T> {
    entries: BTreeMap<SettingId, Entry<T>>,
    names: HashMap<String, SettingId>,
}

impl<T> Default for SettingsTable<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            names: HashMap::new(),
        }
    }
}

impl<T> SettingsTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and add one setting. IDs and names must be unique.
    pub fn register(&mut self, builder: SettingBuilder<T>) -> Result<SettingId> {
        let (setting, dispatcher) = builder.build()?;

        if self.entries.contains_key(&setting.id) {
            return Err(LabradError::Validation {
                field: setting.name,
                message: format!("setting ID {} already in use", setting.id),
            });
        }
        if self.names.contains_key(&setting.name) {
            return Err(LabradError::Validation {
                field: setting.name,
                message: "setting name already in use".to_string(),
            });
        }

        debug!(
            "Registered setting {} ({}) with {} overload(s)",
            setting.name,
            setting.id,
            dispatcher.len()
        );

        let id = setting.id;
        self.names.insert(setting.name.clone(), id);
        self.entries.insert(id, Entry { setting, dispatcher });
        Ok(id)
    }

    /// Chaining form of [`register`](Self::register).
    pub fn with(mut self, builder: SettingBuilder<T>) -> Result<Self> {
        self.register(builder)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: SettingId) -> Option<&Setting> {
        self.entries.get(&id).map(|entry| &entry.setting)
    }

    pub fn lookup_name(&self, name: &str) -> Option<SettingId> {
        self.names.get(name).copied()
    }

    /// Settings in ID order.
    pub fn settings(&self) -> impl Iterator<Item = &Setting> {
        self.entries.values().map(|entry| &entry.setting)
    }

    /// Registration descriptors in ID order.
    pub fn descriptors(&self) -> Vec<RegistrationDescriptor> {
        self.settings().map(RegistrationDescriptor::from_setting).collect()
    }

    /// Dispatch one inbound value to the setting with the given ID.
    pub fn handle(&self, object: &T, id: SettingId, value: &TaggedValue) -> Result<TaggedValue> {
        let entry = self
            .entries
            .get(&id)
            .ok_or(LabradError::UnknownSetting(id.0))?;
        entry.dispatcher.handle(object, value)
    }

    /// Handle a packet of records in order, stopping at the first failure.
    ///
    /// The returned list has one result per record that ran; a failed record
    /// is the last entry.
    pub fn handle_records(
        &self,
        object: &T,
        records: &[(SettingId, TaggedValue)],
    ) -> Vec<(SettingId, Result<TaggedValue>)> {
        let mut results = Vec::with_capacity(records.len());
        for (id, value) in records {
            let result = self.handle(object, *id, value);
            let failed = result.is_err();
            results.push((*id, result));
            if failed {
                break;
            }
        }
        results
    }
}
