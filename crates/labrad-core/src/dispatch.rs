//! Overload dispatch for one setting name.
//!
//! Overloads are kept in declaration order and the first signature that
//! matches the inbound value wins. Order is part of the contract: a wildcard
//! declared before a specific signature shadows it.

use crate::data::{TaggedValue, TypeSignature};
use crate::error::{LabradError, Result};
use crate::handler::SettingHandler;
use crate::signature::matches;
use std::fmt;
use tracing::{debug, warn};

/// Ordered (signature, handler) table for one setting.
pub struct OverloadDispatcher<T> {
    setting: String,
    overloads: Vec<(TypeSignature, SettingHandler<T>)>,
}

impl<T> Clone for OverloadDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            setting: self.setting.clone(),
            overloads: self.overloads.clone(),
        }
    }
}

impl<T> fmt::Debug for OverloadDispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverloadDispatcher")
            .field("setting", &self.setting)
            .field("overloads", &self.overloads)
            .finish()
    }
}

impl<T> OverloadDispatcher<T> {
    /// Build a dispatcher from handlers in declaration order.
    ///
    /// Fails if the list is empty or two handlers declare structurally equal
    /// signatures.
    pub fn new(
        setting: impl Into<String>,
        handlers: impl IntoIterator<Item = SettingHandler<T>>,
    ) -> Result<Self> {
        let setting = setting.into();
        let mut overloads: Vec<(TypeSignature, SettingHandler<T>)> = Vec::new();

        for handler in handlers {
            let signature = handler.signature().clone();
            if overloads.iter().any(|(existing, _)| *existing == signature) {
                return Err(LabradError::Validation {
                    field: setting,
                    message: format!("duplicate accepted signature {}", signature),
                });
            }
            overloads.push((signature, handler));
        }

        if overloads.is_empty() {
            return Err(LabradError::Validation {
                field: setting,
                message: "setting accepts no signatures".to_string(),
            });
        }

        Ok(Self { setting, overloads })
    }

    pub fn setting(&self) -> &str {
        &self.setting
    }

    /// Accepted signatures in declaration order.
    pub fn signatures(&self) -> impl Iterator<Item = &TypeSignature> {
        self.overloads.iter().map(|(signature, _)| signature)
    }

    pub fn len(&self) -> usize {
        self.overloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overloads.is_empty()
    }

    /// First handler whose signature matches `value`.
    pub fn select(&self, value: &TaggedValue) -> Option<&SettingHandler<T>> {
        self.overloads
            .iter()
            .find(|(signature, _)| matches(value, signature))
            .map(|(_, handler)| handler)
    }

    /// Route `value` to the first matching overload and return its result.
    ///
    /// Once a handler starts, its outcome is final even if it fails.
    pub fn handle(&self, object: &T, value: &TaggedValue) -> Result<TaggedValue> {
        match self.select(value) {
            Some(handler) => {
                debug!("Dispatching {} to overload {}", self.setting, handler.signature());
                handler.handle(object, value)
            }
            None => {
                let type_tag = value.type_tag().to_string();
                warn!("No overload of {} accepts {}", self.setting, type_tag);
                Err(LabradError::NoMatchingOverload {
                    setting: self.setting.clone(),
                    type_tag,
                })
            }
        }
    }
}
