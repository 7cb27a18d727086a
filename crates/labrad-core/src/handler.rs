//! Setting handler: one callable bound to one accepted signature.
//!
//! A call runs unpack → invoke → wrap in a single synchronous pass. Unpack
//! failures become [`LabradError::ArgumentUnpack`]; whatever the callable
//! returns as an error is handed back untouched.

use crate::data::{TaggedValue, TypeSignature};
use crate::error::{LabradError, Result};
use crate::unpack::{Args, Unpacker};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// What a setting's callable produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Nothing to return; sent back as the empty value.
    Void,
    Value(TaggedValue),
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Void
    }
}

impl From<TaggedValue> for Reply {
    fn from(value: TaggedValue) -> Self {
        Reply::Value(value)
    }
}

impl Reply {
    /// Convert to the outbound value. No re-typing happens here.
    pub fn into_tagged(self) -> TaggedValue {
        match self {
            Reply::Void => TaggedValue::EMPTY,
            Reply::Value(value) => value,
        }
    }
}

/// Calling convention for every bound setting implementation.
pub type SettingFn<T> = Arc<dyn Fn(&T, Args) -> Result<Reply> + Send + Sync>;

/// One (signature, callable, extraction plan) binding.
pub struct SettingHandler<T> {
    setting: String,
    signature: TypeSignature,
    unpacker: Unpacker,
    func: SettingFn<T>,
}

impl<T> Clone for SettingHandler<T> {
    fn clone(&self) -> Self {
        Self {
            setting: self.setting.clone(),
            signature: self.signature.clone(),
            unpacker: self.unpacker.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<T> fmt::Debug for SettingHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingHandler")
            .field("setting", &self.setting)
            .field("signature", &self.signature)
            .field("unpacker", &self.unpacker)
            .finish_non_exhaustive()
    }
}

impl<T> SettingHandler<T> {
    pub fn new<F>(
        setting: impl Into<String>,
        signature: TypeSignature,
        unpacker: Unpacker,
        func: F,
    ) -> Self
    where
        F: Fn(&T, Args) -> Result<Reply> + Send + Sync + 'static,
    {
        Self {
            setting: setting.into(),
            signature,
            unpacker,
            func: Arc::new(func),
        }
    }

    pub fn setting(&self) -> &str {
        &self.setting
    }

    pub fn signature(&self) -> &TypeSignature {
        &self.signature
    }

    pub fn unpacker(&self) -> &Unpacker {
        &self.unpacker
    }

    /// Run one call against `object`.
    pub fn handle(&self, object: &T, value: &TaggedValue) -> Result<TaggedValue> {
        let args = self
            .unpacker
            .unpack(value)
            .map_err(|e| LabradError::ArgumentUnpack {
                setting: self.setting.clone(),
                signature: self.signature.to_string(),
                type_tag: value.type_tag().to_string(),
                reason: e.reason,
            })?;

        debug!(
            "Invoking {}[{}] with {} argument(s)",
            self.setting,
            self.signature,
            args.len()
        );

        let reply = (self.func)(object, args)?;
        Ok(reply.into_tagged())
    }
}
