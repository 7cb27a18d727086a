//! Registration descriptors advertised to the directory.

use crate::data::{SettingId, TaggedValue};
use crate::setting::Setting;
use serde::{Deserialize, Serialize};

/// The record a server sends to the directory for one setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationDescriptor {
    pub id: SettingId,
    pub name: String,
    pub doc: String,
    pub accepts: Vec<String>,
    pub returns: Vec<String>,
    pub notes: String,
}

impl RegistrationDescriptor {
    /// Project setting metadata into a descriptor. Signature order is kept.
    pub fn from_setting(setting: &Setting) -> Self {
        Self {
            id: setting.id,
            name: setting.name.clone(),
            doc: setting.doc.clone(),
            accepts: setting.accepts.iter().map(ToString::to_string).collect(),
            returns: setting.returns.iter().map(ToString::to_string).collect(),
            notes: setting.notes.clone(),
        }
    }

    /// Tagged form `(w, s, s, *s, *s, s)`.
    pub fn to_tagged(&self) -> TaggedValue {
        let strings = |items: &[String]| {
            TaggedValue::list(items.iter().map(|s| TaggedValue::Str(s.clone())))
        };
        TaggedValue::cluster([
            TaggedValue::Word(self.id.0),
            TaggedValue::Str(self.name.clone()),
            TaggedValue::Str(self.doc.clone()),
            strings(&self.accepts),
            strings(&self.returns),
            TaggedValue::Str(self.notes.clone()),
        ])
    }
}

/// Free-function form of [`RegistrationDescriptor::from_setting`].
pub fn describe(setting: &Setting) -> RegistrationDescriptor {
    RegistrationDescriptor::from_setting(setting)
}
