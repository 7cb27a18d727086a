//! Tagged values and type signatures.
//!
//! `TaggedValue` is the self-describing value carried on the wire: it always
//! knows its own runtime type. `TypeSignature` is the structural pattern that
//! settings declare for what they accept and return. Tags render in the
//! protocol's compact notation:
//!
//! ```text
//! _  empty        b  bool        i  int32       w  uint32
//! v  float64      s  string      y  bytes       ?  anything
//! (ii)  cluster of two ints      *v  list of floats
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directory-assigned server identifier, valid for one directory session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(pub u32);

/// Numeric setting identifier, unique within one server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingId(pub u32);

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SettingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structural pattern over tagged values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeSignature {
    Empty,
    Bool,
    Int,
    Word,
    Value,
    Str,
    Bytes,
    Cluster(Vec<TypeSignature>),
    List(Box<TypeSignature>),
    Any,
}

impl TypeSignature {
    /// Cluster pattern from its element patterns.
    pub fn cluster(elements: impl IntoIterator<Item = TypeSignature>) -> Self {
        TypeSignature::Cluster(elements.into_iter().collect())
    }

    /// Homogeneous list pattern.
    pub fn list(element: TypeSignature) -> Self {
        TypeSignature::List(Box::new(element))
    }

    /// Number of positional arguments a value of this shape carries when
    /// unpacked: 0 for empty, N for an N-cluster, 1 for everything else.
    pub fn arity(&self) -> usize {
        match self {
            TypeSignature::Empty => 0,
            TypeSignature::Cluster(elements) if elements.len() > 1 => elements.len(),
            _ => 1,
        }
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Empty => f.write_str("_"),
            TypeSignature::Bool => f.write_str("b"),
            TypeSignature::Int => f.write_str("i"),
            TypeSignature::Word => f.write_str("w"),
            TypeSignature::Value => f.write_str("v"),
            TypeSignature::Str => f.write_str("s"),
            TypeSignature::Bytes => f.write_str("y"),
            TypeSignature::Any => f.write_str("?"),
            TypeSignature::List(element) => write!(f, "*{}", element),
            TypeSignature::Cluster(elements) => {
                f.write_str("(")?;
                for element in elements {
                    write!(f, "{}", element)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A self-describing value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaggedValue {
    Empty,
    Bool(bool),
    Int(i32),
    Word(u32),
    Value(f64),
    Str(String),
    Bytes(Vec<u8>),
    Cluster(Vec<TaggedValue>),
    List(Vec<TaggedValue>),
}

impl Default for TaggedValue {
    fn default() -> Self {
        TaggedValue::EMPTY
    }
}

impl TaggedValue {
    /// The canonical empty value, also used as the void return.
    pub const EMPTY: TaggedValue = TaggedValue::Empty;

    pub fn cluster(elements: impl IntoIterator<Item = TaggedValue>) -> Self {
        TaggedValue::Cluster(elements.into_iter().collect())
    }

    pub fn list(elements: impl IntoIterator<Item = TaggedValue>) -> Self {
        TaggedValue::List(elements.into_iter().collect())
    }

    /// Runtime type of this value.
    ///
    /// An empty list reports `*?`; a non-empty list reports the type of its
    /// first element.
    pub fn type_tag(&self) -> TypeSignature {
        match self {
            TaggedValue::Empty => TypeSignature::Empty,
            TaggedValue::Bool(_) => TypeSignature::Bool,
            TaggedValue::Int(_) => TypeSignature::Int,
            TaggedValue::Word(_) => TypeSignature::Word,
            TaggedValue::Value(_) => TypeSignature::Value,
            TaggedValue::Str(_) => TypeSignature::Str,
            TaggedValue::Bytes(_) => TypeSignature::Bytes,
            TaggedValue::Cluster(elements) => {
                TypeSignature::Cluster(elements.iter().map(TaggedValue::type_tag).collect())
            }
            TaggedValue::List(elements) => TypeSignature::list(
                elements
                    .first()
                    .map(TaggedValue::type_tag)
                    .unwrap_or(TypeSignature::Any),
            ),
        }
    }

    pub fn is_empty_value(&self) -> bool {
        matches!(self, TaggedValue::Empty)
    }

    /// Positional access into a cluster or list.
    pub fn get(&self, index: usize) -> Option<&TaggedValue> {
        match self {
            TaggedValue::Cluster(elements) | TaggedValue::List(elements) => elements.get(index),
            _ => None,
        }
    }

    /// Number of elements of a cluster or list, `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            TaggedValue::Cluster(elements) | TaggedValue::List(elements) => Some(elements.len()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TaggedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            TaggedValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_word(&self) -> Option<u32> {
        match self {
            TaggedValue::Word(w) => Some(*w),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<f64> {
        match self {
            TaggedValue::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TaggedValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TaggedValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TaggedValue]> {
        match self {
            TaggedValue::List(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn as_cluster(&self) -> Option<&[TaggedValue]> {
        match self {
            TaggedValue::Cluster(elements) => Some(elements),
            _ => None,
        }
    }
}

impl From<bool> for TaggedValue {
    fn from(b: bool) -> Self {
        TaggedValue::Bool(b)
    }
}

impl From<i32> for TaggedValue {
    fn from(i: i32) -> Self {
        TaggedValue::Int(i)
    }
}

impl From<u32> for TaggedValue {
    fn from(w: u32) -> Self {
        TaggedValue::Word(w)
    }
}

impl From<f64> for TaggedValue {
    fn from(v: f64) -> Self {
        TaggedValue::Value(v)
    }
}

impl From<&str> for TaggedValue {
    fn from(s: &str) -> Self {
        TaggedValue::Str(s.to_string())
    }
}

impl From<String> for TaggedValue {
    fn from(s: String) -> Self {
        TaggedValue::Str(s)
    }
}

impl<T: Into<TaggedValue>> From<Vec<T>> for TaggedValue {
    fn from(items: Vec<T>) -> Self {
        TaggedValue::List(items.into_iter().map(Into::into).collect())
    }
}
