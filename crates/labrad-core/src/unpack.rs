//! Argument unpacking.
//!
//! An [`Unpacker`] is built once per handler binding and turns an inbound
//! value, already shape-checked by the dispatcher, into the ordered native
//! arguments the bound callable expects. Each position uses one rule from the
//! closed [`Extract`] set.

use crate::data::{TaggedValue, TypeSignature};
use crate::error::{LabradError, Result};
use thiserror::Error;

/// Content extraction failed on a value whose shape was accepted.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{reason}")]
pub struct UnpackError {
    pub reason: String,
}

impl UnpackError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Per-position extraction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// Hand the tagged value through untouched.
    Passthrough,
    Bool,
    Int,
    Word,
    Value,
    Str,
    Bytes,
    IntList,
    ValueList,
    StrList,
}

impl Extract {
    /// Default rule for a declared element type.
    pub fn for_signature(signature: &TypeSignature) -> Self {
        match signature {
            TypeSignature::Bool => Extract::Bool,
            TypeSignature::Int => Extract::Int,
            TypeSignature::Word => Extract::Word,
            TypeSignature::Value => Extract::Value,
            TypeSignature::Str => Extract::Str,
            TypeSignature::Bytes => Extract::Bytes,
            TypeSignature::List(element) => match element.as_ref() {
                TypeSignature::Int => Extract::IntList,
                TypeSignature::Value => Extract::ValueList,
                TypeSignature::Str => Extract::StrList,
                _ => Extract::Passthrough,
            },
            _ => Extract::Passthrough,
        }
    }

    /// Apply this rule to one value.
    pub fn apply(self, value: &TaggedValue) -> std::result::Result<Arg, UnpackError> {
        let wrong = |expected: &str| {
            UnpackError::new(format!("expected {}, got {}", expected, value.type_tag()))
        };
        match self {
            Extract::Passthrough => Ok(Arg::Raw(value.clone())),
            Extract::Bool => value.as_bool().map(Arg::Bool).ok_or_else(|| wrong("b")),
            Extract::Int => value.as_int().map(Arg::Int).ok_or_else(|| wrong("i")),
            Extract::Word => value.as_word().map(Arg::Word).ok_or_else(|| wrong("w")),
            Extract::Value => value.as_value().map(Arg::Value).ok_or_else(|| wrong("v")),
            Extract::Str => value
                .as_str()
                .map(|s| Arg::Str(s.to_string()))
                .ok_or_else(|| wrong("s")),
            Extract::Bytes => value
                .as_bytes()
                .map(|b| Arg::Bytes(b.to_vec()))
                .ok_or_else(|| wrong("y")),
            Extract::IntList => collect_list(value, TaggedValue::as_int)
                .map(Arg::IntList)
                .ok_or_else(|| wrong("*i")),
            Extract::ValueList => collect_list(value, TaggedValue::as_value)
                .map(Arg::ValueList)
                .ok_or_else(|| wrong("*v")),
            Extract::StrList => collect_list(value, |v| v.as_str().map(str::to_string))
                .map(Arg::StrList)
                .ok_or_else(|| wrong("*s")),
        }
    }
}

fn collect_list<T>(value: &TaggedValue, extract: impl Fn(&TaggedValue) -> Option<T>) -> Option<Vec<T>> {
    value.as_list()?.iter().map(extract).collect()
}

/// One native argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Bool(bool),
    Int(i32),
    Word(u32),
    Value(f64),
    Str(String),
    Bytes(Vec<u8>),
    IntList(Vec<i32>),
    ValueList(Vec<f64>),
    StrList(Vec<String>),
    Raw(TaggedValue),
}

/// Ordered argument list handed to a setting's callable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Arg>);

impl Args {
    pub fn new(args: Vec<Arg>) -> Self {
        Self(args)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.0.get(index)
    }

    pub fn into_inner(self) -> Vec<Arg> {
        self.0
    }

    fn fetch<'a, T>(&'a self, index: usize, kind: &str, pick: impl Fn(&'a Arg) -> Option<T>) -> Result<T> {
        self.0
            .get(index)
            .and_then(pick)
            .ok_or_else(|| LabradError::InvalidParams {
                message: format!("argument {} is not {}", index, kind),
            })
    }

    pub fn bool(&self, index: usize) -> Result<bool> {
        self.fetch(index, "a bool", |a| match a {
            Arg::Bool(b) => Some(*b),
            _ => None,
        })
    }

    pub fn int(&self, index: usize) -> Result<i32> {
        self.fetch(index, "an int", |a| match a {
            Arg::Int(i) => Some(*i),
            _ => None,
        })
    }

    pub fn word(&self, index: usize) -> Result<u32> {
        self.fetch(index, "a word", |a| match a {
            Arg::Word(w) => Some(*w),
            _ => None,
        })
    }

    pub fn value(&self, index: usize) -> Result<f64> {
        self.fetch(index, "a value", |a| match a {
            Arg::Value(v) => Some(*v),
            _ => None,
        })
    }

    pub fn str(&self, index: usize) -> Result<&str> {
        self.fetch(index, "a string", |a| match a {
            Arg::Str(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn bytes(&self, index: usize) -> Result<&[u8]> {
        self.fetch(index, "bytes", |a| match a {
            Arg::Bytes(b) => Some(b.as_slice()),
            _ => None,
        })
    }

    pub fn int_list(&self, index: usize) -> Result<&[i32]> {
        self.fetch(index, "an int list", |a| match a {
            Arg::IntList(l) => Some(l.as_slice()),
            _ => None,
        })
    }

    pub fn value_list(&self, index: usize) -> Result<&[f64]> {
        self.fetch(index, "a value list", |a| match a {
            Arg::ValueList(l) => Some(l.as_slice()),
            _ => None,
        })
    }

    pub fn str_list(&self, index: usize) -> Result<&[String]> {
        self.fetch(index, "a string list", |a| match a {
            Arg::StrList(l) => Some(l.as_slice()),
            _ => None,
        })
    }

    pub fn raw(&self, index: usize) -> Result<&TaggedValue> {
        self.fetch(index, "a tagged value", |a| match a {
            Arg::Raw(v) => Some(v),
            _ => None,
        })
    }
}

/// Extraction plan for one handler binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Unpacker {
    /// No arguments; the payload is ignored.
    Zero,
    /// The whole value is one argument.
    Single(Extract),
    /// The value is an N-cluster, one rule per element.
    Multi(Vec<Extract>),
}

impl Unpacker {
    /// Plan that passes the whole value through as one raw argument.
    pub fn passthrough() -> Self {
        Unpacker::Single(Extract::Passthrough)
    }

    /// Plan for N positional rules. Zero or one rule collapse to the
    /// corresponding smaller arity.
    pub fn multi(rules: impl IntoIterator<Item = Extract>) -> Self {
        let mut rules: Vec<Extract> = rules.into_iter().collect();
        match rules.len() {
            0 => Unpacker::Zero,
            1 => Unpacker::Single(rules.remove(0)),
            _ => Unpacker::Multi(rules),
        }
    }

    /// Default plan derived from a signature: empty takes nothing, an
    /// N-cluster (N > 1) is spread across N arguments, anything else is one
    /// argument.
    pub fn for_signature(signature: &TypeSignature) -> Self {
        match signature {
            TypeSignature::Empty => Unpacker::Zero,
            TypeSignature::Cluster(elements) if elements.len() > 1 => {
                Unpacker::Multi(elements.iter().map(Extract::for_signature).collect())
            }
            other => Unpacker::Single(Extract::for_signature(other)),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Unpacker::Zero => 0,
            Unpacker::Single(_) => 1,
            Unpacker::Multi(rules) => rules.len(),
        }
    }

    /// Convert `value` into native arguments. Read-only; repeated calls on
    /// the same value give equal results.
    pub fn unpack(&self, value: &TaggedValue) -> std::result::Result<Args, UnpackError> {
        match self {
            Unpacker::Zero => Ok(Args::default()),
            Unpacker::Single(rule) => Ok(Args(vec![rule.apply(value)?])),
            Unpacker::Multi(rules) => {
                let elements = value.as_cluster().ok_or_else(|| {
                    UnpackError::new(format!(
                        "expected a cluster of {}, got {}",
                        rules.len(),
                        value.type_tag()
                    ))
                })?;
                if elements.len() != rules.len() {
                    return Err(UnpackError::new(format!(
                        "expected a cluster of {}, got {} elements",
                        rules.len(),
                        elements.len()
                    )));
                }
                rules
                    .iter()
                    .zip(elements)
                    .enumerate()
                    .map(|(index, (rule, element))| {
                        rule.apply(element).map_err(|e| {
                            UnpackError::new(format!("element {}: {}", index, e.reason))
                        })
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map(Args)
            }
        }
    }
}
