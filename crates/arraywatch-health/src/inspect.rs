//! The seam to the hardware inspection library.
//!
//! The library is reached through an [`Inspector`] that opens a
//! [`Session`] per target. A session lists the objects of one component
//! kind; each object exposes named attributes read by value. Nothing here
//! knows what an attribute means. The rules live in [`crate::catalog`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use arraywatch_core::Target;

use crate::catalog::CheckKind;
use crate::error::InspectResult;

/// Opens inspection sessions. Shared by every check task in a round.
pub trait Inspector: Send + Sync {
    fn connect(&self, target: &Target) -> InspectResult<Box<dyn Session>>;
}

/// A connected inspection session for one target.
pub trait Session: Send {
    /// Display name the subsystem reports for itself.
    fn system_name(&self) -> String;

    /// All objects of the given component kind.
    fn list_objects(&mut self, kind: CheckKind) -> InspectResult<Vec<InspectedObject>>;
}

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl AttrValue {
    /// Truthiness of a flag attribute: `true`, a non-zero integer, or the
    /// text `true` in any case.
    pub fn is_true(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Text(s) => s.eq_ignore_ascii_case("true"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

/// One inspected component.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InspectedObject {
    pub index: u32,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, AttrValue>,
}

impl InspectedObject {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// Attribute rendered as text, or `N/A` when absent.
    pub fn display(&self, name: &str) -> String {
        self.get(name)
            .map(ToString::to_string)
            .unwrap_or_else(|| "N/A".to_string())
    }
}
