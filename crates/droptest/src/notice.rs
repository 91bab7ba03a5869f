//! Non-fatal advisories returned next to generated values.
//!
//! Generators never fail on finite, well-typed input. When a result is usable but
//! degraded (possible duplicate rows, a rejected edit that fell back to the prior value,
//! an import entry that was coerced) the caller receives a `Notice` and decides how to
//! surface it.

use serde::Serialize;
use std::fmt;

/// Advisory attached to a generated value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notice {
    /// More DOE rows requested than distinct rows exist (`26^repeat`).
    Capacity {
        repeat: usize,
        doe: usize,
        unique_rows: u128,
    },
    /// Row `row` is still an entry-wise duplicate after the bounded perturbation pass.
    StillDuplicate { row: usize },
    /// A field value was rejected or replaced by a safe default.
    Validation { field: String, message: String },
    /// An imported entry was coerced.
    Import { index: usize, message: String },
}

impl Notice {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Informational notices do not indicate degraded output.
    pub fn is_informational(&self) -> bool {
        matches!(self, Notice::Import { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Capacity {
                repeat,
                doe,
                unique_rows,
            } => write!(
                f,
                "{doe} DOE rows requested but only {unique_rows} distinct rows exist \
                 for repeat={repeat}; duplicates are possible"
            ),
            Notice::StillDuplicate { row } => {
                write!(f, "row {row} is still a duplicate after the bounded uniqueness pass")
            }
            Notice::Validation { field, message } => write!(f, "{field}: {message}"),
            Notice::Import { index, message } => write!(f, "import entry {index}: {message}"),
        }
    }
}

/// A value plus the advisories produced while building it.
#[derive(Clone, Debug, PartialEq)]
pub struct Generated<T> {
    pub value: T,
    pub notices: Vec<Notice>,
}

impl<T> Generated<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            notices: Vec::new(),
        }
    }

    pub fn with_notices(value: T, notices: Vec<Notice>) -> Self {
        Self { value, notices }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Generated<U> {
        Generated {
            value: f(self.value),
            notices: self.notices,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.notices.is_empty()
    }
}
