use serde::{Deserialize, Serialize};

/// Represents optional field semantics in partial updates.
///
/// - `Unchanged` → field not touched
/// - `SetToNull` → explicitly null
/// - `SetToValue` → set to provided value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum OptionField<T> {
    #[default]
    Unchanged,
    SetToNull,
    SetToValue(T),
}

impl<T> OptionField<T> {
    /// Convert to nested option:
    /// - `None` → unchanged
    /// - `Some(None)` → set null
    /// - `Some(Some(T))` → set to value
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Self::Unchanged => None,
            Self::SetToNull => Some(None),
            Self::SetToValue(v) => Some(Some(v)),
        }
    }
}

pub type PatchString = OptionField<String>;
