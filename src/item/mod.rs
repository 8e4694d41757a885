//! List item lifecycle.
//!
//! An item is created in [`ItemState::Todo`], moved into [`ItemState::Edit`]
//! while its text is being changed, and can be marked [`ItemState::Done`] or
//! undone at any point. The only enforced rule is that new text is accepted
//! while the item is in `Edit`, and accepting it returns the item to `Todo`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier assigned by the store on creation.
pub type ItemId = i64;

/// Lifecycle state of a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Todo,
    Edit,
    Done,
}

impl ItemState {
    pub const ALL: [ItemState; 3] = [ItemState::Todo, ItemState::Edit, ItemState::Done];

    /// Persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Todo => "todo",
            ItemState::Edit => "edit",
            ItemState::Done => "done",
        }
    }

    /// Whether a text update is allowed from this state.
    pub fn accepts_text(&self) -> bool {
        matches!(self, ItemState::Edit)
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown item state '{0}'")]
pub struct ParseStateError(pub String);

impl FromStr for ItemState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(ItemState::Todo),
            "edit" => Ok(ItemState::Edit),
            "done" => Ok(ItemState::Done),
            other => Err(ParseStateError(other.to_string())),
        }
    }
}

/// A list item as handed out by the store.
///
/// This is a plain value: mutating it does not touch storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: ItemId,
    pub text: String,
    pub state: ItemState,
}

impl ListItem {
    pub fn new(id: ItemId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            state: ItemState::Todo,
        }
    }

    /// Overwrite the state. No transition check.
    pub fn set_state(&mut self, state: ItemState) {
        self.state = state;
    }

    /// Replace the text if the item is being edited, returning it to `Todo`.
    ///
    /// On error the item is left untouched.
    pub fn submit_text(&mut self, text: impl Into<String>) -> Result<(), ItemError> {
        if !self.state.accepts_text() {
            return Err(ItemError::NotInEditState {
                id: self.id,
                state: self.state,
            });
        }
        self.text = text.into();
        self.state = ItemState::Todo;
        Ok(())
    }
}

/// Recoverable item failures, rendered as dialogs by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("Item {id} not found")]
    NotFound { id: ItemId },

    #[error("Item {id} is in state '{state}', expected 'edit'")]
    NotInEditState { id: ItemId, state: ItemState },
}

impl ItemError {
    pub fn item_id(&self) -> ItemId {
        match self {
            ItemError::NotFound { id } | ItemError::NotInEditState { id, .. } => *id,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ItemError::NotFound { .. } => "item_not_found",
            ItemError::NotInEditState { .. } => "item_not_in_edit_state",
        }
    }
}
