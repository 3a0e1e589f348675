//! Actions accepted by the store and the outcome of dispatching them.

use formsync_core::FieldValue;

use super::state::{DropReason, UpdatePayload};

/// An event dispatched to the store.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Replace one field-group's form state.
    UpdateForm(UpdatePayload),
    /// Application-defined action, handled only by user reducers.
    Custom { kind: String, payload: FieldValue },
}

impl Action {
    /// Type tag of [`Action::UpdateForm`].
    pub const UPDATE_FORM: &'static str = "[formsync] Update Form";

    #[must_use]
    pub fn custom(kind: impl Into<String>, payload: impl Into<FieldValue>) -> Self {
        Self::Custom {
            kind: kind.into(),
            payload: payload.into(),
        }
    }

    /// Type tag used in logs.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::UpdateForm(_) => Self::UPDATE_FORM,
            Self::Custom { kind, .. } => kind,
        }
    }
}

impl From<UpdatePayload> for Action {
    fn from(payload: UpdatePayload) -> Self {
        Self::UpdateForm(payload)
    }
}

/// Result of [`Store::dispatch`](super::Store::dispatch).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The action was reduced and the new state published.
    Applied,
    /// A dispatch was already in progress; the action runs after it.
    Queued,
    /// The update addressed an unregistered slice and changed nothing.
    Dropped(DropReason),
}

impl DispatchOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    #[must_use]
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped(_))
    }
}
