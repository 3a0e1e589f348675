//! Reducers: pure `(state, action) -> state` transitions.
//!
//! [`FormReducer`] is the meta-reducer that handles
//! [`Action::UpdateForm`](super::Action::UpdateForm) and then delegates every
//! action to the wrapped application reducer.

use super::action::Action;
use super::state::StoreState;

/// A state transition.
pub trait Reducer {
    fn reduce(&self, state: StoreState, action: &Action) -> StoreState;
}

impl<F> Reducer for F
where
    F: Fn(StoreState, &Action) -> StoreState,
{
    fn reduce(&self, state: StoreState, action: &Action) -> StoreState {
        self(state, action)
    }
}

/// Reducer that returns the state unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Reducer for Identity {
    fn reduce(&self, state: StoreState, _action: &Action) -> StoreState {
        state
    }
}

/// Applies form updates, then runs `inner`.
#[derive(Clone, Debug, Default)]
pub struct FormReducer<R> {
    inner: R,
}

impl<R: Reducer> FormReducer<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Reducer> Reducer for FormReducer<R> {
    fn reduce(&self, state: StoreState, action: &Action) -> StoreState {
        let state = match action {
            Action::UpdateForm(payload) => match state.apply_update(payload) {
                Ok(next) => next,
                Err(reason) => {
                    tracing::warn!(%reason, "form update dropped");
                    state
                }
            },
            Action::Custom { .. } => state,
        };
        self.inner.reduce(state, action)
    }
}

/// Wrap an application reducer with form-update handling.
pub fn form_reducer<R: Reducer>(inner: R) -> FormReducer<R> {
    FormReducer::new(inner)
}
