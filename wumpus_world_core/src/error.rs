use crate::{Action, State, map::GridError, world::ObjectKind};

/// Errors raised while building a world or stepping through it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    #[error("Action {action:?} is not legal in state {state}")]
    InvalidAction { action: Action, state: State },

    #[error("Unknown action symbol '{0}'")]
    UnknownAction(String),

    #[error("World dimensions {width}x{height} must both be non-zero")]
    EmptyWorld { width: usize, height: usize },

    #[error("World dimensions {width}x{height} are too large to allocate")]
    OversizedWorld { width: usize, height: usize },

    #[error("State {state} lies outside the {width}x{height} world")]
    InvalidState {
        state: State,
        width: usize,
        height: usize,
    },

    #[error("Cannot place {kind}: {source}")]
    MalformedWorld {
        kind: ObjectKind,
        #[source]
        source: GridError,
    },

    #[error("Move probabilities {intended}/{slip}/{slip} must be non-negative and sum to 1")]
    InvalidMoveModel { intended: f64, slip: f64 },

    #[error("Map format error: {0}")]
    MapFormat(String),
}
