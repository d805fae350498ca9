use rand::Rng;
use serde::{Deserialize, Serialize};

/// The result of a single transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step<S> {
    pub next_state: S,
    pub reward: f64,
    pub is_terminal: bool,
}

/// A finite Markov decision process.
///
/// The action space is split in two: `actions` is the global set a planner can
/// enumerate once, `actions_at` is what is legal from a particular state.
pub trait Mdp {
    type State: Copy + Eq;
    type Action: Copy + Eq;
    type Error;

    /// Every state of the process, in a deterministic order.
    fn states(&self) -> impl Iterator<Item = Self::State> + '_;

    /// Every action symbol, independent of state.
    fn actions(&self) -> &[Self::Action];

    /// The actions legal from `state`; always a subset of `actions`.
    fn actions_at(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Applies `action` in `state`, drawing any randomness from `rng`.
    ///
    /// Fails if `action` is not in `actions_at(state)`.
    fn act<R>(
        &self,
        state: &Self::State,
        action: Self::Action,
        rng: &mut R,
    ) -> Result<Step<Self::State>, Self::Error>
    where
        R: Rng + ?Sized;
}
