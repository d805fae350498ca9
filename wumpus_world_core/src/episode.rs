use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use crate::{Mdp, State, agent::Agent, error::WorldError, world::GridWorldMdp};

/// What happened over one episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub steps: usize,
    pub total_reward: f64,
    /// `false` when the episode was cut off by the step limit.
    pub terminated: bool,
    pub final_state: State,
}

/// Drives `agent` from `start` until a terminal transition or `max_steps`.
pub fn run_episode<A, R>(
    world: &GridWorldMdp,
    agent: &mut A,
    start: State,
    max_steps: usize,
    rng: &mut R,
) -> Result<EpisodeSummary, WorldError>
where
    A: Agent + ?Sized,
    R: Rng + ?Sized,
{
    let span = info_span!("episode", %start, max_steps);
    let _guard = span.enter();

    let mut state = start;
    let mut total_reward = 0.0;
    let mut steps = 0;
    let mut terminated = false;

    while steps < max_steps {
        let legal = world.actions_at(&state);
        let action = agent.choose_action(world, &state, &legal);
        let step = world.act(&state, action, rng)?;
        steps += 1;
        total_reward += step.reward;
        debug!(steps, %action, next = %step.next_state, reward = step.reward, "step");
        state = step.next_state;
        if step.is_terminal {
            terminated = true;
            break;
        }
    }

    info!(steps, total_reward, terminated, "episode finished");
    Ok(EpisodeSummary {
        steps,
        total_reward,
        terminated,
        final_state: state,
    })
}
