use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
};

use rand::{SeedableRng, rngs::StdRng, seq::IndexedRandom};

use crate::{Action, Direction, ObjectKind, Position, State, world::GridWorldMdp};

/// Trait defining the behavior of an agent.
/// Agents pick one of the legal actions for the state they are in.
pub trait Agent {
    /// `&mut self` allows the agent to keep internal state between steps.
    /// `legal` is never empty.
    fn choose_action(&mut self, world: &GridWorldMdp, state: &State, legal: &[Action]) -> Action;
}

/// Picks uniformly among the legal actions.
#[derive(Debug)]
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn choose_action(&mut self, _world: &GridWorldMdp, _state: &State, legal: &[Action]) -> Action {
        legal.choose(&mut self.rng).copied().unwrap_or(Action::Up)
    }
}

/// Heads for gold, then for a goal, planning on the noise-free grid.
///
/// Wumpus cells are treated as walls until immunity has been collected,
/// unless the cell is also a goal the agent can score. When
/// no wumpus-free route exists the agent fetches immunity first. The plan is
/// rebuilt every step since moves may slip.
#[derive(Debug, Default)]
pub struct PlanningAgent {}

impl PlanningAgent {
    pub fn new() -> Self {
        Self {}
    }

    /// Returns manhattan distance between two positions
    fn manhattan_distance(a: &Position, b: &Position) -> usize {
        a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
    }

    /// Converts a move between two adjacent positions into an Action
    fn position_to_action(src: &Position, dst: &Position) -> Option<Action> {
        let dx = dst.x as isize - src.x as isize;
        let dy = dst.y as isize - src.y as isize;

        [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ]
        .into_iter()
        .find(|d| d.delta() == (dx, dy))
        .map(Action::from)
    }

    /// A* pathfinding implementation
    fn a_star_path(
        start: Position,
        goal: Position,
        world: &GridWorldMdp,
        state: &State,
    ) -> Option<Vec<Position>> {
        // For priority queue
        #[derive(Clone, Eq, PartialEq)]
        struct PrioritizedItem {
            priority: usize,
            position: Position,
        }

        impl Ord for PrioritizedItem {
            fn cmp(&self, other: &Self) -> Ordering {
                // Reverse ordering for min-heap behavior
                other.priority.cmp(&self.priority)
            }
        }

        impl PartialOrd for PrioritizedItem {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        let mut frontier = BinaryHeap::new();
        let mut came_from: HashMap<Position, Position> = HashMap::new();
        let mut cost_so_far: HashMap<Position, usize> = HashMap::new();

        frontier.push(PrioritizedItem {
            priority: 0,
            position: start,
        });
        cost_so_far.insert(start, 0);

        let mut goal_reached = false;

        while let Some(PrioritizedItem {
            position: current, ..
        }) = frontier.pop()
        {
            if current == goal {
                goal_reached = true;
                break;
            }

            let current_cost = cost_so_far.get(&current).copied().unwrap_or(usize::MAX);
            for neighbor in Self::passable_neighbors(&current, world, state) {
                let new_cost = current_cost.saturating_add(1);
                let better = cost_so_far
                    .get(&neighbor)
                    .is_none_or(|&known| new_cost < known);
                if better {
                    cost_so_far.insert(neighbor, new_cost);
                    let priority = new_cost + Self::manhattan_distance(&neighbor, &goal);
                    frontier.push(PrioritizedItem {
                        priority,
                        position: neighbor,
                    });
                    came_from.insert(neighbor, current);
                }
            }
        }

        if !goal_reached {
            return None;
        }

        // Reconstruct path
        let mut path = vec![goal];
        let mut current = goal;
        while current != start {
            current = *came_from.get(&current)?;
            path.push(current);
        }

        path.reverse();
        Some(path)
    }

    /// In-bounds orthogonal neighbours that do not end the episode badly.
    ///
    /// A wumpus cell is passable with immunity, or when it is also a goal
    /// and the agent carries gold, since the goal is scored first.
    fn passable_neighbors(
        position: &Position,
        world: &GridWorldMdp,
        state: &State,
    ) -> Vec<Position> {
        [
            Direction::Down,
            Direction::Up,
            Direction::Right,
            Direction::Left,
        ]
        .into_iter()
        .filter_map(|direction| {
            let (dx, dy) = direction.delta();
            let neighbor = Position {
                x: position.x.checked_add_signed(dx)?,
                y: position.y.checked_add_signed(dy)?,
            };
            if !world.contains(neighbor) {
                return None;
            }
            let delivers = state.has_gold && world.goal_at(neighbor).is_some();
            if world.wumpus_at(neighbor).is_some() && !state.has_immunity && !delivers {
                return None;
            }
            Some(neighbor)
        })
        .collect()
    }

    /// Plans to the nearest target from a list of positions
    fn plan_to_nearest_target(
        start: Position,
        targets: &[Position],
        world: &GridWorldMdp,
        state: &State,
    ) -> Option<Vec<Position>> {
        targets
            .iter()
            .filter_map(|target| Self::a_star_path(start, *target, world, state))
            .min_by_key(|plan| plan.len())
    }

    fn first_move(plan: &[Position]) -> Option<Action> {
        match plan {
            [from, to, ..] => Self::position_to_action(from, to),
            _ => None,
        }
    }
}

impl Agent for PlanningAgent {
    fn choose_action(&mut self, world: &GridWorldMdp, state: &State, legal: &[Action]) -> Action {
        // 1. Collect anything underfoot
        if legal.contains(&Action::PickUp) {
            return Action::PickUp;
        }

        let current_pos = state.pos();
        let targets = if state.has_gold {
            world.positions_of(ObjectKind::Goal)
        } else {
            world.positions_of(ObjectKind::Gold)
        };

        // 2. Head for the primary target
        let plan = Self::plan_to_nearest_target(current_pos, &targets, world, state);
        if let Some(action) = plan.as_deref().and_then(Self::first_move) {
            return action;
        }

        // 3. Primary target blocked by the wumpus: fetch immunity
        if !state.has_immunity {
            let immunity = world.positions_of(ObjectKind::Immunity);
            let plan = Self::plan_to_nearest_target(current_pos, &immunity, world, state);
            if let Some(action) = plan.as_deref().and_then(Self::first_move) {
                return action;
            }
        }

        // 4. Nothing reachable, take any legal move
        legal
            .iter()
            .copied()
            .find(|a| a.direction().is_some())
            .unwrap_or(Action::Up)
    }
}
