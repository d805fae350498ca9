use std::fmt;

use itertools::iproduct;
use rand::{
    Rng,
    distr::{Distribution, weighted::WeightedIndex},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    Action, Direction, Position, State,
    error::WorldError,
    map::Grid,
    mdp::{Mdp, Step},
};

const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// The kinds of object a cell can hold. One cell may hold several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Pit,
    Gold,
    Immunity,
    Goal,
    Wumpus,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Pit => "pit",
            ObjectKind::Gold => "gold",
            ObjectKind::Immunity => "immunity",
            ObjectKind::Goal => "goal",
            ObjectKind::Wumpus => "wumpus",
        };
        f.write_str(name)
    }
}

/// How an intended move is perturbed.
///
/// The intended direction is realized with probability `intended`, each of
/// the two perpendicular directions with probability `slip`.
#[derive(Debug, Clone)]
pub struct MoveModel {
    intended: f64,
    slip: f64,
    sampler: WeightedIndex<f64>,
}

impl MoveModel {
    pub fn new(intended: f64, slip: f64) -> Result<Self, WorldError> {
        let invalid = WorldError::InvalidMoveModel { intended, slip };
        if !intended.is_finite() || !slip.is_finite() || intended < 0.0 || slip < 0.0 {
            return Err(invalid);
        }
        if (intended + 2.0 * slip - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(invalid);
        }
        let sampler = WeightedIndex::new([intended, slip, slip]).map_err(|_| invalid)?;
        Ok(Self {
            intended,
            slip,
            sampler,
        })
    }

    /// Builds the model where the intended direction carries `intended` and
    /// the remainder is split evenly between the perpendicular directions.
    pub fn with_intended(intended: f64) -> Result<Self, WorldError> {
        Self::new(intended, (1.0 - intended) / 2.0)
    }

    /// Always moves in the intended direction.
    pub fn deterministic() -> Self {
        Self {
            intended: 1.0,
            slip: 0.0,
            sampler: WeightedIndex::new([1.0, 0.0, 0.0])
                .expect("a single positive weight is a valid distribution"),
        }
    }

    pub fn intended(&self) -> f64 {
        self.intended
    }

    pub fn slip(&self) -> f64 {
        self.slip
    }

    /// Probabilities aligned with [`Direction::branches`].
    pub fn weights(&self) -> [f64; 3] {
        [self.intended, self.slip, self.slip]
    }

    /// Draws the realized direction for an intended one.
    pub fn sample<R>(&self, intended: Direction, rng: &mut R) -> Direction
    where
        R: Rng + ?Sized,
    {
        intended.branches()[self.sampler.sample(rng)]
    }
}

impl Default for MoveModel {
    fn default() -> Self {
        Self::with_intended(0.7).expect("0.7/0.15/0.15 is a valid move model")
    }
}

/// One possible result of an action together with its probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub probability: f64,
    pub step: Step<State>,
}

/// Payoffs used when a map does not spell one out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rewards {
    pub goal: f64,
    pub wumpus: f64,
    pub pit: f64,
    pub gold: f64,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            goal: 10.0,
            wumpus: -10.0,
            pit: -10.0,
            gold: 0.0,
        }
    }
}

/// Settings for building a world from a text map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub step_cost: f64,
    pub intended_probability: f64,
    pub rewards: Rewards,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            step_cost: 1.0,
            intended_probability: 0.7,
            rewards: Rewards::default(),
        }
    }
}

impl WorldConfig {
    pub fn move_model(&self) -> Result<MoveModel, WorldError> {
        MoveModel::with_intended(self.intended_probability)
    }
}

/// A bounded grid with gold, immunity, goals, pits and a wumpus, and a
/// slippery movement model.
///
/// Object placements are made once with the `add_*` methods; stepping only
/// borrows the world, so one instance can back any number of episodes.
#[derive(Debug, Clone)]
pub struct GridWorldMdp {
    width: usize,
    height: usize,
    step_cost: f64,
    move_model: MoveModel,
    pits: Grid<Option<f64>>,
    gold: Grid<Option<f64>>,
    immunity: Grid<bool>,
    goals: Grid<Option<f64>>,
    wumpus: Grid<Option<f64>>,
}

impl GridWorldMdp {
    /// Creates an empty world using the default move model.
    pub fn new(width: usize, height: usize, step_cost: f64) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::EmptyWorld { width, height });
        }
        let fits = width
            .checked_mul(height)
            .and_then(|cells| cells.checked_mul(size_of::<Option<f64>>()))
            .is_some_and(|bytes| bytes <= isize::MAX as usize);
        if !fits {
            return Err(WorldError::OversizedWorld { width, height });
        }
        Ok(Self {
            width,
            height,
            step_cost,
            move_model: MoveModel::default(),
            pits: Grid::new(width, height),
            gold: Grid::new(width, height),
            immunity: Grid::new(width, height),
            goals: Grid::new(width, height),
            wumpus: Grid::new(width, height),
        })
    }

    pub fn with_move_model(mut self, move_model: MoveModel) -> Self {
        self.move_model = move_model;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn step_cost(&self) -> f64 {
        self.step_cost
    }

    pub fn move_model(&self) -> &MoveModel {
        &self.move_model
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    pub fn add_pit(&mut self, position: Position, reward: f64) -> Result<(), WorldError> {
        place(&mut self.pits, ObjectKind::Pit, position, Some(reward))
    }

    pub fn add_gold(&mut self, position: Position, reward: f64) -> Result<(), WorldError> {
        place(&mut self.gold, ObjectKind::Gold, position, Some(reward))
    }

    pub fn add_immunity(&mut self, position: Position) -> Result<(), WorldError> {
        place(&mut self.immunity, ObjectKind::Immunity, position, true)
    }

    pub fn add_goal(&mut self, position: Position, reward: f64) -> Result<(), WorldError> {
        place(&mut self.goals, ObjectKind::Goal, position, Some(reward))
    }

    pub fn add_wumpus(&mut self, position: Position, reward: f64) -> Result<(), WorldError> {
        place(&mut self.wumpus, ObjectKind::Wumpus, position, Some(reward))
    }

    /// Pits are registered but take no part in transitions.
    pub fn pit_at(&self, position: Position) -> Option<f64> {
        self.pits.get(position).copied().flatten()
    }

    pub fn gold_at(&self, position: Position) -> Option<f64> {
        self.gold.get(position).copied().flatten()
    }

    pub fn immunity_at(&self, position: Position) -> bool {
        self.immunity.get(position).copied().unwrap_or(false)
    }

    pub fn goal_at(&self, position: Position) -> Option<f64> {
        self.goals.get(position).copied().flatten()
    }

    pub fn wumpus_at(&self, position: Position) -> Option<f64> {
        self.wumpus.get(position).copied().flatten()
    }

    /// Every cell holding an object of `kind`, in row-major order.
    pub fn positions_of(&self, kind: ObjectKind) -> Vec<Position> {
        match kind {
            ObjectKind::Pit => occupied(&self.pits),
            ObjectKind::Gold => occupied(&self.gold),
            ObjectKind::Goal => occupied(&self.goals),
            ObjectKind::Wumpus => occupied(&self.wumpus),
            ObjectKind::Immunity => self
                .immunity
                .enumerate()
                .filter_map(|(pos, present)| present.then_some(pos))
                .collect(),
        }
    }

    fn gold_available(&self, state: &State) -> bool {
        !state.has_gold && self.gold_at(state.pos()).is_some()
    }

    fn immunity_available(&self, state: &State) -> bool {
        !state.has_immunity && self.immunity_at(state.pos())
    }

    /// True when `PickUp` would collect something in `state`.
    pub fn can_pick_up(&self, state: &State) -> bool {
        self.gold_available(state) || self.immunity_available(state)
    }

    fn ensure_legal(&self, state: &State, action: Action) -> Result<(), WorldError> {
        if !self.contains(state.pos()) {
            return Err(WorldError::InvalidState {
                state: *state,
                width: self.width,
                height: self.height,
            });
        }
        if action == Action::PickUp && !self.can_pick_up(state) {
            return Err(WorldError::InvalidAction {
                action,
                state: *state,
            });
        }
        Ok(())
    }

    /// Resolves a move whose direction has already been realized.
    pub fn resolve_move(&self, state: &State, realized: Direction) -> Step<State> {
        let (dx, dy) = realized.delta();
        let next_state = State {
            x: state.x.saturating_add_signed(dx).min(self.width - 1),
            y: state.y.saturating_add_signed(dy).min(self.height - 1),
            ..*state
        };
        let pos = next_state.pos();

        if next_state.has_gold {
            if let Some(reward) = self.goal_at(pos) {
                return Step {
                    next_state,
                    reward,
                    is_terminal: true,
                };
            }
        }
        if !next_state.has_immunity {
            if let Some(reward) = self.wumpus_at(pos) {
                return Step {
                    next_state,
                    reward,
                    is_terminal: true,
                };
            }
        }
        if self.pit_at(pos).is_some() {
            trace!(%pos, "entered a pit, which carries no transition effect");
        }
        Step {
            next_state,
            reward: -self.step_cost,
            is_terminal: false,
        }
    }

    /// Collects the item underfoot. Gold takes precedence over immunity.
    fn pick_up(&self, state: &State) -> Step<State> {
        let pos = state.pos();
        if self.gold_available(state) {
            Step {
                next_state: State {
                    has_gold: true,
                    ..*state
                },
                reward: self.gold_at(pos).unwrap_or_default(),
                is_terminal: false,
            }
        } else {
            Step {
                next_state: State {
                    has_immunity: true,
                    ..*state
                },
                reward: -self.step_cost,
                is_terminal: false,
            }
        }
    }

    /// Lists every possible result of `action` in `state` with its probability.
    ///
    /// Slips that clamp into the same cell are merged into one outcome.
    pub fn outcomes(&self, state: &State, action: Action) -> Result<Vec<Outcome>, WorldError> {
        self.ensure_legal(state, action)?;
        let Some(intended) = action.direction() else {
            return Ok(vec![Outcome {
                probability: 1.0,
                step: self.pick_up(state),
            }]);
        };

        let mut outcomes: Vec<Outcome> = Vec::with_capacity(3);
        let branches = intended.branches().into_iter().zip(self.move_model.weights());
        for (realized, probability) in branches {
            if probability <= 0.0 {
                continue;
            }
            let step = self.resolve_move(state, realized);
            match outcomes
                .iter_mut()
                .find(|o| o.step.next_state == step.next_state)
            {
                Some(existing) => existing.probability += probability,
                None => outcomes.push(Outcome { probability, step }),
            }
        }
        Ok(outcomes)
    }
}

fn place<T>(
    layer: &mut Grid<T>,
    kind: ObjectKind,
    position: Position,
    value: T,
) -> Result<(), WorldError> {
    layer
        .set(position, value)
        .map_err(|source| WorldError::MalformedWorld { kind, source })
}

fn occupied(layer: &Grid<Option<f64>>) -> Vec<Position> {
    layer
        .enumerate()
        .filter_map(|(pos, cell)| cell.map(|_| pos))
        .collect()
}

impl Mdp for GridWorldMdp {
    type State = State;
    type Action = Action;
    type Error = WorldError;

    fn states(&self) -> impl Iterator<Item = State> + '_ {
        iproduct!(0..self.width, 0..self.height, [true, false], [true, false]).map(
            |(x, y, has_gold, has_immunity)| State {
                x,
                y,
                has_gold,
                has_immunity,
            },
        )
    }

    fn actions(&self) -> &[Action] {
        &Action::ALL
    }

    fn actions_at(&self, state: &State) -> Vec<Action> {
        let mut actions = Action::MOVES.to_vec();
        if self.can_pick_up(state) {
            actions.push(Action::PickUp);
        }
        actions
    }

    fn act<R>(&self, state: &State, action: Action, rng: &mut R) -> Result<Step<State>, WorldError>
    where
        R: Rng + ?Sized,
    {
        self.ensure_legal(state, action)?;
        let step = match action.direction() {
            Some(intended) => {
                let realized = self.move_model.sample(intended, rng);
                let step = self.resolve_move(state, realized);
                debug!(
                    %state,
                    %action,
                    ?realized,
                    next = %step.next_state,
                    reward = step.reward,
                    terminal = step.is_terminal,
                    "move"
                );
                step
            }
            None => {
                let step = self.pick_up(state);
                debug!(%state, next = %step.next_state, reward = step.reward, "pick up");
                step
            }
        };
        Ok(step)
    }
}

/// Loads a world from a whitespace-separated text map.
///
/// Each token is one or more `+`-joined codes: `BL` blank, `ST` start, `PT`
/// pit, `GD` gold, `IM` immunity, `GL` goal, `WU` wumpus. Pits, gold, goals
/// and the wumpus may carry their own payoff, e.g. `GL=25`; otherwise the
/// value comes from `config.rewards`. Returns the world and the start state.
pub fn load_world_from_string(
    map_string: &str,
    config: &WorldConfig,
) -> Result<(GridWorldMdp, State), WorldError> {
    let lines: Vec<&str> = map_string.trim().lines().collect();
    if lines.is_empty() {
        return Err(WorldError::MapFormat("Map string is empty.".to_string()));
    }

    let height = lines.len();
    let mut width = 0;
    let mut parsed_rows: Vec<Vec<&str>> = Vec::with_capacity(height);

    for (y, line) in lines.iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if y == 0 {
            width = tokens.len();
            if width == 0 {
                return Err(WorldError::MapFormat("Map has zero width.".to_string()));
            }
        } else if tokens.len() != width {
            return Err(WorldError::MapFormat(format!(
                "Inconsistent width at row {}: expected {}, found {}",
                y,
                width,
                tokens.len()
            )));
        }
        parsed_rows.push(tokens);
    }

    let mut world = GridWorldMdp::new(width, height, config.step_cost)?
        .with_move_model(config.move_model()?);
    let mut start_position: Option<Position> = None;
    let rewards = &config.rewards;

    for (y, row_tokens) in parsed_rows.iter().enumerate() {
        for (x, token) in row_tokens.iter().enumerate() {
            let pos = Position { x, y };
            let mut seen: Vec<&str> = Vec::with_capacity(2);
            for part in token.split('+') {
                let (code, payoff) = match part.split_once('=') {
                    Some((code, value)) => {
                        let value = value.parse::<f64>().map_err(|_| {
                            WorldError::MapFormat(format!(
                                "Invalid payoff '{}' at position ({}, {}).",
                                value, x, y
                            ))
                        })?;
                        (code, Some(value))
                    }
                    None => (part, None),
                };
                if seen.contains(&code) {
                    return Err(WorldError::MapFormat(format!(
                        "Map code '{}' repeated at position ({}, {}).",
                        code, x, y
                    )));
                }
                seen.push(code);
                match (code, payoff) {
                    ("BL", None) => {}
                    ("ST", None) => {
                        if start_position.is_some() {
                            return Err(WorldError::MapFormat(
                                "Multiple start positions ('ST') found.".to_string(),
                            ));
                        }
                        start_position = Some(pos);
                    }
                    ("IM", None) => world.add_immunity(pos)?,
                    ("PT", p) => world.add_pit(pos, p.unwrap_or(rewards.pit))?,
                    ("GD", p) => world.add_gold(pos, p.unwrap_or(rewards.gold))?,
                    ("GL", p) => world.add_goal(pos, p.unwrap_or(rewards.goal))?,
                    ("WU", p) => world.add_wumpus(pos, p.unwrap_or(rewards.wumpus))?,
                    ("BL" | "ST" | "IM", Some(_)) => {
                        return Err(WorldError::MapFormat(format!(
                            "Map code '{}' takes no payoff at position ({}, {}).",
                            code, x, y
                        )));
                    }
                    (unknown, _) => {
                        return Err(WorldError::MapFormat(format!(
                            "Unknown map code '{}' at position ({}, {}).",
                            unknown, x, y
                        )));
                    }
                }
            }
        }
    }

    let start = start_position.ok_or_else(|| {
        WorldError::MapFormat("No start position ('ST') found in map.".to_string())
    })?;

    debug!(width, height, %start, "loaded world");
    Ok((world, State::new(start.x, start.y, false, false)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use rand::{SeedableRng, rngs::StdRng};
    use rstest::rstest;

    fn pos(x: usize, y: usize) -> Position {
        Position { x, y }
    }

    fn small_world() -> GridWorldMdp {
        let mut world = GridWorldMdp::new(3, 3, 1.0).unwrap();
        world.add_gold(pos(0, 1), 5.0).unwrap();
        world.add_immunity(pos(1, 0)).unwrap();
        world.add_goal(pos(2, 2), 10.0).unwrap();
        world.add_wumpus(pos(1, 1), -10.0).unwrap();
        world
    }

    #[test]
    fn test_empty_world_is_rejected() {
        assert_eq!(
            GridWorldMdp::new(0, 3, 1.0).unwrap_err(),
            WorldError::EmptyWorld {
                width: 0,
                height: 3
            }
        );
    }

    #[test]
    fn test_oversized_world_is_rejected() {
        assert_eq!(
            GridWorldMdp::new(usize::MAX, 2, 1.0).unwrap_err(),
            WorldError::OversizedWorld {
                width: usize::MAX,
                height: 2
            }
        );
        assert!(matches!(
            GridWorldMdp::new(2, usize::MAX / 4, 1.0),
            Err(WorldError::OversizedWorld { .. })
        ));
    }

    #[test]
    fn test_off_grid_state_is_rejected() {
        let world = small_world();
        let mut rng = StdRng::seed_from_u64(4);
        let state = State::new(50, 50, true, false);
        let expected = WorldError::InvalidState {
            state,
            width: 3,
            height: 3,
        };
        for action in Action::ALL {
            assert_eq!(world.act(&state, action, &mut rng).unwrap_err(), expected);
            assert_eq!(world.outcomes(&state, action).unwrap_err(), expected);
        }
        assert!(world.act(&State::new(3, 0, false, false), Action::Up, &mut rng).is_err());
    }

    #[test]
    fn test_out_of_bounds_placement_is_malformed() {
        let mut world = GridWorldMdp::new(2, 2, 1.0).unwrap();
        let err = world.add_wumpus(pos(2, 0), -10.0).unwrap_err();
        assert!(matches!(
            err,
            WorldError::MalformedWorld {
                kind: ObjectKind::Wumpus,
                ..
            }
        ));
        assert!(world.add_immunity(pos(1, 5)).is_err());
    }

    #[test]
    fn test_cell_may_hold_several_objects() {
        let mut world = GridWorldMdp::new(2, 2, 1.0).unwrap();
        world.add_goal(pos(1, 1), 10.0).unwrap();
        world.add_wumpus(pos(1, 1), -10.0).unwrap();
        assert_eq!(world.goal_at(pos(1, 1)), Some(10.0));
        assert_eq!(world.wumpus_at(pos(1, 1)), Some(-10.0));
    }

    #[rstest]
    #[case(State::new(0, 0, false, false), false)]
    #[case(State::new(0, 1, false, false), true)]
    #[case(State::new(0, 1, true, false), false)]
    #[case(State::new(1, 0, false, false), true)]
    #[case(State::new(1, 0, false, true), false)]
    fn test_actions_at(#[case] state: State, #[case] pick_up: bool) {
        let world = small_world();
        let actions = world.actions_at(&state);
        for movement in Action::MOVES {
            assert!(actions.contains(&movement));
        }
        assert_eq!(actions.contains(&Action::PickUp), pick_up);
        assert!(actions.iter().all(|a| world.actions().contains(a)));
    }

    #[test]
    fn test_pick_up_gold_pays_gold_value() {
        let world = small_world();
        let mut rng = StdRng::seed_from_u64(1);
        let step = world
            .act(&State::new(0, 1, false, false), Action::PickUp, &mut rng)
            .unwrap();
        assert_eq!(step.next_state, State::new(0, 1, true, false));
        assert_float_eq!(step.reward, 5.0, abs <= 1e-12);
        assert!(!step.is_terminal);
    }

    #[test]
    fn test_pick_up_immunity_costs_a_step() {
        let world = small_world();
        let mut rng = StdRng::seed_from_u64(1);
        let step = world
            .act(&State::new(1, 0, false, false), Action::PickUp, &mut rng)
            .unwrap();
        assert_eq!(step.next_state, State::new(1, 0, false, true));
        assert_float_eq!(step.reward, -1.0, abs <= 1e-12);
    }

    #[test]
    fn test_gold_is_picked_before_immunity() {
        let mut world = GridWorldMdp::new(1, 1, 1.0).unwrap();
        world.add_gold(pos(0, 0), 2.0).unwrap();
        world.add_immunity(pos(0, 0)).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let first = world
            .act(&State::new(0, 0, false, false), Action::PickUp, &mut rng)
            .unwrap();
        assert_eq!(first.next_state, State::new(0, 0, true, false));
        let second = world
            .act(&first.next_state, Action::PickUp, &mut rng)
            .unwrap();
        assert_eq!(second.next_state, State::new(0, 0, true, true));
        assert!(
            world
                .act(&second.next_state, Action::PickUp, &mut rng)
                .is_err()
        );
    }

    #[test]
    fn test_goal_without_gold_is_not_terminal() {
        let world = small_world().with_move_model(MoveModel::deterministic());
        let step = world.resolve_move(&State::new(2, 1, false, false), Direction::Down);
        assert_eq!(step.next_state.pos(), pos(2, 2));
        assert!(!step.is_terminal);
        assert_float_eq!(step.reward, -1.0, abs <= 1e-12);
    }

    #[test]
    fn test_goal_takes_priority_over_wumpus() {
        let mut world = GridWorldMdp::new(2, 1, 1.0).unwrap();
        world.add_goal(pos(1, 0), 10.0).unwrap();
        world.add_wumpus(pos(1, 0), -10.0).unwrap();
        let step = world.resolve_move(&State::new(0, 0, true, false), Direction::Right);
        assert!(step.is_terminal);
        assert_float_eq!(step.reward, 10.0, abs <= 1e-12);

        let step = world.resolve_move(&State::new(0, 0, false, false), Direction::Right);
        assert!(step.is_terminal);
        assert_float_eq!(step.reward, -10.0, abs <= 1e-12);
    }

    #[test]
    fn test_pits_have_no_effect() {
        let mut world = GridWorldMdp::new(2, 1, 0.5).unwrap();
        world.add_pit(pos(1, 0), -100.0).unwrap();
        let step = world.resolve_move(&State::new(0, 0, false, false), Direction::Right);
        assert_eq!(step.next_state.pos(), pos(1, 0));
        assert!(!step.is_terminal);
        assert_float_eq!(step.reward, -0.5, abs <= 1e-12);
        assert_eq!(world.pit_at(pos(1, 0)), Some(-100.0));
    }

    #[test]
    fn test_outcomes_sum_to_one() {
        let world = small_world();
        for state in world.states() {
            for action in world.actions_at(&state) {
                let outcomes = world.outcomes(&state, action).unwrap();
                let total: f64 = outcomes.iter().map(|o| o.probability).sum();
                assert_float_eq!(total, 1.0, abs <= 1e-9);
            }
        }
    }

    #[test]
    fn test_outcomes_merge_clamped_branches() {
        let world = GridWorldMdp::new(3, 3, 1.0).unwrap();
        // Up from the top-left corner: Up and Left both stay put.
        let outcomes = world
            .outcomes(&State::new(0, 0, false, false), Action::Up)
            .unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].step.next_state.pos(), pos(0, 0));
        assert_float_eq!(outcomes[0].probability, 0.85, abs <= 1e-9);
        assert_eq!(outcomes[1].step.next_state.pos(), pos(1, 0));
        assert_float_eq!(outcomes[1].probability, 0.15, abs <= 1e-9);
    }

    #[test]
    fn test_outcomes_reject_illegal_pick_up() {
        let world = small_world();
        let err = world
            .outcomes(&State::new(2, 0, false, false), Action::PickUp)
            .unwrap_err();
        assert!(matches!(err, WorldError::InvalidAction { .. }));
    }

    #[rstest]
    #[case(0.8, 0.1)]
    #[case(0.7, 0.15)]
    #[case(1.0, 0.0)]
    fn test_move_model_accepts_valid_tables(#[case] intended: f64, #[case] slip: f64) {
        let model = MoveModel::new(intended, slip).unwrap();
        assert_eq!(model.weights(), [intended, slip, slip]);
    }

    #[rstest]
    #[case(0.5, 0.1)]
    #[case(-0.2, 0.6)]
    #[case(f64::NAN, 0.1)]
    #[case(0.0, 0.0)]
    fn test_move_model_rejects_invalid_tables(#[case] intended: f64, #[case] slip: f64) {
        assert!(matches!(
            MoveModel::new(intended, slip),
            Err(WorldError::InvalidMoveModel { .. })
        ));
    }

    #[test]
    fn test_deterministic_model_never_slips() {
        let model = MoveModel::deterministic();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            assert_eq!(model.sample(Direction::Left, &mut rng), Direction::Left);
        }
    }

    #[test]
    fn test_load_world_from_string() {
        let map = "
            ST  BL    IM
            GD  WU=-50  BL
            PT  BL    GL+WU
        ";
        let (world, start) = load_world_from_string(map, &WorldConfig::default()).unwrap();
        assert_eq!((world.width(), world.height()), (3, 3));
        assert_eq!(start, State::new(0, 0, false, false));
        assert!(world.immunity_at(pos(2, 0)));
        assert_eq!(world.gold_at(pos(0, 1)), Some(0.0));
        assert_eq!(world.wumpus_at(pos(1, 1)), Some(-50.0));
        assert_eq!(world.pit_at(pos(0, 2)), Some(-10.0));
        assert_eq!(world.goal_at(pos(2, 2)), Some(10.0));
        assert_eq!(world.wumpus_at(pos(2, 2)), Some(-10.0));
        assert_float_eq!(world.move_model().intended(), 0.7, abs <= 1e-12);
        assert_eq!(
            world.positions_of(ObjectKind::Wumpus),
            vec![pos(1, 1), pos(2, 2)]
        );
    }

    #[rstest]
    #[case("", "empty")]
    #[case("BL BL\nBL", "Inconsistent width")]
    #[case("BL BL", "No start")]
    #[case("ST ST", "Multiple start")]
    #[case("ST XX", "Unknown map code")]
    #[case("ST GL=abc", "Invalid payoff")]
    #[case("ST=1 BL", "takes no payoff")]
    #[case("ST GD=1+GD=2", "repeated")]
    #[case("ST+ST BL", "repeated")]
    fn test_load_world_errors(#[case] map: &str, #[case] message: &str) {
        match load_world_from_string(map, &WorldConfig::default()) {
            Err(WorldError::MapFormat(msg)) => assert!(msg.contains(message), "{msg}"),
            other => panic!("expected a map format error, got {other:?}"),
        }
    }

    #[test]
    fn test_world_config_rejects_bad_probability() {
        let config = WorldConfig {
            intended_probability: 1.5,
            ..WorldConfig::default()
        };
        assert!(matches!(
            load_world_from_string("ST", &config),
            Err(WorldError::InvalidMoveModel { .. })
        ));
    }
}
