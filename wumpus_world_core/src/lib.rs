use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub mod agent;
pub mod episode;
pub mod error;
pub mod map;
pub mod mdp;
pub mod world;

pub use error::WorldError;
pub use mdp::{Mdp, Step};
pub use world::{GridWorldMdp, MoveModel, ObjectKind, Outcome, Rewards, WorldConfig};

/// Represents a 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A single state of the world: where the agent stands and what it carries.
///
/// Both flags only ever go from `false` to `true` within an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    pub x: usize,
    pub y: usize,
    pub has_gold: bool,
    pub has_immunity: bool,
}

impl State {
    pub fn new(x: usize, y: usize, has_gold: bool, has_immunity: bool) -> Self {
        Self {
            x,
            y,
            has_gold,
            has_immunity,
        }
    }

    /// Returns the grid cell the agent occupies.
    #[inline]
    pub fn pos(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, gold={}, immunity={})",
            self.x, self.y, self.has_gold, self.has_immunity
        )
    }
}

/// The four compass directions a move can be realized in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit vector `(dx, dy)`. Rows grow downward, so `Up` decreases `y`.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// The realized directions for an intended move: the intended one first,
    /// then its two perpendicular slips.
    pub fn branches(self) -> [Direction; 3] {
        match self {
            Direction::Up => [Direction::Up, Direction::Left, Direction::Right],
            Direction::Down => [Direction::Down, Direction::Right, Direction::Left],
            Direction::Left => [Direction::Left, Direction::Up, Direction::Down],
            Direction::Right => [Direction::Right, Direction::Down, Direction::Up],
        }
    }
}

/// Represents actions an agent can decide to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    PickUp,
}

impl Action {
    /// Every action symbol, in a fixed order.
    pub const ALL: [Action; 5] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::PickUp,
    ];

    /// The four movement actions.
    pub const MOVES: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// Intended direction of a movement action, `None` for `PickUp`.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Action::Up => Some(Direction::Up),
            Action::Down => Some(Direction::Down),
            Action::Left => Some(Direction::Left),
            Action::Right => Some(Direction::Right),
            Action::PickUp => None,
        }
    }

    /// Two-character display label.
    pub fn label(self) -> &'static str {
        match self {
            Action::Up => "^^",
            Action::Down => "vv",
            Action::Left => "<<",
            Action::Right => ">>",
            Action::PickUp => "[]",
        }
    }
}

impl From<Direction> for Action {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => Action::Up,
            Direction::Down => Action::Down,
            Direction::Left => Action::Left,
            Direction::Right => Action::Right,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Action {
    type Err = WorldError;

    /// Accepts either the display label or the action name in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbol = s.trim();
        if let Some(action) = Action::ALL.into_iter().find(|a| a.label() == symbol) {
            return Ok(action);
        }
        match symbol.to_ascii_lowercase().as_str() {
            "up" => Ok(Action::Up),
            "down" => Ok(Action::Down),
            "left" => Ok(Action::Left),
            "right" => Ok(Action::Right),
            "pick_up" | "pickup" | "pick-up" => Ok(Action::PickUp),
            _ => Err(WorldError::UnknownAction(symbol.to_string())),
        }
    }
}
