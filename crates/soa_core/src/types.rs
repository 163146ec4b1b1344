use serde::{Deserialize, Serialize};

/// Von Neumann neighbourhood on the Wa-Tor torus
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// (dx, dy) with y growing southwards
    pub fn offset(self) -> (i64, i64) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Bit used in per-cell request masks
    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Fish,
    Shark,
}

impl AgentKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fish => "fish",
            Self::Shark => "shark",
        }
    }
}

/// Reference from a grid cell into the fish or shark pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentRef {
    pub kind: AgentKind,
    pub slot: u32,
}

impl AgentRef {
    pub fn fish(slot: u32) -> Self {
        Self { kind: AgentKind::Fish, slot }
    }

    pub fn shark(slot: u32) -> Self {
        Self { kind: AgentKind::Shark, slot }
    }
}

/// Summary of a collision run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionStats {
    pub iteration: u32,
    pub bodies: usize,
    pub total_mass: f64,
    pub momentum: [f64; 2],
    /// Sum of all coordinates, a cheap fingerprint for regression checks
    pub checksum: f64,
    /// Bodies removed by merging so far
    pub merged: usize,
}

/// Population counts of a Wa-Tor run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WatorStats {
    pub iteration: u32,
    pub fish: usize,
    pub sharks: usize,
}
