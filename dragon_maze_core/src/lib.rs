use serde::{Deserialize, Serialize};

pub mod being;
pub mod game;
pub mod labyrinth;

/// Represents a 2D grid coordinate.
///
/// `y` grows downward, so `Direction::Up` is `(0, -1)`. The labyrinth is
/// queried with row = `y`, column = `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// Returns the coordinate one cell away in the given direction.
    pub fn translated(self, direction: Direction) -> Coord {
        let (dx, dy) = direction.delta();
        Coord {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Chebyshev distance to `other`.
    ///
    /// This is the adjacency metric of the game: two beings are adjacent when
    /// the distance is at most 1, diagonals included.
    pub fn chebyshev_distance(self, other: Coord) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.max(dy)
    }
}

/// The four unit moves available to a living being.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Every direction, indexable for uniform random draws.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// The `(dx, dy)` cell delta of this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Discriminates the kinds of living being present in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeingKind {
    Hero,
    Dragon,
    Eagle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translated_applies_unit_deltas() {
        let origin = Coord::new(3, 3);
        assert_eq!(origin.translated(Direction::Up), Coord::new(3, 2));
        assert_eq!(origin.translated(Direction::Down), Coord::new(3, 4));
        assert_eq!(origin.translated(Direction::Left), Coord::new(2, 3));
        assert_eq!(origin.translated(Direction::Right), Coord::new(4, 3));
    }

    #[test]
    fn chebyshev_counts_diagonals_as_one() {
        let a = Coord::new(2, 2);
        assert_eq!(a.chebyshev_distance(Coord::new(3, 3)), 1);
        assert_eq!(a.chebyshev_distance(Coord::new(2, 2)), 0);
        assert_eq!(a.chebyshev_distance(Coord::new(5, 3)), 3);
        assert_eq!(a.chebyshev_distance(Coord::new(0, 0)), 2);
    }
}
