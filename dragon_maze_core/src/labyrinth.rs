use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::Coord;

/// Represents the terrain symbol of a single labyrinth cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbol {
    Wall,
    Floor,
    Exit,
    /// Floor cell holding the sword pickup until it is claimed.
    Sword,
}

impl Default for Symbol {
    fn default() -> Self {
        Symbol::Wall
    }
}

/// Represents errors that can occur while building or parsing a labyrinth.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("labyrinth dimensions ({width}x{height}) must be odd and at least 5x5")]
    BadDimensions { width: usize, height: usize },
    #[error("labyrinth map is empty")]
    EmptyMap,
    #[error("row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown map symbol '{symbol}' at ({x}, {y})")]
    UnknownSymbol { symbol: char, x: usize, y: usize },
}

/// The static grid of terrain symbols defining walls, floor, exit, and
/// sword-spot cells.
///
/// Immutable once built. Beings and the game core only query it; movement
/// never writes back into the grid. Cells are stored in a flat vector in
/// row-major order, as in a text map read top to bottom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Labyrinth {
    width: usize,
    height: usize,
    cells: Vec<Symbol>,
}

impl Labyrinth {
    /// Parses a labyrinth from a text map.
    ///
    /// One character per cell: `#` wall, `.` floor, `E` exit, `S` sword spot.
    /// Rows must all have the same width.
    pub fn parse(map: &str) -> Result<Labyrinth, BuildError> {
        let lines: Vec<&str> = map.trim().lines().map(str::trim).collect();
        if lines.is_empty() {
            return Err(BuildError::EmptyMap);
        }

        let width = lines[0].chars().count();
        if width == 0 {
            return Err(BuildError::EmptyMap);
        }
        let height = lines.len();
        let mut cells = Vec::with_capacity(width * height);

        for (y, line) in lines.iter().enumerate() {
            let row_width = line.chars().count();
            if row_width != width {
                return Err(BuildError::RaggedRow {
                    row: y,
                    expected: width,
                    found: row_width,
                });
            }
            for (x, symbol) in line.chars().enumerate() {
                cells.push(match symbol {
                    '#' => Symbol::Wall,
                    '.' => Symbol::Floor,
                    'E' => Symbol::Exit,
                    'S' => Symbol::Sword,
                    unknown => {
                        return Err(BuildError::UnknownSymbol {
                            symbol: unknown,
                            x,
                            y,
                        });
                    }
                });
            }
        }

        Ok(Labyrinth {
            width,
            height,
            cells,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Checks if the coordinate lies within the grid boundaries.
    #[inline]
    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(coord.y as usize * self.width + coord.x as usize)
        } else {
            None
        }
    }

    /// The terrain symbol at `coord`, or `None` out of bounds.
    pub fn symbol_at(&self, coord: Coord) -> Option<Symbol> {
        self.index(coord).map(|index| self.cells[index])
    }

    /// A cell can be stepped onto when it is in bounds and not a wall.
    pub fn is_traversable(&self, coord: Coord) -> bool {
        matches!(
            self.symbol_at(coord),
            Some(Symbol::Floor | Symbol::Exit | Symbol::Sword)
        )
    }

    /// Iterates every cell as `(coord, symbol)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Coord, Symbol)> + '_ {
        self.cells.iter().enumerate().map(|(index, &symbol)| {
            let x = (index % self.width) as i32;
            let y = (index / self.width) as i32;
            (Coord::new(x, y), symbol)
        })
    }

    /// First cell carrying `symbol`, scanning row-major.
    pub fn find(&self, symbol: Symbol) -> Option<Coord> {
        self.cells()
            .find(|&(_, cell)| cell == symbol)
            .map(|(coord, _)| coord)
    }
}

/// Fixed 10x10 labyrinth used by the demo constructors: vertical corridors
/// joined by the top and bottom rows, the exit on the right border, the sword
/// tucked into the lower half.
const DEMO_MAP: &str = "\
##########
#........#
#.##.#.#.#
#.##.#.#.#
#.##.#.#.#
#.##.#.#.E
#.##.#.#.#
#.##S#.#.#
#........#
##########";

/// Builds labyrinths, either the fixed demo grid or a randomly carved maze.
#[derive(Debug)]
pub struct MazeBuilder {
    rng: StdRng,
}

impl MazeBuilder {
    pub fn new() -> Self {
        Self::seeded(rand::rng().random())
    }

    /// A builder whose random mazes are reproducible from `seed`.
    pub fn seeded(seed: u64) -> Self {
        MazeBuilder {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The fixed demo labyrinth.
    pub fn build_demo(&self) -> Labyrinth {
        Labyrinth::parse(DEMO_MAP).expect("demo map is well formed")
    }

    /// Carves a random perfect maze of the given dimensions.
    ///
    /// Dimensions must be odd and at least 5 so the carving lattice lines up
    /// with a solid outer wall. The exit is opened on a random border cell and
    /// one sword spot is placed on a floor cell away from the hero spawn at
    /// (1, 1).
    pub fn build(&mut self, width: usize, height: usize) -> Result<Labyrinth, BuildError> {
        if width < 5 || height < 5 || width % 2 == 0 || height % 2 == 0 {
            return Err(BuildError::BadDimensions { width, height });
        }

        let mut cells = vec![Symbol::Wall; width * height];
        let at = |x: usize, y: usize| y * width + x;

        // Iterative depth-first carving over the odd-cell lattice.
        let mut stack = vec![(1usize, 1usize)];
        cells[at(1, 1)] = Symbol::Floor;

        while let Some(&(x, y)) = stack.last() {
            let mut frontier: Vec<(usize, usize)> = Vec::with_capacity(4);
            for (dx, dy) in [(0i32, -2i32), (0, 2), (-2, 0), (2, 0)] {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 1 || ny < 1 || nx as usize >= width - 1 || ny as usize >= height - 1 {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                if cells[at(nx, ny)] == Symbol::Wall {
                    frontier.push((nx, ny));
                }
            }

            match frontier.len() {
                0 => {
                    let _ = stack.pop();
                }
                n => {
                    let (nx, ny) = frontier[self.rng.random_range(0..n)];
                    cells[at((x + nx) / 2, (y + ny) / 2)] = Symbol::Floor;
                    cells[at(nx, ny)] = Symbol::Floor;
                    stack.push((nx, ny));
                }
            }
        }

        // Open the exit on a border wall whose inward neighbour was carved.
        let mut exits: Vec<usize> = Vec::new();
        for y in 1..height - 1 {
            if cells[at(1, y)] == Symbol::Floor {
                exits.push(at(0, y));
            }
            if cells[at(width - 2, y)] == Symbol::Floor {
                exits.push(at(width - 1, y));
            }
        }
        for x in 1..width - 1 {
            if cells[at(x, 1)] == Symbol::Floor {
                exits.push(at(x, 0));
            }
            if cells[at(x, height - 2)] == Symbol::Floor {
                exits.push(at(x, height - 1));
            }
        }
        let exit = exits[self.rng.random_range(0..exits.len())];
        cells[exit] = Symbol::Exit;

        // Drop the sword on a floor cell away from the hero spawn.
        let spawn = Coord::new(1, 1);
        let spots: Vec<usize> = cells
            .iter()
            .enumerate()
            .filter(|&(index, &symbol)| {
                let coord = Coord::new((index % width) as i32, (index / width) as i32);
                symbol == Symbol::Floor && coord.chebyshev_distance(spawn) >= 2
            })
            .map(|(index, _)| index)
            .collect();
        let spot = spots[self.rng.random_range(0..spots.len())];
        cells[spot] = Symbol::Sword;

        Ok(Labyrinth {
            width,
            height,
            cells,
        })
    }
}

impl Default for MazeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_symbols() {
        let lab = Labyrinth::parse("#.E\n.S.").unwrap();
        assert_eq!(lab.width(), 3);
        assert_eq!(lab.height(), 2);
        assert_eq!(lab.symbol_at(Coord::new(0, 0)), Some(Symbol::Wall));
        assert_eq!(lab.symbol_at(Coord::new(2, 0)), Some(Symbol::Exit));
        assert_eq!(lab.symbol_at(Coord::new(1, 1)), Some(Symbol::Sword));
        assert_eq!(lab.symbol_at(Coord::new(3, 0)), None);
        assert_eq!(lab.symbol_at(Coord::new(-1, 0)), None);
    }

    #[test]
    fn parse_rejects_ragged_and_unknown_maps() {
        assert_eq!(Labyrinth::parse(""), Err(BuildError::EmptyMap));
        assert_eq!(
            Labyrinth::parse("##\n###"),
            Err(BuildError::RaggedRow {
                row: 1,
                expected: 2,
                found: 3
            })
        );
        assert_eq!(
            Labyrinth::parse("#?"),
            Err(BuildError::UnknownSymbol {
                symbol: '?',
                x: 1,
                y: 0
            })
        );
    }

    #[test]
    fn traversability_blocks_walls_only() {
        let lab = Labyrinth::parse("#.E\n.S.").unwrap();
        assert!(!lab.is_traversable(Coord::new(0, 0)));
        assert!(lab.is_traversable(Coord::new(1, 0)));
        assert!(lab.is_traversable(Coord::new(2, 0)));
        assert!(lab.is_traversable(Coord::new(1, 1)));
        assert!(!lab.is_traversable(Coord::new(0, -1)));
    }

    #[test]
    fn demo_labyrinth_has_the_expected_landmarks() {
        let lab = MazeBuilder::seeded(0).build_demo();
        assert_eq!(lab.width(), 10);
        assert_eq!(lab.height(), 10);
        assert_eq!(lab.find(Symbol::Floor), Some(Coord::new(1, 1)));
        assert_eq!(lab.find(Symbol::Exit), Some(Coord::new(9, 5)));
        assert_eq!(lab.find(Symbol::Sword), Some(Coord::new(4, 7)));
    }

    #[test]
    fn build_rejects_bad_dimensions() {
        let mut builder = MazeBuilder::seeded(7);
        assert!(matches!(
            builder.build(4, 9),
            Err(BuildError::BadDimensions { .. })
        ));
        assert!(matches!(
            builder.build(9, 3),
            Err(BuildError::BadDimensions { .. })
        ));
    }

    #[test]
    fn built_mazes_carry_exactly_one_exit_and_sword() {
        let mut builder = MazeBuilder::seeded(42);
        for _ in 0..5 {
            let lab = builder.build(11, 9).unwrap();
            let exits = lab.cells().filter(|&(_, s)| s == Symbol::Exit).count();
            let swords = lab.cells().filter(|&(_, s)| s == Symbol::Sword).count();
            assert_eq!(exits, 1);
            assert_eq!(swords, 1);
            // hero spawn is always carved
            assert_eq!(lab.symbol_at(Coord::new(1, 1)), Some(Symbol::Floor));
        }
    }

    #[test]
    fn built_mazes_are_reproducible_from_the_seed() {
        let a = MazeBuilder::seeded(99).build(11, 11).unwrap();
        let b = MazeBuilder::seeded(99).build(11, 11).unwrap();
        assert_eq!(a, b);
    }
}
