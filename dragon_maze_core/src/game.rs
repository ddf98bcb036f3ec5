use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    Coord, Direction,
    being::{Being, Dragon, DragonBehavior, Eagle, Hero, Sword},
    labyrinth::{BuildError, Labyrinth, MazeBuilder, Symbol},
};

/// Represents errors that can occur while assembling a game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("labyrinth has no floor cell to spawn the hero")]
    NoHeroSpawn,
    #[error("spawn cell ({0:?}) is not traversable")]
    BlockedSpawn(Coord),
    #[error("no free floor cell left to spawn dragon {index}")]
    NoDragonSpawn { index: usize },
}

/// One round of the maze-chase game.
///
/// Owns the labyrinth (read-only after construction), the hero, the eagle,
/// the dragons, and the sword, and exposes the per-tick update. The roster
/// never changes after construction, so every tick iterates the same beings
/// in the same order: hero, eagle, then dragons in spawn order. That order is
/// what makes randomized runs reproducible under a fixed seed.
#[derive(Debug)]
pub struct Game {
    labyrinth: Labyrinth,
    hero: Hero,
    eagle: Eagle,
    dragons: Vec<Dragon>,
    sword: Option<Sword>,
    exit_is_open: bool,
    rng: StdRng,
}

impl Game {
    /// A game on the demo labyrinth, seeded from entropy.
    pub fn new(behavior: DragonBehavior, num_dragons: usize) -> Result<Game, GameError> {
        Self::new_seeded(behavior, num_dragons, rand::rng().random())
    }

    /// A game on the demo labyrinth with deterministic dragon placement and
    /// movement.
    pub fn new_seeded(
        behavior: DragonBehavior,
        num_dragons: usize,
        seed: u64,
    ) -> Result<Game, GameError> {
        let labyrinth = MazeBuilder::seeded(seed).build_demo();
        Self::from_labyrinth(labyrinth, behavior, num_dragons, seed)
    }

    /// A game on a freshly carved random maze, seeded from entropy.
    pub fn with_size(
        width: usize,
        height: usize,
        behavior: DragonBehavior,
        num_dragons: usize,
    ) -> Result<Game, GameError> {
        Self::with_size_seeded(width, height, behavior, num_dragons, rand::rng().random())
    }

    /// A fully reproducible game: maze carving, dragon placement, and every
    /// random draw of every tick derive from `seed`.
    pub fn with_size_seeded(
        width: usize,
        height: usize,
        behavior: DragonBehavior,
        num_dragons: usize,
        seed: u64,
    ) -> Result<Game, GameError> {
        let labyrinth = MazeBuilder::seeded(seed).build(width, height)?;
        Self::from_labyrinth(labyrinth, behavior, num_dragons, seed)
    }

    /// Assembles a game on the given labyrinth, spawning the hero on its
    /// first floor cell and the dragons on random floor cells away from the
    /// hero. The sword comes from the labyrinth's sword cell, if it has one.
    pub fn from_labyrinth(
        labyrinth: Labyrinth,
        behavior: DragonBehavior,
        num_dragons: usize,
        seed: u64,
    ) -> Result<Game, GameError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let spawn = labyrinth
            .find(Symbol::Floor)
            .ok_or(GameError::NoHeroSpawn)?;

        let mut dragons = Vec::with_capacity(num_dragons);
        for index in 0..num_dragons {
            let lairs: Vec<Coord> = labyrinth
                .cells()
                .filter(|&(coord, symbol)| {
                    symbol == Symbol::Floor
                        && coord.chebyshev_distance(spawn) > 2
                        && !dragons
                            .iter()
                            .any(|dragon: &Dragon| dragon.being().position() == coord)
                })
                .map(|(coord, _)| coord)
                .collect();
            if lairs.is_empty() {
                return Err(GameError::NoDragonSpawn { index });
            }
            let lair = lairs[rng.random_range(0..lairs.len())];
            dragons.push(Dragon::new(lair, behavior));
        }

        Self::assemble_with_rng(labyrinth, spawn, dragons, rng)
    }

    /// Assembles a game from explicit placements.
    ///
    /// Intended for fixed scenarios and tests; the random constructors are
    /// the normal entry points. Spawn cells must be traversable.
    pub fn assemble(
        labyrinth: Labyrinth,
        hero_position: Coord,
        dragons: Vec<Dragon>,
        seed: u64,
    ) -> Result<Game, GameError> {
        Self::assemble_with_rng(labyrinth, hero_position, dragons, StdRng::seed_from_u64(seed))
    }

    fn assemble_with_rng(
        labyrinth: Labyrinth,
        hero_position: Coord,
        dragons: Vec<Dragon>,
        rng: StdRng,
    ) -> Result<Game, GameError> {
        if !labyrinth.is_traversable(hero_position) {
            return Err(GameError::BlockedSpawn(hero_position));
        }
        for dragon in &dragons {
            if !labyrinth.is_traversable(dragon.being().position()) {
                return Err(GameError::BlockedSpawn(dragon.being().position()));
            }
        }

        let sword = labyrinth.find(Symbol::Sword).map(Sword::new);
        let hero = Hero::new(hero_position);
        let eagle = Eagle::new(hero_position);

        Ok(Game {
            labyrinth,
            hero,
            eagle,
            dragons,
            sword,
            exit_is_open: false,
            rng,
        })
    }

    /// Executes one tick of the game and returns whether the game is over.
    ///
    /// The phases run in a fixed order: movement for every being, the eagle's
    /// re-evaluation, sword pickup, hero-versus-dragon proximity combat in
    /// roster order, and finally the exit check. The caller is expected to
    /// stop ticking once this returns true.
    pub fn update(&mut self, hero_direction: Direction) -> bool {
        let mut done = false;

        // Movement: the hero steps where told; everything else draws its own
        // direction. Mid-move beings skip the whole phase.
        if !self.hero.being().is_moving() {
            self.hero.being_mut().step(&self.labyrinth, hero_direction);
        }
        if !self.eagle.being().is_moving() {
            let direction = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];
            self.eagle.being_mut().step(&self.labyrinth, direction);
        }
        for dragon in &mut self.dragons {
            dragon.take_turn(&self.labyrinth, &mut self.rng);
        }

        // The eagle re-evaluates once every being has settled.
        self.eagle.update(&self.labyrinth, &self.hero, &self.dragons);

        if let Some(sword) = self.sword.as_mut() {
            self.hero.catch_sword_if_possible(sword);
        }

        // Proximity combat, in roster order.
        for dragon in &mut self.dragons {
            if !dragon.being().is_alive() {
                continue;
            }
            if self.hero.being().distance_to(dragon.being()) > 1 {
                continue;
            }
            if self.hero.has_sword() {
                dragon.being_mut().kill();
                self.hero.record_dragon_kill();
            } else if !dragon.being().is_sleeping() {
                self.hero.being_mut().kill();
                if self.hero.has_eagle() {
                    self.eagle.being_mut().kill();
                }
                done = true;
            }
            // A sleeping dragon is harmless to an unarmed hero.
        }

        if self.hero.killed_a_dragon() {
            self.exit_is_open = true;
        }

        // Stepping onto the exit cell ends the round whether or not the exit
        // is narratively open.
        if self.labyrinth.symbol_at(self.hero.being().position()) == Some(Symbol::Exit) {
            done = true;
        }

        done
    }

    #[inline]
    pub fn labyrinth(&self) -> &Labyrinth {
        &self.labyrinth
    }

    #[inline]
    pub fn hero(&self) -> &Hero {
        &self.hero
    }

    #[inline]
    pub fn eagle(&self) -> &Eagle {
        &self.eagle
    }

    #[inline]
    pub fn dragons(&self) -> &[Dragon] {
        &self.dragons
    }

    #[inline]
    pub fn sword(&self) -> Option<&Sword> {
        self.sword.as_ref()
    }

    /// Whether the hero has opened the exit by killing a dragon. Latches true
    /// and never reverts.
    #[inline]
    pub fn exit_is_open(&self) -> bool {
        self.exit_is_open
    }

    /// Every being in roster order: hero, eagle, then dragons in spawn order.
    pub fn living_beings(&self) -> impl Iterator<Item = &Being> {
        std::iter::once(self.hero.being())
            .chain(std::iter::once(self.eagle.being()))
            .chain(self.dragons.iter().map(|dragon| dragon.being()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BeingKind;

    #[test]
    fn random_constructors_place_the_full_roster() {
        let game = Game::new_seeded(DragonBehavior::Wandering, 3, 11).unwrap();

        assert_eq!(game.dragons().len(), 3);
        assert!(game.sword().is_some());
        assert!(!game.exit_is_open());

        let kinds: Vec<BeingKind> = game.living_beings().map(Being::kind).collect();
        assert_eq!(
            kinds,
            vec![
                BeingKind::Hero,
                BeingKind::Eagle,
                BeingKind::Dragon,
                BeingKind::Dragon,
                BeingKind::Dragon,
            ]
        );
    }

    #[test]
    fn dragons_spawn_clear_of_the_hero() {
        let game = Game::with_size_seeded(11, 11, DragonBehavior::Wandering, 4, 5).unwrap();
        let hero = game.hero().being().position();
        for dragon in game.dragons() {
            assert!(dragon.being().position().chebyshev_distance(hero) > 2);
        }
    }

    #[test]
    fn assembling_on_a_wall_is_rejected() {
        let lab = Labyrinth::parse("###\n#.#\n###").unwrap();
        let result = Game::assemble(lab, Coord::new(0, 0), vec![], 0);
        assert!(matches!(result, Err(GameError::BlockedSpawn(_))));
    }

    #[test]
    fn a_crowded_labyrinth_runs_out_of_lairs() {
        let lab = Labyrinth::parse("#####\n#...#\n#####").unwrap();
        let result = Game::from_labyrinth(lab, DragonBehavior::Stationary, 1, 0);
        assert!(matches!(result, Err(GameError::NoDragonSpawn { index: 0 })));
    }

    #[test]
    fn replays_with_the_same_seed_are_identical() {
        let mut a = Game::with_size_seeded(11, 9, DragonBehavior::Wandering, 3, 77).unwrap();
        let mut b = Game::with_size_seeded(11, 9, DragonBehavior::Wandering, 3, 77).unwrap();

        let walk = [
            Direction::Right,
            Direction::Down,
            Direction::Down,
            Direction::Right,
            Direction::Up,
            Direction::Left,
        ];
        for direction in walk {
            let done_a = a.update(direction);
            let done_b = b.update(direction);
            assert_eq!(done_a, done_b);
            assert_eq!(a.hero(), b.hero());
            assert_eq!(a.dragons(), b.dragons());
            assert_eq!(a.eagle(), b.eagle());
        }
    }
}
