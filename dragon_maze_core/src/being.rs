use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    BeingKind, Coord, Direction,
    labyrinth::Labyrinth,
};

/// Base state shared by every living being.
///
/// A being is mutated only through its own operations, invoked by the game
/// core. Death is terminal and idempotent: a dead being never moves and never
/// takes part in combat again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Being {
    kind: BeingKind,
    position: Coord,
    alive: bool,
    sleeping: bool,
    /// Skip gate for multi-tick move animations. Always false in this
    /// implementation, but the tick loop honours it.
    moving: bool,
}

impl Being {
    fn new(kind: BeingKind, position: Coord) -> Self {
        Being {
            kind,
            position,
            alive: true,
            sleeping: false,
            moving: false,
        }
    }

    #[inline]
    pub fn kind(&self) -> BeingKind {
        self.kind
    }

    #[inline]
    pub fn position(&self) -> Coord {
        self.position
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    #[inline]
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Chebyshev distance to another being.
    pub fn distance_to(&self, other: &Being) -> u32 {
        self.position.chebyshev_distance(other.position)
    }

    /// Attempts a single step. The position changes only when the target cell
    /// is traversable; a blocked step is a silent no-op. Dead beings stay put.
    pub(crate) fn step(&mut self, labyrinth: &Labyrinth, direction: Direction) {
        if !self.alive {
            return;
        }
        let target = self.position.translated(direction);
        if labyrinth.is_traversable(target) {
            self.position = target;
        }
    }

    pub(crate) fn set_position(&mut self, position: Coord) {
        self.position = position;
    }

    pub(crate) fn kill(&mut self) {
        self.alive = false;
    }

    fn fall_asleep(&mut self) {
        self.sleeping = true;
    }

    fn wake(&mut self) {
        self.sleeping = false;
    }
}

/// The player-controlled being. Exactly one exists per game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    being: Being,
    has_sword: bool,
    has_eagle: bool,
    killed_a_dragon: bool,
}

impl Hero {
    pub(crate) fn new(position: Coord) -> Self {
        Hero {
            being: Being::new(BeingKind::Hero, position),
            has_sword: false,
            has_eagle: true,
            killed_a_dragon: false,
        }
    }

    #[inline]
    pub fn being(&self) -> &Being {
        &self.being
    }

    pub(crate) fn being_mut(&mut self) -> &mut Being {
        &mut self.being
    }

    #[inline]
    pub fn has_sword(&self) -> bool {
        self.has_sword
    }

    #[inline]
    pub fn has_eagle(&self) -> bool {
        self.has_eagle
    }

    /// Whether the hero has ever killed a dragon. Monotonic: once true it
    /// never resets, and it is what opens the labyrinth exit.
    #[inline]
    pub fn killed_a_dragon(&self) -> bool {
        self.killed_a_dragon
    }

    /// Claims the sword when the hero stands on its cell. One-way and
    /// idempotent: re-checking with the sword already claimed does nothing.
    pub(crate) fn catch_sword_if_possible(&mut self, sword: &mut Sword) {
        if !sword.is_claimed() && self.being.position() == sword.position() {
            sword.claim();
            self.has_sword = true;
        }
    }

    pub(crate) fn record_dragon_kill(&mut self) {
        self.killed_a_dragon = true;
    }
}

/// Selects how a dragon spends its turn. Opaque to the game core, which only
/// calls `take_turn` and reads the alive/sleeping flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragonBehavior {
    /// Never leaves its lair.
    Stationary,
    /// Wanders one random step per turn.
    Wandering,
    /// Wanders, and occasionally dozes off where it stands.
    WanderingSleepy,
}

/// Odds per turn that a sleepy dragon dozes off, as 1-in-N.
const SLEEP_ODDS: u32 = 8;
/// Odds per turn that a sleeping dragon wakes, as 1-in-N.
const WAKE_ODDS: u32 = 3;

/// A randomly wandering menace. Lethal to an unarmed hero unless asleep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dragon {
    being: Being,
    behavior: DragonBehavior,
}

impl Dragon {
    pub fn new(position: Coord, behavior: DragonBehavior) -> Self {
        Dragon {
            being: Being::new(BeingKind::Dragon, position),
            behavior,
        }
    }

    /// A dragon that starts its game asleep. Sleep is otherwise managed by
    /// the dragon's own turn logic.
    pub fn asleep(position: Coord, behavior: DragonBehavior) -> Self {
        let mut dragon = Dragon::new(position, behavior);
        dragon.being.fall_asleep();
        dragon
    }

    #[inline]
    pub fn being(&self) -> &Being {
        &self.being
    }

    pub(crate) fn being_mut(&mut self) -> &mut Being {
        &mut self.being
    }

    #[inline]
    pub fn behavior(&self) -> DragonBehavior {
        self.behavior
    }

    /// Resolves the dragon's movement for one tick: a uniform random step,
    /// gated by its behavior and sleep state.
    pub(crate) fn take_turn(&mut self, labyrinth: &Labyrinth, rng: &mut impl Rng) {
        if !self.being.is_alive() || self.being.is_moving() {
            return;
        }
        match self.behavior {
            DragonBehavior::Stationary => {}
            DragonBehavior::Wandering => self.random_step(labyrinth, rng),
            DragonBehavior::WanderingSleepy => {
                if self.being.is_sleeping() {
                    if rng.random_range(0..WAKE_ODDS) == 0 {
                        self.being.wake();
                    }
                    return;
                }
                if rng.random_range(0..SLEEP_ODDS) == 0 {
                    self.being.fall_asleep();
                    return;
                }
                self.random_step(labyrinth, rng);
            }
        }
    }

    fn random_step(&mut self, labyrinth: &Labyrinth, rng: &mut impl Rng) {
        let direction = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
        self.being.step(labyrinth, direction);
    }
}

/// The hero's companion bird.
///
/// The eagle wanders like any being during the movement phase, then
/// re-evaluates once per tick: it flies back toward the hero whenever it has
/// strayed, and it is easy prey for an awake dragon when caught away from the
/// hero's cell. Its update mutates only the eagle itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eagle {
    being: Being,
}

impl Eagle {
    pub(crate) fn new(position: Coord) -> Self {
        Eagle {
            being: Being::new(BeingKind::Eagle, position),
        }
    }

    #[inline]
    pub fn being(&self) -> &Being {
        &self.being
    }

    pub(crate) fn being_mut(&mut self) -> &mut Being {
        &mut self.being
    }

    pub(crate) fn update(&mut self, labyrinth: &Labyrinth, hero: &Hero, dragons: &[Dragon]) {
        if !self.being.is_alive() {
            return;
        }

        // Fly one cell back toward the hero when out of reach. Flight ignores
        // walls but stays inside the labyrinth.
        let hero_position = hero.being().position();
        if self.being.position().chebyshev_distance(hero_position) > 1 {
            let position = self.being.position();
            let target = Coord::new(
                position.x + (hero_position.x - position.x).signum(),
                position.y + (hero_position.y - position.y).signum(),
            );
            if labyrinth.in_bounds(target) {
                self.being.set_position(target);
            }
        }

        // Away from the hero, an adjacent awake dragon catches it.
        if self.being.position() != hero_position
            && dragons.iter().any(|dragon| {
                dragon.being().is_alive()
                    && !dragon.being().is_sleeping()
                    && dragon.being().distance_to(&self.being) <= 1
            })
        {
            self.being.kill();
        }
    }
}

/// The sword pickup, bound to its labyrinth cell until the hero claims it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sword {
    position: Coord,
    claimed: bool,
}

impl Sword {
    pub(crate) fn new(position: Coord) -> Self {
        Sword {
            position,
            claimed: false,
        }
    }

    #[inline]
    pub fn position(&self) -> Coord {
        self.position
    }

    #[inline]
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    fn claim(&mut self) {
        self.claimed = true;
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn open_room() -> Labyrinth {
        Labyrinth::parse("#####\n#...#\n#...#\n#...#\n#####").unwrap()
    }

    #[test]
    fn step_moves_onto_traversable_cells_only() {
        let lab = open_room();
        let mut being = Being::new(BeingKind::Hero, Coord::new(1, 1));

        being.step(&lab, Direction::Right);
        assert_eq!(being.position(), Coord::new(2, 1));

        being.step(&lab, Direction::Up);
        assert_eq!(being.position(), Coord::new(2, 1));
    }

    #[test]
    fn dead_beings_never_move() {
        let lab = open_room();
        let mut being = Being::new(BeingKind::Dragon, Coord::new(1, 1));
        being.kill();
        being.kill();
        assert!(!being.is_alive());

        being.step(&lab, Direction::Right);
        assert_eq!(being.position(), Coord::new(1, 1));
    }

    #[test]
    fn catching_the_sword_is_one_way_and_idempotent() {
        let mut hero = Hero::new(Coord::new(2, 2));
        let mut sword = Sword::new(Coord::new(2, 2));

        hero.catch_sword_if_possible(&mut sword);
        assert!(hero.has_sword());
        assert!(sword.is_claimed());

        hero.catch_sword_if_possible(&mut sword);
        assert!(hero.has_sword());
        assert!(sword.is_claimed());
    }

    #[test]
    fn hero_off_the_sword_cell_claims_nothing() {
        let mut hero = Hero::new(Coord::new(1, 1));
        let mut sword = Sword::new(Coord::new(3, 3));

        hero.catch_sword_if_possible(&mut sword);
        assert!(!hero.has_sword());
        assert!(!sword.is_claimed());
    }

    #[test]
    fn stationary_dragons_hold_their_ground() {
        let lab = open_room();
        let mut rng = StdRng::seed_from_u64(1);
        let mut dragon = Dragon::new(Coord::new(2, 2), DragonBehavior::Stationary);

        for _ in 0..20 {
            dragon.take_turn(&lab, &mut rng);
        }
        assert_eq!(dragon.being().position(), Coord::new(2, 2));
    }

    #[test]
    fn sleepy_dragons_eventually_doze_and_wake() {
        let lab = open_room();
        let mut rng = StdRng::seed_from_u64(3);
        let mut dragon = Dragon::new(Coord::new(2, 2), DragonBehavior::WanderingSleepy);

        let mut slept = false;
        let mut woke_after_sleeping = false;
        for _ in 0..200 {
            let was_sleeping = dragon.being().is_sleeping();
            dragon.take_turn(&lab, &mut rng);
            if dragon.being().is_sleeping() {
                slept = true;
            }
            if was_sleeping && !dragon.being().is_sleeping() {
                woke_after_sleeping = true;
            }
        }
        assert!(slept);
        assert!(woke_after_sleeping);
    }

    #[test]
    fn eagle_flies_back_toward_a_distant_hero() {
        let lab = open_room();
        let hero = Hero::new(Coord::new(1, 1));
        let mut eagle = Eagle::new(Coord::new(3, 3));

        eagle.update(&lab, &hero, &[]);
        assert_eq!(eagle.being().position(), Coord::new(2, 2));
    }

    #[test]
    fn eagle_away_from_the_hero_falls_to_an_awake_dragon() {
        let lab = open_room();
        let hero = Hero::new(Coord::new(1, 1));
        let dragons = vec![Dragon::new(Coord::new(3, 2), DragonBehavior::Stationary)];
        let mut eagle = Eagle::new(Coord::new(3, 3));

        eagle.update(&lab, &hero, &dragons);
        assert!(!eagle.being().is_alive());
    }

    #[test]
    fn eagle_on_the_heros_cell_is_safe() {
        let lab = open_room();
        let hero = Hero::new(Coord::new(2, 2));
        let dragons = vec![Dragon::new(Coord::new(3, 2), DragonBehavior::Stationary)];
        let mut eagle = Eagle::new(Coord::new(2, 2));

        eagle.update(&lab, &hero, &dragons);
        assert!(eagle.being().is_alive());
    }

    #[test]
    fn sleeping_dragons_do_not_catch_the_eagle() {
        let lab = open_room();
        let hero = Hero::new(Coord::new(1, 1));
        let dragons = vec![Dragon::asleep(Coord::new(3, 2), DragonBehavior::Stationary)];
        let mut eagle = Eagle::new(Coord::new(3, 3));

        eagle.update(&lab, &hero, &dragons);
        assert!(eagle.being().is_alive());
    }
}
