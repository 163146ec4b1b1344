// Compile-time defaults for the two benchmark simulations.
// Runtime overrides go through `CollisionConfig` / `WatorConfig`.

/// N-body collision simulation
pub mod collision {
    // Simulation parameters

    /// Attach a viewer window to the run
    pub const OPTION_RENDER: bool = false;

    /// Bodies closer than this are merged
    pub const MERGE_THRESHOLD: f32 = 0.001;

    pub const NUM_BODIES: u32 = 16_000;

    /// Upper bound on initial body mass
    pub const MAX_MASS: f32 = 75.0;

    pub const SEED: u64 = 42;

    /// Time step per iteration
    pub const TIME_INTERVAL: f32 = 0.5;

    pub const ITERATIONS: u32 = 1500;

    /// Velocity damping coefficient (fraction of velocity lost per unit time)
    pub const DAMPENING_FACTOR: f32 = 0.05;

    // Physical constants

    /// Gravitational constant (SI value, domain units are unscaled)
    pub const GRAVITY_CONSTANT: f32 = 6.673e-11;

    /// Softening length squared into the gravity denominator to keep
    /// coincident bodies finite before they merge
    pub const SOFTENING: f32 = 1e-4;

    /// Bound on each initial velocity component
    pub const MAX_INITIAL_SPEED: f32 = 0.001;

    /// Half-width of the square domain `[-1, 1]²`
    pub const DOMAIN_EXTENT: f32 = 1.0;
}

/// Wa-Tor predator-prey grid
pub mod wator {
    // Size of simulation

    pub const SEED: u64 = 42;
    pub const SIZE_X: u32 = 2048;
    pub const SIZE_Y: u32 = 1792;

    // Simulation constants

    /// Egg timer value an agent must exceed before it can reproduce
    pub const SPAWN_THRESHOLD: u32 = 4;

    /// Energy a shark gains from eating a fish
    pub const ENERGY_BOOST: u32 = 4;

    /// Energy of a freshly spawned shark
    pub const ENERGY_START: u32 = 2;

    pub const OPTION_SHARK_DIE: bool = true;
    pub const OPTION_FISH_SPAWN: bool = true;
    pub const OPTION_SHARK_SPAWN: bool = true;

    /// Compact agent pools after every iteration
    pub const OPTION_DEFRAG: bool = false;

    /// Log population counts after every iteration
    pub const OPTION_PRINT_STATS: bool = false;

    pub const NUM_ITERATIONS: u32 = 1000;

    /// Initial probability of a cell holding a fish
    pub const FISH_DENSITY: f64 = 0.4;

    /// Initial probability of a non-fish cell holding a shark
    pub const SHARK_DENSITY: f64 = 0.05;
}
