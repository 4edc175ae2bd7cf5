//! Letter Drop - a pegboard letter-catching mini-game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (board generation, physics, game state)
//! - `renderer`: Immediate-mode display-list builder
//! - `platform`: Host-injected collaborators (viewport, storage, HUD)
//! - `session`: `LettersGame` lifecycle (`start`/`dispose`, frame loop)
//! - `audio`: Named cue contract for the reactive audio layer
//! - `scores`: Per-bin persistent counters

pub mod audio;
pub mod config;
pub mod platform;
pub mod renderer;
pub mod scores;
pub mod session;
pub mod sim;

pub use config::GameConfig;
pub use scores::BinScores;
pub use session::{HostDeps, LettersGame, Mount};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Fixed timestep in milliseconds (the virtual clock advances by this per tick)
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Reference canvas (all game logic runs in this coordinate space)
    pub const REF_WIDTH: f32 = 1280.0;
    pub const REF_HEIGHT: f32 = 800.0;

    /// Peg field vertical extent (bottom margin is reserved for the bins)
    pub const PEG_TOP: f32 = 64.0;
    pub const PEG_BOTTOM: f32 = 676.0;
    /// Staggered triangular lattice spacing
    pub const LATTICE_DX: f32 = 118.0;
    pub const LATTICE_DY: f32 = 102.0;
    /// Lattice side margin
    pub const LATTICE_MARGIN: f32 = 36.0;

    pub const PEG_RADIUS: f32 = 14.0;
    /// Minimum center distance between any two pegs
    pub const MIN_PEG_DIST: f32 = 64.0;
    /// Maximum displacement of a nudged peg from its home position
    pub const MAX_PEG_DRIFT: f32 = 22.0;
    /// Pointer taps within this distance of a peg center nudge it
    pub const NUDGE_GRAB_RADIUS: f32 = 60.0;

    /// Target peg count range; the density threshold is retried to land here
    pub const PEG_COUNT_MIN: usize = 56;
    pub const PEG_COUNT_MAX: usize = 86;
    pub const BOARD_RETRIES: u32 = 5;
    /// Density threshold step applied per retry
    pub const DENSITY_STEP: f32 = 0.03;

    /// Falling letter bubble
    pub const LETTER_RADIUS: f32 = 26.0;

    /// Bin strip along the bottom edge (six bins exactly tile REF_WIDTH)
    pub const BIN_COUNT: usize = 6;
    pub const BIN_TOP: f32 = 690.0;
    pub const BIN_WALL_WIDTH: f32 = 10.0;
    pub const BIN_WALL_TOP: f32 = 660.0;
    pub const BIN_LIP_HEIGHT: f32 = 6.0;
    /// Sensor sub-zone inset from the bin zone sides
    pub const BIN_SENSOR_INSET: f32 = 14.0;
    pub const BIN_SENSOR_TOP: f32 = 716.0;

    /// HUD glyph box (top-right) - pegs never generate inside it
    pub const HUD_RECT: (f32, f32, f32, f32) = (1040.0, 36.0, 210.0, 180.0);
    /// Launch corridor immediately left of the HUD box
    pub const LAUNCH_RECT: (f32, f32, f32, f32) = (900.0, 0.0, 140.0, 240.0);
    /// Letter spawn point (inside the launch corridor)
    pub const LAUNCH_X: f32 = 964.0;
    pub const LAUNCH_Y: f32 = 170.0;

    /// Surface restitution
    pub const PEG_RESTITUTION: f32 = 0.55;
    pub const WALL_RESTITUTION: f32 = 0.4;
    pub const BIN_RESTITUTION: f32 = 0.28;
    /// Impacts slower than this emit no bounce event
    pub const BOUNCE_MIN_SPEED: f32 = 24.0;
    /// Impact speed mapped to bounce cue strength 1.0
    pub const BOUNCE_MAX_SPEED: f32 = 900.0;
}

/// Axis-aligned rectangle in reference pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + w, y + h),
        }
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Closest point inside the rect to `p`
    #[inline]
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }
}

/// HUD glyph no-go rectangle
pub fn hud_rect() -> Rect {
    let (x, y, w, h) = consts::HUD_RECT;
    Rect::new(x, y, w, h)
}

/// Launch corridor no-go rectangle
pub fn launch_rect() -> Rect {
    let (x, y, w, h) = consts::LAUNCH_RECT;
    Rect::new(x, y, w, h)
}
