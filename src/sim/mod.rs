//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (virtual clock, no real timers)
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod board;
pub mod physics;
pub mod sched;
pub mod state;
pub mod tick;

pub use board::{Bin, Board, Peg, PegStyle};
pub use physics::{BoxKind, LetterBody, PhysicsEvent, PhysicsWorld};
pub use sched::{Scheduler, TimerKind};
pub use state::{BinColor, Effect, GamePhase, GameState, IntroStep, PcgUnitRng, UnitRng};
pub use tick::{TickCtx, handle_key, handle_pointer, start_intro, tick};
