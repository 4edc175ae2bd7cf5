//! Game state and core simulation types

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::audio::Cue;
use crate::consts::BIN_COUNT;

/// The six fixed bin color identities, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl BinColor {
    pub const ALL: [BinColor; BIN_COUNT] = [
        BinColor::Red,
        BinColor::Orange,
        BinColor::Yellow,
        BinColor::Green,
        BinColor::Blue,
        BinColor::Purple,
    ];

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|c| c == self).unwrap_or(0)
    }

    pub fn rgba(&self) -> [f32; 4] {
        match self {
            BinColor::Red => [0.89, 0.29, 0.29, 1.0],
            BinColor::Orange => [0.95, 0.58, 0.22, 1.0],
            BinColor::Yellow => [0.94, 0.82, 0.28, 1.0],
            BinColor::Green => [0.36, 0.76, 0.42, 1.0],
            BinColor::Blue => [0.30, 0.54, 0.89, 1.0],
            BinColor::Purple => [0.62, 0.41, 0.84, 1.0],
        }
    }
}

/// Current phase of gameplay - exactly one active at any instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Letter hidden; intro pacing runs on the scheduler
    Introducing,
    /// Target letter revealed, waiting for a matching keypress
    IdleAwaitingKey,
    /// Physics-driven fall, with stuck-detection heuristics
    Dropping,
    /// Inside a bin sensor, waiting for catch confirmation
    InBin,
    /// Catch confirmed; short hold before score bump and next intro
    Rewarding,
}

/// Sub-state of the `Introducing` pacing sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroStep {
    /// Base delay before the get-ready cue
    Hold,
    /// Suspense drumroll running
    Drumroll,
    /// Beat between drumroll end and the reveal
    RevealBeat,
}

/// Side effects a tick asks the session to perform
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Cue(Cue),
    /// Confirmed catch: bump (and persist) this bin's score
    ScoreBump { bin: usize },
    /// Reveal the target glyph on the HUD
    ShowGlyph(char),
    /// Hide the HUD glyph during the intro
    HideGlyph,
}

/// Unit-interval random source for gameplay draws (letter choice, launch
/// impulse, suspense duration). Injectable so tests can script exact values.
pub trait UnitRng {
    /// Next value in [0, 1)
    fn next_unit(&mut self) -> f64;
}

/// Default draw source backed by the session's seeded PCG stream
#[derive(Debug, Clone)]
pub struct PcgUnitRng(pub Pcg32);

impl UnitRng for PcgUnitRng {
    fn next_unit(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

/// Map a unit draw to an uppercase letter (uniform, repeats allowed)
pub fn letter_from_unit(u: f64) -> char {
    const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let idx = ((u * 26.0) as usize).min(25);
    ALPHABET[idx] as char
}

/// Timestamp sentinel meaning "never happened"
pub const NEVER_MS: f64 = -1.0e12;

/// Complete mutable game state for one session
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,
    /// Virtual clock in ms; advances by exactly one timestep per tick
    pub now_ms: f64,
    pub intro_step: IntroStep,
    /// Letter the player must press (None while hidden during the intro)
    pub target_letter: Option<char>,

    // Dropping-phase trackers
    pub drop_started_ms: f64,
    /// Start of the current continuous low-speed window
    pub slow_since_ms: Option<f64>,
    /// Start of the stuck warning pulse
    pub stuck_warn_since_ms: Option<f64>,

    // InBin-phase trackers
    pub bin_index: Option<usize>,
    pub bin_entered_ms: f64,
    /// Start of the current continuous stillness window
    pub still_since_ms: Option<f64>,

    // Animation timestamps (render-only, keyed by bin id)
    pub bin_pulse_at: [f64; BIN_COUNT],
    pub count_bump_at: [f64; BIN_COUNT],
    pub star_bump_at: [f64; BIN_COUNT],
}

impl GameState {
    pub fn new() -> Self {
        Self {
            phase: GamePhase::Introducing,
            now_ms: 0.0,
            intro_step: IntroStep::Hold,
            target_letter: None,
            drop_started_ms: NEVER_MS,
            slow_since_ms: None,
            stuck_warn_since_ms: None,
            bin_index: None,
            bin_entered_ms: NEVER_MS,
            still_since_ms: None,
            bin_pulse_at: [NEVER_MS; BIN_COUNT],
            count_bump_at: [NEVER_MS; BIN_COUNT],
            star_bump_at: [NEVER_MS; BIN_COUNT],
        }
    }

    /// Clear all per-letter motion trackers (on despawn or phase reset)
    pub fn clear_trackers(&mut self) {
        self.slow_since_ms = None;
        self.stuck_warn_since_ms = None;
        self.bin_index = None;
        self.still_since_ms = None;
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
