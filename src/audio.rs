//! Reactive audio cue contract
//!
//! The game core emits discrete named cues at state-machine transition points
//! and on physics contacts; synthesis, timing and rate-limiting belong to the
//! host's audio subsystem. A sink must never let a backend failure escape into
//! gameplay - cue dispatch is fire-and-forget.

use crate::sim::state::BinColor;

/// Surface flavor carried by bounce cues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BounceSurface {
    Peg,
    Wall,
}

/// Named cues the game core emits
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    /// Letter launched off a correct keypress
    Launch,
    /// Letter hit a peg or boundary wall; strength is 0..1 from impact speed
    Bounce { strength: f32, surface: BounceSurface },
    /// Letter rattling against bin walls
    BinBounce { strength: f32 },
    /// Catch confirmed in a bin
    Reward { color: BinColor, strength: f32 },
    /// Stuck letter despawned
    Poof,
    /// "Get ready" beat at the start of the intro suspense
    Ready,
    /// Score counter ticked up
    ScoreTick,
    /// Score rolled over to a new star
    Star,
    /// Suspense drumroll; plays for the given duration
    DrumrollStart { duration_ms: f64 },
    /// Cancels a running drumroll (teardown mid-suspense)
    DrumrollStop,
    /// Wrong key pressed while awaiting the target letter
    Wrong,
    /// Key pressed outside the awaiting-key phase
    NotYet,
}

/// Audio backend the session plays cues into.
///
/// Implementations own all backend failure handling: a locked or missing
/// audio device must degrade to silence, never to an error the game sees.
pub trait AudioSink {
    fn play(&mut self, cue: Cue);
}

/// Sink that drops every cue (default when the host has no audio)
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: Cue) {}
}

/// Sink that logs cues at debug level (used by the headless demo)
#[derive(Debug, Default)]
pub struct LogAudio;

impl AudioSink for LogAudio {
    fn play(&mut self, cue: Cue) {
        log::debug!("cue: {:?}", cue);
    }
}
