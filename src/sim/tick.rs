//! Fixed timestep simulation tick
//!
//! Advances the virtual clock, fires due timers, steps physics and runs the
//! stuck/catch heuristics. All phase transitions happen here or in the input
//! handlers below; the session only relays effects to its collaborators.

use glam::Vec2;

use crate::GameConfig;
use crate::audio::{BounceSurface, Cue};
use crate::consts::*;
use crate::{hud_rect, launch_rect};

use super::board::Board;
use super::physics::{PhysicsEvent, PhysicsWorld};
use super::sched::{Scheduler, TimerKind};
use super::state::{Effect, GamePhase, GameState, IntroStep, UnitRng, letter_from_unit};

/// Per-tick context shared by the tick and input handlers
pub struct TickCtx<'a> {
    pub cfg: &'a GameConfig,
    pub rng: &'a mut dyn UnitRng,
}

/// Map impact speed to a 0..1 cue strength
fn bounce_strength(speed: f32) -> f32 {
    ((speed - BOUNCE_MIN_SPEED) / (BOUNCE_MAX_SPEED - BOUNCE_MIN_SPEED)).clamp(0.0, 1.0)
}

/// Bin-resident time mapped to reward cue strength 1.0
const CATCH_STRENGTH_FULL_MS: f64 = 2400.0;
/// Minimum reward cue strength
const CATCH_STRENGTH_MIN: f32 = 0.4;

/// Longer rattling before confirmation reads as a harder-won catch
fn catch_strength(resident_ms: f64) -> f32 {
    ((resident_ms / CATCH_STRENGTH_FULL_MS) as f32).clamp(CATCH_STRENGTH_MIN, 1.0)
}

/// Enter the intro sequence: hide the letter and schedule the pacing beats.
pub fn start_intro(
    state: &mut GameState,
    sched: &mut Scheduler,
    cfg: &GameConfig,
    out: &mut Vec<Effect>,
) {
    state.phase = GamePhase::Introducing;
    state.intro_step = IntroStep::Hold;
    state.target_letter = None;
    state.clear_trackers();
    out.push(Effect::HideGlyph);
    sched.schedule(state.now_ms + cfg.next_letter_delay_ms, TimerKind::IntroReady);
}

/// Advance the game by one fixed timestep
pub fn tick(
    state: &mut GameState,
    world: &mut PhysicsWorld,
    sched: &mut Scheduler,
    ctx: &mut TickCtx,
    out: &mut Vec<Effect>,
) {
    state.now_ms += SIM_DT_MS;
    let now = state.now_ms;

    for kind in sched.drain_due(now) {
        match kind {
            TimerKind::IntroReady => {
                state.intro_step = IntroStep::Drumroll;
                out.push(Effect::Cue(Cue::Ready));
                let span = ctx.cfg.suspense_max_ms - ctx.cfg.suspense_min_ms;
                let duration_ms = ctx.cfg.suspense_min_ms + ctx.rng.next_unit() * span;
                out.push(Effect::Cue(Cue::DrumrollStart { duration_ms }));
                sched.schedule(now + duration_ms, TimerKind::IntroDrumrollDone);
            }
            TimerKind::IntroDrumrollDone => {
                state.intro_step = IntroStep::RevealBeat;
                sched.schedule(now + ctx.cfg.reveal_beat_ms, TimerKind::IntroReveal);
            }
            TimerKind::IntroReveal => {
                let glyph = letter_from_unit(ctx.rng.next_unit());
                state.target_letter = Some(glyph);
                state.phase = GamePhase::IdleAwaitingKey;
                out.push(Effect::ShowGlyph(glyph));
            }
            TimerKind::RewardDone => {
                let bin = state.bin_index.take().unwrap_or(0);
                world.remove_letter();
                out.push(Effect::ScoreBump { bin });
                start_intro(state, sched, ctx.cfg, out);
            }
        }
    }

    for event in world.step(SIM_DT) {
        match event {
            PhysicsEvent::PegBounce { speed } => out.push(Effect::Cue(Cue::Bounce {
                strength: bounce_strength(speed),
                surface: BounceSurface::Peg,
            })),
            PhysicsEvent::WallBounce { speed } => out.push(Effect::Cue(Cue::Bounce {
                strength: bounce_strength(speed),
                surface: BounceSurface::Wall,
            })),
            PhysicsEvent::BinBounce { speed } => out.push(Effect::Cue(Cue::BinBounce {
                strength: bounce_strength(speed),
            })),
            PhysicsEvent::SensorEnter { bin } => match state.phase {
                GamePhase::Dropping => {
                    state.phase = GamePhase::InBin;
                    state.bin_index = Some(bin);
                    state.bin_entered_ms = now;
                    state.still_since_ms = None;
                }
                GamePhase::InBin if state.bin_index != Some(bin) => {
                    // Rattled across into a neighboring bin
                    state.bin_index = Some(bin);
                    state.bin_entered_ms = now;
                    state.still_since_ms = None;
                }
                _ => {}
            },
        }
    }

    match state.phase {
        GamePhase::Dropping => check_stuck(state, world, sched, ctx.cfg, out),
        GamePhase::InBin => check_catch(state, world, sched, ctx.cfg, out),
        _ => {}
    }
}

/// Stuck heuristic: nearly motionless for too long triggers a warning pulse,
/// then a forced despawn - a designed recovery path, not an error.
fn check_stuck(
    state: &mut GameState,
    world: &mut PhysicsWorld,
    sched: &mut Scheduler,
    cfg: &GameConfig,
    out: &mut Vec<Effect>,
) {
    let Some(letter) = world.letter() else {
        return;
    };
    let now = state.now_ms;

    if letter.vel.length() < cfg.stuck_eps {
        if state.slow_since_ms.is_none() {
            state.slow_since_ms = Some(now);
        }
    } else {
        state.slow_since_ms = None;
        state.stuck_warn_since_ms = None;
        return;
    }

    if now - state.drop_started_ms < cfg.min_drop_ms {
        return;
    }
    let Some(slow_since) = state.slow_since_ms else {
        return;
    };
    if now - slow_since < cfg.no_motion_ms {
        return;
    }

    match state.stuck_warn_since_ms {
        None => state.stuck_warn_since_ms = Some(now),
        Some(warn_since) if now - warn_since >= cfg.stuck_pulse_ms => {
            world.remove_letter();
            out.push(Effect::Cue(Cue::Poof));
            start_intro(state, sched, cfg, out);
        }
        Some(_) => {}
    }
}

/// Catch heuristic: linger plus stillness distinguishes a real catch from a
/// pass-through bounce.
fn check_catch(
    state: &mut GameState,
    world: &mut PhysicsWorld,
    sched: &mut Scheduler,
    cfg: &GameConfig,
    out: &mut Vec<Effect>,
) {
    let Some(letter) = world.letter() else {
        return;
    };
    let now = state.now_ms;

    // Vertical re-exit before confirmation reverts to a normal drop
    if letter.pos.y < BIN_WALL_TOP {
        state.phase = GamePhase::Dropping;
        state.bin_index = None;
        state.still_since_ms = None;
        state.slow_since_ms = None;
        state.stuck_warn_since_ms = None;
        return;
    }

    if letter.vel.length() < cfg.catch_eps {
        if state.still_since_ms.is_none() {
            state.still_since_ms = Some(now);
        }
    } else {
        state.still_since_ms = None;
        return;
    }

    let lingered = now - state.bin_entered_ms >= cfg.catch_linger_min_ms;
    let settled = state
        .still_since_ms
        .is_some_and(|s| now - s >= cfg.catch_still_ms);
    if lingered && settled {
        let bin = state.bin_index.unwrap_or(0);
        state.phase = GamePhase::Rewarding;
        state.bin_pulse_at[bin] = now;
        let strength = catch_strength(now - state.bin_entered_ms);
        out.push(Effect::Cue(Cue::Reward {
            color: super::state::BinColor::ALL[bin],
            strength,
        }));
        sched.schedule(now + cfg.post_confirm_hold_ms, TimerKind::RewardDone);
    }
}

/// Handle a printable keydown from the host.
pub fn handle_key(
    state: &mut GameState,
    world: &mut PhysicsWorld,
    ctx: &mut TickCtx,
    key: char,
    has_modifier: bool,
    out: &mut Vec<Effect>,
) {
    // Modifier chords (shortcuts) never reach the game
    if has_modifier || !key.is_ascii_graphic() {
        return;
    }

    if state.phase != GamePhase::IdleAwaitingKey {
        out.push(Effect::Cue(Cue::NotYet));
        return;
    }
    let Some(target) = state.target_letter else {
        out.push(Effect::Cue(Cue::NotYet));
        return;
    };

    if key.to_ascii_uppercase() == target {
        let vel = launch_velocity(ctx.rng);
        world.spawn_letter(Vec2::new(LAUNCH_X, LAUNCH_Y), vel, LETTER_RADIUS);
        state.phase = GamePhase::Dropping;
        state.drop_started_ms = state.now_ms;
        state.clear_trackers();
        out.push(Effect::Cue(Cue::Launch));
    } else {
        out.push(Effect::Cue(Cue::Wrong));
    }
}

/// Randomized leftward+upward launch impulse: a weighted burst-size mixture
/// independently mixed with an arc-height draw.
fn launch_velocity(rng: &mut dyn UnitRng) -> Vec2 {
    let class = rng.next_unit();
    let (lo, hi) = if class < 0.55 {
        (420.0, 560.0)
    } else if class < 0.90 {
        (560.0, 760.0)
    } else {
        (760.0, 980.0)
    };
    let speed = (lo + rng.next_unit() * (hi - lo)) as f32;
    // Elevation above horizontal, aimed left across the board
    let arc = (0.55 + rng.next_unit() * 0.60) as f32;
    Vec2::new(-speed * arc.cos(), -speed * arc.sin())
}

/// Handle a pointer tap in reference coordinates: nudge the nearest peg.
///
/// Nudges respect the generation invariants (spacing, no-go zones, bounded
/// drift from home), so they can never block the board permanently. Returns
/// true when a peg actually moved.
pub fn handle_pointer(
    state: &GameState,
    board: &mut Board,
    world: &mut PhysicsWorld,
    point: Vec2,
) -> bool {
    let Some(nearest) = board
        .pegs
        .iter()
        .enumerate()
        .map(|(i, peg)| (i, peg.pos.distance(point)))
        .filter(|(_, d)| *d <= NUDGE_GRAB_RADIUS)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
    else {
        return false;
    };

    let peg = &board.pegs[nearest];
    let away = peg.pos - point;
    let dir = if away.length() > 1e-3 {
        away.normalize()
    } else {
        Vec2::NEG_Y
    };
    let mut candidate = peg.pos + dir * 7.0;

    // Bound total drift from the generation home
    let drift = candidate - peg.home;
    if drift.length() > MAX_PEG_DRIFT {
        candidate = peg.home + drift.normalize() * MAX_PEG_DRIFT;
    }

    if hud_rect().contains(candidate) || launch_rect().contains(candidate) {
        return false;
    }
    let spaced = board
        .pegs
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != nearest)
        .all(|(_, other)| other.pos.distance(candidate) >= MIN_PEG_DIST);
    if !spaced {
        return false;
    }

    board.pegs[nearest].pos = candidate;
    board.pegs[nearest].wiggle_at_ms = state.now_ms;
    world.move_peg(nearest, candidate);
    true
}
