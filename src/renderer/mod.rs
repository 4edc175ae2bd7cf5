//! Display-list renderer
//!
//! Rendering is split from presentation: each frame the scene is rebuilt as a
//! flat list of draw commands in reference coordinates, and the host rasters
//! them however it likes. Keeping the output a plain data structure lets the
//! whole visual layer run headless in tests.

use glam::Vec2;

use crate::Rect;
use crate::consts::*;
use crate::hud_rect;
use crate::scores::BinScores;
use crate::sim::board::Board;
use crate::sim::physics::PhysicsWorld;
use crate::sim::state::{GamePhase, GameState, NEVER_MS};

/// Nudge wiggle duration
const WIGGLE_MS: f64 = 450.0;
/// Bin glow duration after a confirmed catch
const BIN_PULSE_MS: f64 = 900.0;
/// Score counter bump duration
const BUMP_MS: f64 = 350.0;
/// Stuck warning pulse period
const WARN_PERIOD_MS: f64 = 340.0;

const BACKGROUND: [f32; 4] = [0.96, 0.95, 0.92, 1.0];
const LETTER_FILL: [f32; 4] = [0.16, 0.16, 0.2, 1.0];
const LETTER_FACE: [f32; 4] = [0.97, 0.97, 0.99, 1.0];
const HUD_FRAME: [f32; 4] = [0.3, 0.3, 0.34, 1.0];

/// One drawing primitive in reference coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear { color: [f32; 4] },
    Circle { center: Vec2, radius: f32, color: [f32; 4] },
    Ring { center: Vec2, radius: f32, thickness: f32, color: [f32; 4] },
    RectFill { rect: Rect, color: [f32; 4] },
    Glyph { ch: char, center: Vec2, size: f32, color: [f32; 4] },
    Star { center: Vec2, size: f32, color: [f32; 4] },
}

/// Normalized progress of a one-shot animation started at `since`, or None
/// when it never started or already finished
fn anim01(now_ms: f64, since_ms: f64, duration_ms: f64) -> Option<f32> {
    if since_ms <= NEVER_MS {
        return None;
    }
    let t = (now_ms - since_ms) / duration_ms;
    (0.0..1.0).contains(&t).then_some(t as f32)
}

fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
    [color[0], color[1], color[2], alpha]
}

/// Rebuild the full scene for the current frame
pub fn build_scene(
    state: &GameState,
    board: &Board,
    world: &PhysicsWorld,
    scores: Option<&BinScores>,
    out: &mut Vec<DrawCmd>,
) {
    out.clear();
    out.push(DrawCmd::Clear { color: BACKGROUND });

    draw_bins(state, board, out);
    draw_pegs(state, board, out);
    draw_scores(state, board, scores, out);
    draw_hud(state, out);
    draw_letter(state, world, out);
}

fn draw_pegs(state: &GameState, board: &Board, out: &mut Vec<DrawCmd>) {
    for peg in &board.pegs {
        let mut center = peg.pos;
        if let Some(t) = anim01(state.now_ms, peg.wiggle_at_ms, WIGGLE_MS) {
            // Damped lateral shake
            let amp = 3.0 * (1.0 - t);
            center.x += amp * (t * 28.0 + peg.style.wiggle_phase).sin();
        }
        let g = peg.style.shade;
        out.push(DrawCmd::Circle {
            center,
            radius: peg.radius,
            color: [g, g, g, peg.style.fill_alpha],
        });
        out.push(DrawCmd::Ring {
            center,
            radius: peg.radius,
            thickness: 2.0,
            color: [g * 0.6, g * 0.6, g * 0.6, peg.style.outline_alpha],
        });
    }
}

fn draw_bins(state: &GameState, board: &Board, out: &mut Vec<DrawCmd>) {
    for bin in &board.bins {
        let color = bin.color.rgba();
        let glow = anim01(state.now_ms, state.bin_pulse_at[bin.color.index()], BIN_PULSE_MS);

        let zone_alpha = match glow {
            Some(t) => 0.22 + 0.5 * (1.0 - t),
            None => 0.22,
        };
        out.push(DrawCmd::RectFill {
            rect: bin.zone,
            color: with_alpha(color, zone_alpha),
        });
        out.push(DrawCmd::RectFill {
            rect: bin.left_wall,
            color: with_alpha(color, 0.9),
        });
        out.push(DrawCmd::RectFill {
            rect: bin.right_wall,
            color: with_alpha(color, 0.9),
        });
        out.push(DrawCmd::RectFill {
            rect: bin.lip,
            color: with_alpha(color, 0.9),
        });

        if let Some(t) = glow {
            // Expanding ring from the bin center on catch
            out.push(DrawCmd::Ring {
                center: bin.zone.center(),
                radius: 20.0 + 70.0 * t,
                thickness: 4.0 * (1.0 - t) + 1.0,
                color: with_alpha(color, 1.0 - t),
            });
        }
    }
}

fn draw_scores(
    state: &GameState,
    board: &Board,
    scores: Option<&BinScores>,
    out: &mut Vec<DrawCmd>,
) {
    let Some(scores) = scores else {
        return;
    };
    for bin in &board.bins {
        let i = bin.color.index();
        let center = Vec2::new(bin.zone.center().x, BIN_TOP - 18.0);

        let mut size = 22.0;
        if let Some(t) = anim01(state.now_ms, state.count_bump_at[i], BUMP_MS) {
            // Quick overshoot, settling back
            size += 10.0 * (1.0 - t);
        }
        out.push(DrawCmd::Glyph {
            ch: char::from_digit(u32::from(scores.count(i)), 10).unwrap_or('0'),
            center,
            size,
            color: with_alpha(bin.color.rgba(), 1.0),
        });

        let stars = scores.stars(i).min(5);
        for s in 0..stars {
            let mut star_size = 10.0;
            if s + 1 == stars
                && let Some(t) = anim01(state.now_ms, state.star_bump_at[i], BUMP_MS)
            {
                star_size += 6.0 * (1.0 - t);
            }
            out.push(DrawCmd::Star {
                center: center + Vec2::new((s as f32 - (stars as f32 - 1.0) / 2.0) * 16.0, -24.0),
                size: star_size,
                color: [0.95, 0.8, 0.2, 1.0],
            });
        }
    }
}

fn draw_hud(state: &GameState, out: &mut Vec<DrawCmd>) {
    let hud = hud_rect();
    out.push(DrawCmd::RectFill {
        rect: hud,
        color: [1.0, 1.0, 1.0, 0.85],
    });
    out.push(DrawCmd::Ring {
        center: hud.center(),
        radius: hud.width().min(hud.height()) / 2.0 - 8.0,
        thickness: 3.0,
        color: HUD_FRAME,
    });
    if let Some(ch) = state.target_letter {
        out.push(DrawCmd::Glyph {
            ch,
            center: hud.center(),
            size: 96.0,
            color: HUD_FRAME,
        });
    }
}

fn draw_letter(state: &GameState, world: &PhysicsWorld, out: &mut Vec<DrawCmd>) {
    let Some(letter) = world.letter() else {
        return;
    };

    out.push(DrawCmd::Circle {
        center: letter.pos,
        radius: letter.radius,
        color: LETTER_FILL,
    });
    if let Some(ch) = state.target_letter {
        out.push(DrawCmd::Glyph {
            ch,
            center: letter.pos,
            size: letter.radius * 1.4,
            color: LETTER_FACE,
        });
    }

    // Pulsing warning ring while the stuck despawn is pending
    if state.phase == GamePhase::Dropping
        && let Some(warn_since) = state.stuck_warn_since_ms
    {
        let t = ((state.now_ms - warn_since) % WARN_PERIOD_MS / WARN_PERIOD_MS) as f32;
        out.push(DrawCmd::Ring {
            center: letter.pos,
            radius: letter.radius + 6.0 + 10.0 * t,
            thickness: 3.0,
            color: [0.85, 0.3, 0.25, 1.0 - t],
        });
    }
}
