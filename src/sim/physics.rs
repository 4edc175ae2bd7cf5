//! Rigid-body world for the falling letter
//!
//! A fixed, statically-typed physics adapter: static peg circles, static
//! boxes (boundary and bin walls, floor lips), non-physical sensor zones and
//! at most one dynamic circle. Integration is semi-implicit Euler at the
//! fixed timestep; collisions resolve with positional correction plus
//! velocity reflection scaled by per-surface restitution.

use glam::Vec2;

use crate::Rect;
use crate::consts::*;

/// Surface class of a static box, used for restitution and bounce flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxKind {
    /// Board boundary wall
    Wall,
    /// Bin side wall or floor lip
    BinWall,
}

/// Events produced by one physics step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicsEvent {
    /// Letter bounced off a peg
    PegBounce { speed: f32 },
    /// Letter bounced off a boundary wall
    WallBounce { speed: f32 },
    /// Letter bounced off a bin wall or lip
    BinBounce { speed: f32 },
    /// Letter center crossed into a bin sensor zone
    SensorEnter { bin: usize },
}

/// The dynamic falling-letter body
#[derive(Debug, Clone, Copy)]
pub struct LetterBody {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy)]
struct PegCircle {
    pos: Vec2,
    radius: f32,
}

/// 2D world holding all static geometry and the (optional) letter body
#[derive(Debug)]
pub struct PhysicsWorld {
    gravity: f32,
    bounds: Rect,
    pegs: Vec<PegCircle>,
    boxes: Vec<(Rect, BoxKind)>,
    sensors: Vec<Rect>,
    letter: Option<LetterBody>,
    inside_sensor: Option<usize>,
}

impl PhysicsWorld {
    pub fn new(bounds: Rect, gravity: f32) -> Self {
        Self {
            gravity,
            bounds,
            pegs: Vec::new(),
            boxes: Vec::new(),
            sensors: Vec::new(),
            letter: None,
            inside_sensor: None,
        }
    }

    pub fn add_peg(&mut self, pos: Vec2, radius: f32) -> usize {
        self.pegs.push(PegCircle { pos, radius });
        self.pegs.len() - 1
    }

    /// Relocate a static peg (player nudge)
    pub fn move_peg(&mut self, index: usize, pos: Vec2) {
        if let Some(peg) = self.pegs.get_mut(index) {
            peg.pos = pos;
        }
    }

    pub fn add_box(&mut self, rect: Rect, kind: BoxKind) {
        self.boxes.push((rect, kind));
    }

    pub fn add_sensor(&mut self, rect: Rect) -> usize {
        self.sensors.push(rect);
        self.sensors.len() - 1
    }

    pub fn spawn_letter(&mut self, pos: Vec2, vel: Vec2, radius: f32) {
        self.letter = Some(LetterBody { pos, vel, radius });
        self.inside_sensor = None;
    }

    pub fn remove_letter(&mut self) {
        self.letter = None;
        self.inside_sensor = None;
    }

    pub fn letter(&self) -> Option<&LetterBody> {
        self.letter.as_ref()
    }

    pub fn set_letter_velocity(&mut self, vel: Vec2) {
        if let Some(letter) = self.letter.as_mut() {
            letter.vel = vel;
        }
    }

    /// Drop all bodies and geometry (session teardown)
    pub fn clear(&mut self) {
        self.pegs.clear();
        self.boxes.clear();
        self.sensors.clear();
        self.letter = None;
        self.inside_sensor = None;
    }

    /// Advance by one fixed timestep
    pub fn step(&mut self, dt: f32) -> Vec<PhysicsEvent> {
        let mut events = Vec::new();
        let Some(mut letter) = self.letter else {
            return events;
        };

        letter.vel.y += self.gravity * dt;
        letter.pos += letter.vel * dt;

        for peg in &self.pegs {
            if let Some(speed) = collide_circle(&mut letter, peg.pos, peg.radius, PEG_RESTITUTION)
                && speed >= BOUNCE_MIN_SPEED
            {
                events.push(PhysicsEvent::PegBounce { speed });
            }
        }

        for (rect, kind) in &self.boxes {
            if let Some(speed) = collide_box(&mut letter, rect, restitution(*kind))
                && speed >= BOUNCE_MIN_SPEED
            {
                events.push(match kind {
                    BoxKind::Wall => PhysicsEvent::WallBounce { speed },
                    BoxKind::BinWall => PhysicsEvent::BinBounce { speed },
                });
            }
        }

        if let Some(speed) = self.collide_bounds(&mut letter)
            && speed >= BOUNCE_MIN_SPEED
        {
            events.push(PhysicsEvent::WallBounce { speed });
        }

        let sensor_now = self
            .sensors
            .iter()
            .position(|rect| rect.contains(letter.pos));
        if let Some(bin) = sensor_now
            && self.inside_sensor != Some(bin)
        {
            events.push(PhysicsEvent::SensorEnter { bin });
        }
        self.inside_sensor = sensor_now;

        self.letter = Some(letter);
        events
    }

    /// Keep the letter inside the boundary rect, reflecting on contact
    fn collide_bounds(&self, letter: &mut LetterBody) -> Option<f32> {
        let r = letter.radius;
        let mut impact: f32 = 0.0;

        if letter.pos.x - r < self.bounds.min.x {
            letter.pos.x = self.bounds.min.x + r;
            if letter.vel.x < 0.0 {
                impact = impact.max(-letter.vel.x);
                letter.vel.x = -letter.vel.x * WALL_RESTITUTION;
            }
        } else if letter.pos.x + r > self.bounds.max.x {
            letter.pos.x = self.bounds.max.x - r;
            if letter.vel.x > 0.0 {
                impact = impact.max(letter.vel.x);
                letter.vel.x = -letter.vel.x * WALL_RESTITUTION;
            }
        }

        if letter.pos.y - r < self.bounds.min.y {
            letter.pos.y = self.bounds.min.y + r;
            if letter.vel.y < 0.0 {
                impact = impact.max(-letter.vel.y);
                letter.vel.y = -letter.vel.y * WALL_RESTITUTION;
            }
        } else if letter.pos.y + r > self.bounds.max.y {
            letter.pos.y = self.bounds.max.y - r;
            if letter.vel.y > 0.0 {
                impact = impact.max(letter.vel.y);
                letter.vel.y = -letter.vel.y * WALL_RESTITUTION;
            }
        }

        (impact > 0.0).then_some(impact)
    }
}

fn restitution(kind: BoxKind) -> f32 {
    match kind {
        BoxKind::Wall => WALL_RESTITUTION,
        BoxKind::BinWall => BIN_RESTITUTION,
    }
}

/// Resolve letter vs static circle. Returns the impact speed on contact.
fn collide_circle(
    letter: &mut LetterBody,
    center: Vec2,
    radius: f32,
    restitution: f32,
) -> Option<f32> {
    let delta = letter.pos - center;
    let dist = delta.length();
    let min_dist = letter.radius + radius;
    if dist >= min_dist {
        return None;
    }

    // Degenerate overlap: push straight up
    let normal = if dist > 1e-4 { delta / dist } else { Vec2::NEG_Y };
    letter.pos = center + normal * min_dist;

    let approach = letter.vel.dot(normal);
    if approach < 0.0 {
        // v' = v - (1+e)(v.n)n
        letter.vel -= (1.0 + restitution) * approach * normal;
        Some(-approach)
    } else {
        None
    }
}

/// Resolve letter vs static AABB. Returns the impact speed on contact.
fn collide_box(letter: &mut LetterBody, rect: &Rect, restitution: f32) -> Option<f32> {
    let closest = rect.clamp_point(letter.pos);
    let delta = letter.pos - closest;
    let dist = delta.length();
    if dist >= letter.radius || dist <= 1e-4 {
        // Center exactly on/inside the box face set is not expected at the
        // fixed timestep; skip rather than guess a normal.
        return None;
    }

    let normal = delta / dist;
    letter.pos = closest + normal * letter.radius;

    let approach = letter.vel.dot(normal);
    if approach < 0.0 {
        letter.vel -= (1.0 + restitution) * approach * normal;
        Some(-approach)
    } else {
        None
    }
}
