//! Procedural board generation
//!
//! Pegs come from a warped, masked triangular lattice: each lattice point is
//! displaced by two low-frequency sine warp fields plus uniform jitter, then
//! kept only where counter-based hash noise clears a smoothly varying density
//! threshold (organic clusters and gaps). A spatial hash grid enforces the
//! minimum inter-peg distance, and most left-half points are mirrored across
//! the vertical midline for loose bilateral symmetry. All randomness flows
//! from one generator seeded per mount, so a fixed seed reproduces an
//! identical board.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::collections::HashMap;
use std::f32::consts::TAU;

use crate::consts::*;
use crate::{Rect, hud_rect, launch_rect};

use super::state::{BinColor, NEVER_MS};

/// Base keep threshold for the hash-noise density mask
const BASE_DENSITY: f32 = 0.05;
/// Amplitude of the smooth threshold variation across the field
const DENSITY_VARIATION: f32 = 0.10;
/// Probability that a kept left-half peg is mirrored across the midline
const MIRROR_PROB: f64 = 0.86;

/// Warp field tuning (low-frequency sines + uniform jitter)
const WARP_X_AMP_A: f32 = 14.0;
const WARP_X_AMP_B: f32 = 9.0;
const WARP_Y_AMP: f32 = 10.0;
const JITTER_X: f32 = 10.0;
const JITTER_Y: f32 = 8.0;

/// Visual style jitter for a peg (grayscale only)
#[derive(Debug, Clone, Copy)]
pub struct PegStyle {
    /// Gray level 0..1
    pub shade: f32,
    pub fill_alpha: f32,
    pub outline_alpha: f32,
    /// Phase offset for the nudge wiggle animation
    pub wiggle_phase: f32,
}

/// A static circular obstacle
#[derive(Debug, Clone)]
pub struct Peg {
    pub pos: Vec2,
    /// Generation position; player nudges never drift farther than
    /// `MAX_PEG_DRIFT` from here
    pub home: Vec2,
    pub radius: f32,
    pub style: PegStyle,
    /// Virtual time of the last nudge, for the wiggle animation
    pub wiggle_at_ms: f64,
}

/// One of six colored receptacles along the bottom edge
#[derive(Debug, Clone)]
pub struct Bin {
    pub color: BinColor,
    /// Full receptacle zone
    pub zone: Rect,
    /// Sensor sub-zone that detects letter entry (non-physical)
    pub sensor: Rect,
    /// Rigid side walls
    pub left_wall: Rect,
    pub right_wall: Rect,
    /// Floor lip the letter settles on
    pub lip: Rect,
}

/// Immutable-after-generation board layout
#[derive(Debug, Clone)]
pub struct Board {
    pub pegs: Vec<Peg>,
    pub bins: [Bin; BIN_COUNT],
    pub seed: u64,
    /// Generation attempts consumed (1 when the first layout landed in range)
    pub attempts: u32,
}

/// Counter-based hash noise in [0, 1), stable per (seed, lattice cell)
fn hash_noise(seed: u64, ix: i64, iy: i64) -> f32 {
    let mut h = seed
        ^ (ix as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (iy as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    h ^= h >> 33;
    h = h.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    h ^= h >> 33;
    h = h.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    h ^= h >> 33;
    (h >> 40) as f32 / (1u64 << 24) as f32
}

/// Spatial hash grid rejecting points closer than `min_dist`
struct SpatialGrid {
    cell: f32,
    cells: HashMap<(i32, i32), Vec<Vec2>>,
}

impl SpatialGrid {
    fn new(min_dist: f32) -> Self {
        Self {
            cell: min_dist,
            cells: HashMap::new(),
        }
    }

    fn key(&self, p: Vec2) -> (i32, i32) {
        ((p.x / self.cell).floor() as i32, (p.y / self.cell).floor() as i32)
    }

    fn far_enough(&self, p: Vec2, min_dist: f32) -> bool {
        let (cx, cy) = self.key(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(points) = self.cells.get(&(cx + dx, cy + dy)) {
                    for q in points {
                        if p.distance(*q) < min_dist {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    fn insert(&mut self, p: Vec2) {
        let key = self.key(p);
        self.cells.entry(key).or_default().push(p);
    }
}

/// Per-board warp field phases, drawn once from the seeded stream
struct WarpField {
    phases: [f32; 6],
}

impl WarpField {
    fn draw(rng: &mut Pcg32) -> Self {
        let mut phases = [0.0; 6];
        for p in &mut phases {
            *p = rng.random::<f32>() * TAU;
        }
        Self { phases }
    }

    fn warp(&self, x: f32, y: f32) -> Vec2 {
        let dx = WARP_X_AMP_A * (y * 0.011 + self.phases[0]).sin()
            + WARP_X_AMP_B * (x * 0.007 + y * 0.005 + self.phases[1]).sin();
        let dy = WARP_Y_AMP * (x * 0.009 + self.phases[2]).sin();
        Vec2::new(x + dx, y + dy)
    }

    /// Density threshold varying smoothly across the field
    fn threshold_at(&self, base: f32, p: Vec2) -> f32 {
        base + DENSITY_VARIATION
            * (p.x * 0.004 + self.phases[3]).sin()
            * (p.y * 0.0035 + self.phases[4]).sin()
    }
}

/// Generate the peg layout for one attempt at the given density threshold
fn attempt_layout(
    seed: u64,
    base_threshold: f32,
    field: &WarpField,
    rng: &mut Pcg32,
) -> Vec<Vec2> {
    let hud = hud_rect();
    let corridor = launch_rect();
    let mid = REF_WIDTH / 2.0;

    let mut grid = SpatialGrid::new(MIN_PEG_DIST);
    let mut points: Vec<Vec2> = Vec::new();

    let admit = |p: Vec2, grid: &mut SpatialGrid, points: &mut Vec<Vec2>| -> bool {
        let in_field = p.x >= PEG_RADIUS + 10.0
            && p.x <= REF_WIDTH - PEG_RADIUS - 10.0
            && p.y >= PEG_TOP - 20.0
            && p.y <= PEG_BOTTOM + 20.0;
        if !in_field || hud.contains(p) || corridor.contains(p) {
            return false;
        }
        if !grid.far_enough(p, MIN_PEG_DIST) {
            return false;
        }
        grid.insert(p);
        points.push(p);
        true
    };

    let mut row: i64 = 0;
    let mut y = PEG_TOP;
    while y <= PEG_BOTTOM + 0.5 {
        let stagger = if row % 2 == 1 { LATTICE_DX / 2.0 } else { 0.0 };
        let mut col: i64 = 0;
        let mut x = LATTICE_MARGIN + stagger;
        // Left-half lattice only; the right half comes from mirroring
        while x <= mid {
            let jx = (rng.random::<f32>() * 2.0 - 1.0) * JITTER_X;
            let jy = (rng.random::<f32>() * 2.0 - 1.0) * JITTER_Y;
            let p = field.warp(x, y) + Vec2::new(jx, jy);

            let noise = hash_noise(seed, col, row);
            if noise > field.threshold_at(base_threshold, p)
                && admit(p, &mut grid, &mut points)
            {
                // Bilateral symmetry with deliberate asymmetric exceptions
                if rng.random::<f64>() < MIRROR_PROB {
                    let mirrored = Vec2::new(REF_WIDTH - p.x, p.y);
                    admit(mirrored, &mut grid, &mut points);
                }
            }

            col += 1;
            x += LATTICE_DX;
        }
        row += 1;
        y += LATTICE_DY;
    }

    points
}

/// Build the six bins; they exactly tile the board width
fn build_bins() -> [Bin; BIN_COUNT] {
    let width = REF_WIDTH / BIN_COUNT as f32;
    BinColor::ALL.map(|color| {
        let x0 = color.index() as f32 * width;
        Bin {
            color,
            zone: Rect::new(x0, BIN_TOP, width, REF_HEIGHT - BIN_TOP),
            sensor: Rect::new(
                x0 + BIN_SENSOR_INSET,
                BIN_SENSOR_TOP,
                width - 2.0 * BIN_SENSOR_INSET,
                REF_HEIGHT - BIN_SENSOR_TOP,
            ),
            left_wall: Rect::new(
                x0 - BIN_WALL_WIDTH / 2.0,
                BIN_WALL_TOP,
                BIN_WALL_WIDTH,
                REF_HEIGHT - BIN_WALL_TOP,
            ),
            right_wall: Rect::new(
                x0 + width - BIN_WALL_WIDTH / 2.0,
                BIN_WALL_TOP,
                BIN_WALL_WIDTH,
                REF_HEIGHT - BIN_WALL_TOP,
            ),
            lip: Rect::new(x0, REF_HEIGHT - BIN_LIP_HEIGHT, width, BIN_LIP_HEIGHT),
        }
    })
}

/// Generate a board for this session.
///
/// Retries with an adjusted density threshold when the peg count lands
/// outside the target range; the final attempt is accepted as-is rather than
/// failing the mount.
pub fn generate(seed: u64) -> Board {
    let mut rng = Pcg32::seed_from_u64(seed);
    let field = WarpField::draw(&mut rng);

    let mut threshold = BASE_DENSITY;
    let mut points = Vec::new();
    let mut attempts = 0;

    for attempt in 0..=BOARD_RETRIES {
        attempts = attempt + 1;
        points = attempt_layout(seed, threshold, &field, &mut rng);
        if (PEG_COUNT_MIN..=PEG_COUNT_MAX).contains(&points.len()) {
            break;
        }
        if points.len() < PEG_COUNT_MIN {
            threshold -= DENSITY_STEP;
        } else {
            threshold += DENSITY_STEP;
        }
    }
    if !(PEG_COUNT_MIN..=PEG_COUNT_MAX).contains(&points.len()) {
        log::warn!(
            "board settled at {} pegs after {} attempts (target {}..={})",
            points.len(),
            attempts,
            PEG_COUNT_MIN,
            PEG_COUNT_MAX
        );
    }

    let pegs = points
        .into_iter()
        .map(|pos| Peg {
            pos,
            home: pos,
            radius: PEG_RADIUS,
            style: PegStyle {
                shade: 0.35 + rng.random::<f32>() * 0.4,
                fill_alpha: 0.5 + rng.random::<f32>() * 0.45,
                outline_alpha: 0.2 + rng.random::<f32>() * 0.6,
                wiggle_phase: rng.random::<f32>() * TAU,
            },
            wiggle_at_ms: NEVER_MS,
        })
        .collect();

    log::info!("generated board: seed={seed} attempts={attempts}");
    Board {
        pegs,
        bins: build_bins(),
        seed,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_per_seed() {
        let a = generate(42);
        let b = generate(42);
        assert_eq!(a.pegs.len(), b.pegs.len());
        for (pa, pb) in a.pegs.iter().zip(&b.pegs) {
            assert_eq!(pa.pos, pb.pos);
            assert_eq!(pa.home, pb.home);
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate(1);
        let b = generate(2);
        let same = a.pegs.len() == b.pegs.len()
            && a.pegs.iter().zip(&b.pegs).all(|(pa, pb)| pa.pos == pb.pos);
        assert!(!same);
    }

    #[test]
    fn test_count_in_target_range() {
        for seed in [0u64, 7, 42, 1234, 99999] {
            let board = generate(seed);
            assert!(
                (PEG_COUNT_MIN..=PEG_COUNT_MAX).contains(&board.pegs.len()),
                "seed {seed} produced {} pegs",
                board.pegs.len()
            );
        }
    }

    #[test]
    fn test_min_distance_invariant() {
        let board = generate(42);
        for (i, a) in board.pegs.iter().enumerate() {
            for b in &board.pegs[i + 1..] {
                let d = a.pos.distance(b.pos);
                assert!(d >= MIN_PEG_DIST, "pegs {d} apart (min {MIN_PEG_DIST})");
            }
        }
    }

    #[test]
    fn test_exclusion_invariant() {
        let board = generate(42);
        let hud = hud_rect();
        let corridor = launch_rect();
        for peg in &board.pegs {
            assert!(!hud.contains(peg.pos), "peg inside HUD box at {}", peg.pos);
            assert!(
                !corridor.contains(peg.pos),
                "peg inside launch corridor at {}",
                peg.pos
            );
        }
    }

    #[test]
    fn test_bins_tile_board_width() {
        let board = generate(42);
        assert!((board.bins[0].zone.min.x - 0.0).abs() < f32::EPSILON);
        for w in board.bins.windows(2) {
            assert!((w[0].zone.max.x - w[1].zone.min.x).abs() < 1e-3);
        }
        assert!((board.bins[BIN_COUNT - 1].zone.max.x - REF_WIDTH).abs() < 1e-3);
    }

    #[test]
    fn test_sensor_inside_zone() {
        let board = generate(7);
        for bin in &board.bins {
            assert!(bin.zone.contains(bin.sensor.min));
            assert!(bin.sensor.max.x <= bin.zone.max.x);
            assert!(bin.sensor.max.y <= bin.zone.max.y);
        }
    }
}
