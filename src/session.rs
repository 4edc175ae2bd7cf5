//! Game lifecycle: mount, frame loop, input relay, teardown
//!
//! `LettersGame` owns one session built from host-injected collaborators.
//! Frames use a fixed-timestep accumulator with a substep cap; the tick
//! functions return effects that this layer relays to audio, storage and the
//! HUD. After `dispose` every entry point is a no-op, so a host animation
//! frame or key event arriving late can never touch torn-down state.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde_json::Value;

use crate::GameConfig;
use crate::audio::{AudioSink, Cue};
use crate::consts::*;
use crate::platform::{HudDisplay, Storage, Viewport};
use crate::renderer::{DrawCmd, build_scene};
use crate::scores::BinScores;
use crate::sim::board::{self, Board};
use crate::sim::physics::{BoxKind, PhysicsWorld};
use crate::sim::sched::Scheduler;
use crate::sim::state::{Effect, GamePhase, GameState, IntroStep, PcgUnitRng, UnitRng};
use crate::sim::tick::{TickCtx, handle_key, handle_pointer, start_intro, tick};
use crate::{Rect, hud_rect};

/// Maximum wall-clock delta folded into the accumulator per frame; longer
/// gaps (tab hidden, debugger pause) are dropped instead of replayed
const MAX_FRAME_DELTA_MS: f64 = 100.0;

/// DOM-side attachment points supplied by the host
pub struct Mount {
    pub hud: Box<dyn HudDisplay>,
}

/// Everything else the host injects at construction
pub struct HostDeps {
    pub viewport: Box<dyn Viewport>,
    pub storage: Box<dyn Storage>,
    pub audio: Box<dyn AudioSink>,
    /// Seed for board generation and all gameplay draws
    pub seed: u64,
}

struct Session {
    cfg: GameConfig,
    board: Board,
    world: PhysicsWorld,
    state: GameState,
    sched: Scheduler,
    /// Loaded from storage at `start`, `None` only before then
    scores: Option<BinScores>,
    rng: Box<dyn UnitRng>,
    viewport: Box<dyn Viewport>,
    storage: Box<dyn Storage>,
    audio: Box<dyn AudioSink>,
    hud: Box<dyn HudDisplay>,
    started: bool,
    accumulator: f64,
    last_frame_ms: Option<f64>,
    draw_list: Vec<DrawCmd>,
}

/// One mounted mini-game instance
pub struct LettersGame {
    inner: Option<Session>,
}

impl LettersGame {
    /// Mount the game. A `None` mount yields an inert instance whose every
    /// method is a no-op, mirroring a host page without the game element.
    pub fn new(mount: Option<Mount>, deps: HostDeps, overrides: Option<&Value>) -> Self {
        let Some(mount) = mount else {
            log::info!("letters mount point absent, game inert");
            return Self { inner: None };
        };

        let cfg = GameConfig::from_overrides(overrides);
        let board = board::generate(deps.seed);
        let world = build_world(&cfg, &board);
        // Decouple the gameplay draw stream from the board stream
        let rng = PcgUnitRng(Pcg32::seed_from_u64(
            deps.seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        ));

        let session = Session {
            cfg,
            board,
            world,
            state: GameState::new(),
            sched: Scheduler::new(),
            scores: None,
            rng: Box::new(rng),
            viewport: deps.viewport,
            storage: deps.storage,
            audio: deps.audio,
            hud: mount.hud,
            started: false,
            accumulator: 0.0,
            last_frame_ms: None,
            draw_list: Vec::new(),
        };

        Self {
            inner: Some(session),
        }
    }

    /// Begin the simulation with the first intro sequence. Idempotent.
    pub fn start(&mut self) {
        if let Some(session) = self.inner.as_mut()
            && !session.started
        {
            session.started = true;
            // Persisted badges must show from the first frame
            session.scores = Some(BinScores::load(session.storage.as_ref()));
            let mut effects = Vec::new();
            start_intro(
                &mut session.state,
                &mut session.sched,
                &session.cfg,
                &mut effects,
            );
            session.apply_effects(effects);
        }
    }

    /// Advance to the host timestamp and rebuild the display list.
    pub fn frame(&mut self, now_ms: f64) -> &[DrawCmd] {
        if let Some(session) = self.inner.as_mut()
            && session.started
        {
            session.frame(now_ms);
        }
        self.inner.as_ref().map_or(&[], |s| &s.draw_list)
    }

    /// Relay a keydown. `has_modifier` marks chords (Ctrl/Alt/Meta held).
    pub fn key_down(&mut self, key: char, has_modifier: bool) {
        if let Some(session) = self.inner.as_mut()
            && session.started
        {
            session.key_down(key, has_modifier);
        }
    }

    /// Relay a pointer press in client pixels.
    pub fn pointer_down(&mut self, client: Vec2) {
        if let Some(session) = self.inner.as_mut()
            && session.started
        {
            let point = client / session.viewport.scale();
            let size = session.viewport.reference_size();
            // Taps landing outside the reference canvas belong to host chrome
            if !Rect::new(0.0, 0.0, size.x, size.y).contains(point) {
                return;
            }
            handle_pointer(&session.state, &mut session.board, &mut session.world, point);
        }
    }

    /// Current phase, or `None` when inert or disposed.
    pub fn phase(&self) -> Option<GamePhase> {
        self.inner.as_ref().map(|s| s.state.phase)
    }

    /// Tear the session down. Idempotent; all later calls are no-ops.
    pub fn dispose(&mut self) {
        let Some(mut session) = self.inner.take() else {
            return;
        };
        if session.state.phase == GamePhase::Introducing
            && session.state.intro_step == IntroStep::Drumroll
        {
            session.audio.play(Cue::DrumrollStop);
        }
        session.sched.cancel_all();
        session.world.clear();
        session.hud.set_visible(false);
        log::info!("letters session disposed");
    }
}

impl Session {
    fn frame(&mut self, now_ms: f64) {
        let delta = match self.last_frame_ms {
            Some(last) => (now_ms - last).clamp(0.0, MAX_FRAME_DELTA_MS),
            None => SIM_DT_MS,
        };
        self.last_frame_ms = Some(now_ms);
        self.accumulator += delta;

        let mut substeps = 0;
        let mut effects = Vec::new();
        while self.accumulator >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
            let mut ctx = TickCtx {
                cfg: &self.cfg,
                rng: self.rng.as_mut(),
            };
            tick(
                &mut self.state,
                &mut self.world,
                &mut self.sched,
                &mut ctx,
                &mut effects,
            );
            self.accumulator -= SIM_DT_MS;
            substeps += 1;
        }
        // A frame gap beyond the substep cap is dropped, not replayed
        if substeps == MAX_SUBSTEPS {
            self.accumulator = 0.0;
        }
        self.apply_effects(effects);

        let mut draw_list = std::mem::take(&mut self.draw_list);
        build_scene(
            &self.state,
            &self.board,
            &self.world,
            self.scores.as_ref(),
            &mut draw_list,
        );
        self.draw_list = draw_list;
    }

    fn key_down(&mut self, key: char, has_modifier: bool) {
        let mut effects = Vec::new();
        let mut ctx = TickCtx {
            cfg: &self.cfg,
            rng: self.rng.as_mut(),
        };
        handle_key(
            &mut self.state,
            &mut self.world,
            &mut ctx,
            key,
            has_modifier,
            &mut effects,
        );
        self.apply_effects(effects);
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Cue(cue) => self.audio.play(cue),
                Effect::ScoreBump { bin } => self.bump_score(bin),
                Effect::ShowGlyph(glyph) => {
                    self.hud.set_glyph(glyph);
                    self.hud.set_visible(true);
                }
                Effect::HideGlyph => self.hud.set_visible(false),
            }
        }
    }

    fn bump_score(&mut self, bin: usize) {
        let scores = self
            .scores
            .get_or_insert_with(|| BinScores::load(self.storage.as_ref()));
        let result = scores.bump(bin);
        scores.save(self.storage.as_mut());

        self.state.count_bump_at[bin] = self.state.now_ms;
        self.audio.play(Cue::ScoreTick);
        if result.rolled_over {
            self.state.star_bump_at[bin] = self.state.now_ms;
            self.audio.play(Cue::Star);
        }
    }
}

/// Build the static physics geometry for a generated board
fn build_world(cfg: &GameConfig, board: &Board) -> PhysicsWorld {
    let mut world = PhysicsWorld::new(
        Rect::new(0.0, 0.0, REF_WIDTH, REF_HEIGHT),
        cfg.gravity,
    );
    for peg in &board.pegs {
        world.add_peg(peg.pos, peg.radius);
    }
    for bin in &board.bins {
        world.add_box(bin.left_wall, BoxKind::BinWall);
        world.add_box(bin.right_wall, BoxKind::BinWall);
        world.add_box(bin.lip, BoxKind::BinWall);
    }
    // The HUD box is solid so a wild launch caroms off instead of hiding
    // the letter behind the glyph
    world.add_box(hud_rect(), BoxKind::Wall);
    // Sensor index must equal bin index
    for bin in &board.bins {
        world.add_sensor(bin.sensor);
    }
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{FixedViewport, MemoryStorage};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Sink recording every cue into a shared log
    struct SharedAudio(Rc<RefCell<Vec<Cue>>>);

    impl AudioSink for SharedAudio {
        fn play(&mut self, cue: Cue) {
            self.0.borrow_mut().push(cue);
        }
    }

    /// HUD capturing the last glyph and visibility
    #[derive(Default)]
    struct CaptureHud(Rc<RefCell<(Option<char>, bool)>>);

    impl HudDisplay for CaptureHud {
        fn set_glyph(&mut self, glyph: char) {
            self.0.borrow_mut().0 = Some(glyph);
        }
        fn set_visible(&mut self, visible: bool) {
            self.0.borrow_mut().1 = visible;
        }
    }

    struct Harness {
        game: LettersGame,
        cues: Rc<RefCell<Vec<Cue>>>,
        hud: Rc<RefCell<(Option<char>, bool)>>,
        now_ms: f64,
    }

    impl Harness {
        fn new(seed: u64) -> Self {
            let cues = Rc::new(RefCell::new(Vec::new()));
            let hud = Rc::new(RefCell::new((None, false)));
            let deps = HostDeps {
                viewport: Box::new(FixedViewport::default()),
                storage: Box::new(MemoryStorage::new()),
                audio: Box::new(SharedAudio(cues.clone())),
                seed,
            };
            let mount = Mount {
                hud: Box::new(CaptureHud(hud.clone())),
            };
            let mut game = LettersGame::new(Some(mount), deps, None);
            game.start();
            Self {
                game,
                cues,
                hud,
                now_ms: 0.0,
            }
        }

        /// Drive frames for roughly `ms` of host time
        fn run(&mut self, ms: f64) {
            let frames = (ms / SIM_DT_MS).ceil() as usize + 1;
            for _ in 0..frames {
                self.now_ms += SIM_DT_MS;
                self.game.frame(self.now_ms);
            }
        }

        fn run_until_idle(&mut self) -> char {
            for _ in 0..1200 {
                self.run(100.0);
                if self.game.phase() == Some(GamePhase::IdleAwaitingKey) {
                    return self.hud.borrow().0.expect("glyph shown at reveal");
                }
            }
            panic!("never reached the awaiting-key phase");
        }
    }

    #[test]
    fn test_absent_mount_is_inert() {
        let deps = HostDeps {
            viewport: Box::new(FixedViewport::default()),
            storage: Box::new(MemoryStorage::new()),
            audio: Box::new(crate::audio::NullAudio),
            seed: 1,
        };
        let mut game = LettersGame::new(None, deps, None);
        game.start();
        assert!(game.frame(16.0).is_empty());
        assert_eq!(game.phase(), None);
        game.key_down('a', false);
        game.pointer_down(Vec2::new(100.0, 100.0));
        game.dispose();
        game.dispose();
    }

    fn peg_centers(cmds: &[DrawCmd]) -> Vec<Vec2> {
        cmds.iter()
            .filter_map(|c| match c {
                DrawCmd::Circle { center, radius, .. } if *radius == PEG_RADIUS => Some(*center),
                _ => None,
            })
            .collect()
    }

    fn mounted_game(viewport: FixedViewport, storage: MemoryStorage, seed: u64) -> LettersGame {
        let deps = HostDeps {
            viewport: Box::new(viewport),
            storage: Box::new(storage),
            audio: Box::new(crate::audio::NullAudio),
            seed,
        };
        let mount = Mount {
            hud: Box::new(CaptureHud::default()),
        };
        LettersGame::new(Some(mount), deps, None)
    }

    #[test]
    fn test_persisted_badges_render_at_start() {
        let mut storage = MemoryStorage::new();
        let mut saved = BinScores::new();
        for _ in 0..7 {
            saved.bump(3);
        }
        saved.save(&mut storage);

        let mut game = mounted_game(FixedViewport::default(), storage, 7);
        game.start();

        // During the intro no target or letter glyph is drawn, so every
        // glyph in the list is a count badge
        let digits: Vec<char> = game
            .frame(16.0)
            .iter()
            .filter_map(|c| match c {
                DrawCmd::Glyph { ch, .. } => Some(*ch),
                _ => None,
            })
            .collect();
        assert_eq!(digits.len(), 6, "one count badge per bin");
        assert_eq!(digits[3], '7');
    }

    #[test]
    fn test_pointer_maps_client_coords_by_scale() {
        let mut game = mounted_game(FixedViewport { scale: 2.0 }, MemoryStorage::new(), 42);
        game.start();

        let mut now = 16.0;
        let before = peg_centers(game.frame(now));
        assert!(!before.is_empty());

        // Tap beside each peg at doubled client coordinates until one
        // accepts the nudge
        let mut moved = false;
        for &center in &before {
            now += SIM_DT_MS;
            game.pointer_down((center + Vec2::new(3.0, 2.0)) * 2.0);
            if peg_centers(game.frame(now)) != before {
                moved = true;
                break;
            }
        }
        assert!(moved, "no peg responded to a scaled tap");
    }

    #[test]
    fn test_pointer_outside_reference_canvas_ignored() {
        let mut game = mounted_game(FixedViewport::default(), MemoryStorage::new(), 42);
        game.start();

        let mut now = 16.0;
        let before = peg_centers(game.frame(now));
        // Aim past the right edge, level with every edge-adjacent peg
        for &center in &before {
            if center.x > REF_WIDTH - NUDGE_GRAB_RADIUS {
                game.pointer_down(Vec2::new(REF_WIDTH + 5.0, center.y));
            }
        }
        now += SIM_DT_MS;
        assert_eq!(peg_centers(game.frame(now)), before);
    }

    #[test]
    fn test_nothing_runs_before_start() {
        let cues = Rc::new(RefCell::new(Vec::new()));
        let deps = HostDeps {
            viewport: Box::new(FixedViewport::default()),
            storage: Box::new(MemoryStorage::new()),
            audio: Box::new(SharedAudio(cues.clone())),
            seed: 7,
        };
        let mount = Mount {
            hud: Box::new(CaptureHud::default()),
        };
        let mut game = LettersGame::new(Some(mount), deps, None);

        assert!(game.frame(5000.0).is_empty());
        game.key_down('a', false);
        assert!(cues.borrow().is_empty());

        game.start();
        game.start();
        game.frame(16.0);
        assert_eq!(game.phase(), Some(GamePhase::Introducing));
    }

    #[test]
    fn test_intro_reveals_glyph_on_hud() {
        let mut h = Harness::new(7);
        assert_eq!(h.game.phase(), Some(GamePhase::Introducing));
        assert!(!h.hud.borrow().1);

        let glyph = h.run_until_idle();
        assert!(glyph.is_ascii_uppercase());
        assert!(h.hud.borrow().1);
        assert!(h.cues.borrow().contains(&Cue::Ready));
    }

    #[test]
    fn test_launch_and_guaranteed_return_to_intro() {
        let mut h = Harness::new(42);
        let glyph = h.run_until_idle();

        h.game.key_down(glyph.to_ascii_lowercase(), false);
        assert_eq!(h.game.phase(), Some(GamePhase::Dropping));
        assert!(h.cues.borrow().contains(&Cue::Launch));

        // Every drop ends in a catch or a stuck despawn, then a new intro
        let mut resolved = false;
        for _ in 0..600 {
            h.run(100.0);
            if h.game.phase() == Some(GamePhase::Introducing) {
                resolved = true;
                break;
            }
        }
        assert!(resolved, "drop never resolved");
        let cues = h.cues.borrow();
        assert!(
            cues.iter()
                .any(|c| matches!(c, Cue::Reward { .. }) || *c == Cue::Poof)
        );
    }

    #[test]
    fn test_wrong_key_buzzes_without_spawn() {
        let mut h = Harness::new(7);
        let glyph = h.run_until_idle();
        let wrong = if glyph == 'Z' { 'a' } else { 'z' };

        h.game.key_down(wrong, false);
        assert_eq!(h.game.phase(), Some(GamePhase::IdleAwaitingKey));
        assert!(h.cues.borrow().contains(&Cue::Wrong));
    }

    #[test]
    fn test_dispose_silences_everything() {
        let mut h = Harness::new(7);
        h.run(500.0);
        h.game.dispose();

        let baseline = h.cues.borrow().len();
        h.run(2000.0);
        h.game.key_down('a', false);
        h.game.pointer_down(Vec2::new(200.0, 200.0));
        h.game.dispose();
        assert_eq!(h.cues.borrow().len(), baseline);
        assert!(h.game.frame(99999.0).is_empty());
        // HUD hidden on teardown
        assert!(!h.hud.borrow().1);
    }

    #[test]
    fn test_dispose_mid_drumroll_stops_it() {
        let mut h = Harness::new(7);
        // Past the intro hold, inside the drumroll window
        h.run(2000.0);
        let started = h
            .cues
            .borrow()
            .iter()
            .any(|c| matches!(c, Cue::DrumrollStart { .. }));
        assert!(started);

        h.game.dispose();
        assert!(h.cues.borrow().contains(&Cue::DrumrollStop));
    }

    #[test]
    fn test_frame_gap_is_dropped_not_replayed() {
        let mut h = Harness::new(7);
        h.game.frame(16.0);
        // A 10 second stall must not fast-forward the intro to its end
        h.game.frame(10_016.0);
        assert_eq!(h.game.phase(), Some(GamePhase::Introducing));
    }
}
