//! Headless autoplay demo
//!
//! Mounts the game with in-memory collaborators, presses the revealed letter
//! automatically and runs a fixed stretch of simulated time, logging cues and
//! a final score summary. Useful for eyeballing pacing and board generation:
//!
//! ```text
//! RUST_LOG=debug letter-drop [seed] [seconds]
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use letter_drop::audio::{AudioSink, Cue};
use letter_drop::consts::SIM_DT_MS;
use letter_drop::platform::{FixedViewport, HudDisplay, MemoryStorage};
use letter_drop::sim::GamePhase;
use letter_drop::{HostDeps, LettersGame, Mount};

/// Logs every cue and tallies the interesting ones
#[derive(Default)]
struct TallyAudio {
    rewards: Rc<RefCell<u32>>,
    poofs: Rc<RefCell<u32>>,
}

impl AudioSink for TallyAudio {
    fn play(&mut self, cue: Cue) {
        log::debug!("cue: {cue:?}");
        match cue {
            Cue::Reward { .. } => *self.rewards.borrow_mut() += 1,
            Cue::Poof => *self.poofs.borrow_mut() += 1,
            _ => {}
        }
    }
}

/// HUD surface that remembers the visible glyph for the autoplayer
#[derive(Default)]
struct SharedHud {
    glyph: Rc<RefCell<Option<char>>>,
}

impl HudDisplay for SharedHud {
    fn set_glyph(&mut self, glyph: char) {
        *self.glyph.borrow_mut() = Some(glyph);
    }

    fn set_visible(&mut self, visible: bool) {
        if !visible {
            *self.glyph.borrow_mut() = None;
        }
    }
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or_else(rand::random);
    let seconds: f64 = args.next().and_then(|a| a.parse().ok()).unwrap_or(60.0);

    let glyph = Rc::new(RefCell::new(None));
    let rewards = Rc::new(RefCell::new(0));
    let poofs = Rc::new(RefCell::new(0));

    let mount = Mount {
        hud: Box::new(SharedHud {
            glyph: glyph.clone(),
        }),
    };
    let deps = HostDeps {
        viewport: Box::new(FixedViewport::default()),
        storage: Box::new(MemoryStorage::new()),
        audio: Box::new(TallyAudio {
            rewards: rewards.clone(),
            poofs: poofs.clone(),
        }),
        seed,
    };

    let mut game = LettersGame::new(Some(mount), deps, None);
    game.start();
    log::info!("autoplay: seed={seed} duration={seconds}s");

    let frames = (seconds * 1000.0 / SIM_DT_MS) as u64;
    let mut now_ms = 0.0;
    let mut drops = 0u32;
    let mut pokes = 0u32;
    for frame in 0..frames {
        now_ms += SIM_DT_MS;
        game.frame(now_ms);

        if game.phase() == Some(GamePhase::IdleAwaitingKey)
            && let Some(target) = *glyph.borrow()
        {
            game.key_down(target, false);
            drops += 1;
            log::info!("pressed '{target}' (drop {drops})");
        }
        // The occasional peg poke, somewhere mid-field
        if frame % 600 == 599 {
            game.pointer_down(Vec2::new(300.0 + (frame % 7) as f32 * 90.0, 350.0));
            pokes += 1;
        }
    }
    game.dispose();

    log::info!(
        "summary: {drops} drops, {} caught, {} poofed, {pokes} peg pokes",
        rewards.borrow(),
        poofs.borrow()
    );
}
