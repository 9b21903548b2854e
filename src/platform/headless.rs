//! Headless frame driver
//!
//! Plays the role the browser plays on the web: it moves the obstacles,
//! draws the jump arc into the character's box, presses keys, and executes
//! the directives `tick` returns. Used by the native binary and for
//! end-to-end tests of the core.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::HighScoreStore;
use crate::persistence::KeyValueStore;
use crate::settings::Settings;
use crate::sim::{
    Directive, GamePhase, GameState, InputQueue, JumpAnimation, PlayState, Rect, TickInput, tick,
};

/// Scene layout (CSS pixels)
pub mod layout {
    pub const TRACK_WIDTH: f32 = 600.0;
    pub const GROUND_Y: f32 = 150.0;

    pub const CHARACTER_X: f32 = 50.0;
    pub const CHARACTER_WIDTH: f32 = 20.0;
    pub const CHARACTER_HEIGHT: f32 = 50.0;
    /// Peak height of the jump arc
    pub const JUMP_HEIGHT: f32 = 60.0;

    pub const OBSTACLE_WIDTH: f32 = 20.0;
    pub const OBSTACLE_HEIGHT: f32 = 20.0;
    pub const OBSTACLE_COUNT: usize = 3;
    /// Obstacle speed (pixels/s)
    pub const OBSTACLE_SPEED: f32 = 240.0;
    /// Spacing between consecutive obstacles' left edges
    pub const MIN_GAP: f32 = 180.0;
    pub const MAX_GAP: f32 = 360.0;

    /// 60 Hz display
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
}

use layout::*;

/// Obstacles scrolling right to left, respawning ahead once off-screen
#[derive(Debug, Clone)]
pub struct Track {
    /// Left edge of each obstacle
    xs: Vec<f32>,
    speed: f32,
    rng: Pcg32,
}

impl Track {
    pub fn new(seed: u64) -> Self {
        let mut track = Self {
            xs: vec![0.0; OBSTACLE_COUNT],
            speed: OBSTACLE_SPEED,
            rng: Pcg32::seed_from_u64(seed),
        };
        track.reset();
        track
    }

    /// Line obstacles up off the right edge
    pub fn reset(&mut self) {
        let mut x = TRACK_WIDTH;
        for slot in &mut self.xs {
            *slot = x;
            x += self.rng.random_range(MIN_GAP..MAX_GAP);
        }
    }

    /// Move everything left by `dt_ms` worth of travel
    pub fn advance(&mut self, dt_ms: f64) {
        let dx = self.speed * (dt_ms / 1000.0) as f32;
        for x in &mut self.xs {
            *x -= dx;
        }

        for i in 0..self.xs.len() {
            if self.xs[i] + OBSTACLE_WIDTH < 0.0 {
                let furthest = self.xs.iter().copied().fold(f32::MIN, f32::max);
                let gap = self.rng.random_range(MIN_GAP..MAX_GAP);
                self.xs[i] = (furthest + gap).max(TRACK_WIDTH);
            }
        }
    }

    pub fn rects(&self) -> Vec<Rect> {
        self.xs
            .iter()
            .map(|&x| {
                Rect::from_xywh(
                    x,
                    GROUND_Y - OBSTACLE_HEIGHT,
                    OBSTACLE_WIDTH,
                    OBSTACLE_HEIGHT,
                )
            })
            .collect()
    }
}

/// Character box, raised along a sine arc while the jump animation plays
pub fn character_rect(jump_started_ms: Option<f64>, duration_ms: f64, now_ms: f64) -> Rect {
    let ground = Rect::from_xywh(
        CHARACTER_X,
        GROUND_Y - CHARACTER_HEIGHT,
        CHARACTER_WIDTH,
        CHARACTER_HEIGHT,
    );
    let Some(start) = jump_started_ms else {
        return ground;
    };
    let progress = if duration_ms > 0.0 {
        ((now_ms - start) / duration_ms).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let lift = JUMP_HEIGHT * (std::f64::consts::PI * progress).sin() as f32;
    ground.translated(Vec2::new(0.0, -lift))
}

/// Stand-in player: presses jump when an obstacle gets close
#[derive(Debug, Clone)]
pub struct AutoJumper {
    /// Jump once the nearest obstacle is this close (pixels)
    pub lead_px: f32,
    /// Chance of deliberately ignoring an obstacle
    miss_chance: f64,
    rng: Pcg32,
    /// Obstacle currently in range and whether we go for it
    target: Option<(usize, bool)>,
}

impl AutoJumper {
    pub fn new(seed: u64, miss_chance: f64) -> Self {
        Self {
            lead_px: 40.0,
            miss_chance: miss_chance.clamp(0.0, 1.0),
            rng: Pcg32::seed_from_u64(seed),
            target: None,
        }
    }

    pub fn set_miss_chance(&mut self, miss_chance: f64) {
        self.miss_chance = miss_chance.clamp(0.0, 1.0);
        self.target = None;
    }

    /// Whether to press jump this frame
    pub fn wants_jump(&mut self, character: &Rect, obstacles: &[Rect]) -> bool {
        let nearest = obstacles
            .iter()
            .enumerate()
            .map(|(i, o)| (i, o.left() - character.right()))
            .filter(|&(_, gap)| gap >= 0.0)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let Some((index, _)) = nearest.filter(|&(_, gap)| gap <= self.lead_px) else {
            self.target = None;
            return false;
        };

        match self.target {
            Some((i, attempt)) if i == index => attempt,
            _ => {
                let attempt = !self.rng.random_bool(self.miss_chance);
                self.target = Some((index, attempt));
                attempt
            }
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub score: u64,
    pub high_score: u64,
    pub game_over: bool,
}

/// A full game session driven without a browser
pub struct HeadlessSession<S: KeyValueStore> {
    pub state: GameState,
    settings: Settings,
    high_scores: HighScoreStore<S>,
    track: Track,
    pub jumper: AutoJumper,
    input: InputQueue,
    now_ms: f64,
    play_state: PlayState,
    obstacles_visible: bool,
    jump_started_ms: Option<f64>,
    /// Best score shown on screen
    pub displayed_high_score: u64,
}

impl<S: KeyValueStore> HeadlessSession<S> {
    pub fn new(settings: Settings, store: S, seed: u64, miss_chance: f64) -> Self {
        let mut session = Self {
            state: GameState::new(settings.game_config()),
            settings,
            high_scores: HighScoreStore::new(store),
            track: Track::new(seed),
            jumper: AutoJumper::new(seed.wrapping_add(1), miss_chance),
            input: InputQueue::new(),
            now_ms: 0.0,
            play_state: PlayState::Paused,
            obstacles_visible: false,
            jump_started_ms: None,
            displayed_high_score: 0,
        };

        let loaded = session.high_scores.load();
        if let Some(directive) = session.state.restore_high_score(loaded) {
            session.apply(directive);
        }
        session
    }

    /// Simulate a key press (decoded with the configured bindings next frame)
    pub fn press(&mut self, key: &str) {
        self.input.push_key(key);
    }

    /// Simulate focus loss (auto-pause)
    pub fn request_pause(&mut self) {
        self.input.request_pause();
    }

    pub fn high_scores(&self) -> &HighScoreStore<S> {
        &self.high_scores
    }

    /// Advance one display frame
    pub fn step(&mut self) -> Vec<Directive> {
        self.now_ms += FRAME_MS;
        if self.play_state == PlayState::Running {
            self.track.advance(FRAME_MS);
        }

        let character = character_rect(
            self.jump_started_ms,
            self.settings.jump_duration_ms,
            self.now_ms,
        );
        let obstacles = if self.obstacles_visible {
            self.track.rects()
        } else {
            Vec::new()
        };

        if self.state.phase == GamePhase::Running && self.jumper.wants_jump(&character, &obstacles)
        {
            let key = self.settings.keys.jump.clone();
            self.press(&key);
        }

        let input = TickInput {
            now_ms: self.now_ms,
            intents: self.input.drain(&self.settings.keys, self.state.phase),
            character,
            obstacles,
        };
        let directives = tick(&mut self.state, &input);
        for &directive in &directives {
            self.apply(directive);
        }
        directives
    }

    /// Start a run (or keep the current one) and play until game over or `max_frames`
    pub fn run(&mut self, max_frames: u64) -> RunSummary {
        if self.state.phase != GamePhase::Running {
            let key = self.settings.keys.action.clone();
            self.press(&key);
        }

        let mut frames = 0;
        while frames < max_frames {
            self.step();
            frames += 1;
            if self.state.phase == GamePhase::GameOver {
                break;
            }
        }

        RunSummary {
            frames,
            score: self.state.score,
            high_score: self.state.high_score,
            game_over: self.state.phase == GamePhase::GameOver,
        }
    }

    fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::SetAnimationPlayState(play_state) => self.play_state = play_state,
            Directive::SetJumpAnimation(JumpAnimation::On) => {
                self.jump_started_ms = Some(self.now_ms)
            }
            Directive::SetJumpAnimation(JumpAnimation::Off) => self.jump_started_ms = None,
            Directive::SetObstaclesVisible(visible) => {
                if visible && !self.obstacles_visible {
                    self.track.reset();
                }
                self.obstacles_visible = visible;
            }
            Directive::PersistHighScore(score) => self.high_scores.save(score),
            Directive::UpdateHighScoreDisplay(score) => self.displayed_high_score = score,
            Directive::ShowGameOver(score) => log::info!("GAME OVER - score {}", score),
            Directive::UpdateScoreDisplay(score) => log::trace!("Score: {}", score),
            Directive::HideGameOver | Directive::HideInstructions => {}
        }
    }
}
