//! Per-frame simulation step
//!
//! The frame driver calls `tick` once per display frame, in every phase.
//! Order within a tick: jump expiry, intents, then (while running) the
//! collision check and scoring. The score display is refreshed at most once,
//! at the end of the tick.

use serde::{Deserialize, Serialize};

use super::collision::{Rect, first_collision, has_passed};
use super::directive::{Directive, JumpAnimation, PlayState};
use super::intent::Intent;
use super::state::{GamePhase, GameState, JumpTimer, ScoringPolicy, transition};

/// Everything the core needs for one tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickInput {
    /// Monotonic clock in milliseconds (e.g. the rAF timestamp)
    pub now_ms: f64,
    /// Intents received since the previous tick, oldest first
    pub intents: Vec<Intent>,
    /// Character bounding box
    pub character: Rect,
    /// Obstacle bounding boxes, in a stable order
    pub obstacles: Vec<Rect>,
}

/// Advance the game by one frame
///
/// Returns the directives the presentation layer should execute, in order.
pub fn tick(state: &mut GameState, input: &TickInput) -> Vec<Directive> {
    let mut out = Vec::new();
    state.ticks += 1;

    let shown_score = state.score;

    // Expiry runs in every phase; clearing an elapsed jump is always safe
    expire_jump(state, input.now_ms, &mut out);

    let mut reset = false;
    for &intent in &input.intents {
        reset |= apply_intent(state, intent, input.now_ms, &mut out);
    }

    if state.phase == GamePhase::Running {
        if let Some(index) = first_collision(&input.character, &input.obstacles) {
            log::debug!("Collision with obstacle {} at tick {}", index, state.ticks);
            end_run(state, &mut out);
        } else {
            score_passed(state, &input.character, &input.obstacles);
        }
    }

    if reset || state.score != shown_score {
        out.push(Directive::UpdateScoreDisplay(state.score));
    }

    out
}

fn expire_jump(state: &mut GameState, now_ms: f64, out: &mut Vec<Directive>) {
    if state.jump.is_some_and(|timer| timer.expired(now_ms)) {
        state.jump = None;
        out.push(Directive::SetJumpAnimation(JumpAnimation::Off));
    }
}

/// Returns true if the intent started a fresh run
fn apply_intent(
    state: &mut GameState,
    intent: Intent,
    now_ms: f64,
    out: &mut Vec<Directive>,
) -> bool {
    if intent == Intent::Jump {
        try_jump(state, now_ms, out);
        return false;
    }

    let from = state.phase;
    let t = transition(from, intent);
    if t.is_noop(from) {
        log::debug!("Ignoring {:?} while {:?}", intent, from);
        return false;
    }

    if t.reset_score {
        // A jump from the previous run must not leak into the new one
        if state.jump.take().is_some() {
            out.push(Directive::SetJumpAnimation(JumpAnimation::Off));
        }
        state.reset_run();
        match from {
            GamePhase::Idle => out.push(Directive::HideInstructions),
            GamePhase::GameOver => out.push(Directive::HideGameOver),
            GamePhase::Running | GamePhase::Paused => {}
        }
        out.push(Directive::SetObstaclesVisible(true));
    }

    state.phase = t.next;
    let play_state = if t.next == GamePhase::Running {
        PlayState::Running
    } else {
        PlayState::Paused
    };
    out.push(Directive::SetAnimationPlayState(play_state));

    log::info!("{:?} -> {:?} ({:?})", from, t.next, intent);
    t.reset_score
}

fn try_jump(state: &mut GameState, now_ms: f64, out: &mut Vec<Directive>) {
    if state.phase != GamePhase::Running || state.is_jumping() {
        log::debug!(
            "Dropping jump (phase {:?}, jumping {})",
            state.phase,
            state.is_jumping()
        );
        return;
    }
    state.jump = Some(JumpTimer::start(now_ms, state.config.jump_duration_ms));
    out.push(Directive::SetJumpAnimation(JumpAnimation::On));
}

/// Running -> GameOver on a collision
fn end_run(state: &mut GameState, out: &mut Vec<Directive>) {
    state.phase = GamePhase::GameOver;
    out.push(Directive::SetAnimationPlayState(PlayState::Paused));
    out.push(Directive::SetObstaclesVisible(false));

    if let Some(best) = state.record_high_score() {
        log::info!("New high score: {}", best);
        out.push(Directive::UpdateHighScoreDisplay(best));
        out.push(Directive::PersistHighScore(best));
    }

    out.push(Directive::ShowGameOver(state.score));
    log::info!("Game over with score {}", state.score);
}

fn score_passed(state: &mut GameState, character: &Rect, obstacles: &[Rect]) {
    let gained = match state.config.scoring {
        ScoringPolicy::PerFrame => obstacles
            .iter()
            .filter(|o| has_passed(o, character))
            .count() as u64,
        ScoringPolicy::OncePerObstacle => {
            state.scored.resize(obstacles.len(), false);
            let mut gained = 0;
            for (scored, obstacle) in state.scored.iter_mut().zip(obstacles) {
                if !has_passed(obstacle, character) {
                    // Back ahead of the character: count it again next pass
                    *scored = false;
                } else if !*scored {
                    *scored = true;
                    gained += 1;
                }
            }
            gained
        }
    };

    state.score += gained;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GameConfig;
    use glam::Vec2;
    use proptest::prelude::*;

    const CHARACTER_X: f32 = 50.0;

    fn character() -> Rect {
        Rect::from_xywh(CHARACTER_X, 100.0, 20.0, 50.0)
    }

    fn obstacle_at(x: f32) -> Rect {
        Rect::from_xywh(x, 130.0, 20.0, 20.0)
    }

    /// Obstacles far ahead of the character
    fn clear_track() -> Vec<Rect> {
        vec![obstacle_at(300.0), obstacle_at(500.0), obstacle_at(700.0)]
    }

    fn input(now_ms: f64, intents: &[Intent], obstacles: Vec<Rect>) -> TickInput {
        TickInput {
            now_ms,
            intents: intents.to_vec(),
            character: character(),
            obstacles,
        }
    }

    fn running_state() -> GameState {
        let mut state = GameState::default();
        tick(&mut state, &input(0.0, &[Intent::Start], clear_track()));
        assert_eq!(state.phase, GamePhase::Running);
        state
    }

    fn count(directives: &[Directive], wanted: Directive) -> usize {
        directives.iter().filter(|d| **d == wanted).count()
    }

    #[test]
    fn test_idle_start() {
        let mut state = GameState::default();
        let out = tick(&mut state, &input(0.0, &[Intent::Start], clear_track()));
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 0);
        assert!(out.contains(&Directive::HideInstructions));
        assert!(out.contains(&Directive::UpdateScoreDisplay(0)));
        assert!(out.contains(&Directive::SetAnimationPlayState(PlayState::Running)));
        assert!(!out.contains(&Directive::HideGameOver));
    }

    #[test]
    fn test_idle_ticks_do_nothing() {
        let mut state = GameState::default();
        let out = tick(&mut state, &input(0.0, &[], vec![obstacle_at(60.0)]));
        assert!(out.is_empty());
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.ticks, 1);
    }

    #[test]
    fn test_collision_ends_run() {
        let mut state = running_state();
        state.score = 4;
        let out = tick(&mut state, &input(16.0, &[], vec![obstacle_at(60.0)]));
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.high_score, 4);
        assert!(out.contains(&Directive::ShowGameOver(4)));
        assert!(out.contains(&Directive::SetAnimationPlayState(PlayState::Paused)));
        assert!(out.contains(&Directive::SetObstaclesVisible(false)));
        assert_eq!(count(&out, Directive::PersistHighScore(4)), 1);
    }

    #[test]
    fn test_collision_without_record_does_not_persist() {
        let mut state = running_state();
        state.high_score = 20;
        state.score = 3;
        let out = tick(&mut state, &input(16.0, &[], vec![obstacle_at(60.0)]));
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.high_score, 20);
        assert!(out.contains(&Directive::ShowGameOver(3)));
        assert!(!out.iter().any(|d| matches!(d, Directive::PersistHighScore(_))));
        assert!(!out.iter().any(|d| matches!(d, Directive::UpdateHighScoreDisplay(_))));
    }

    #[test]
    fn test_high_score_saved_once() {
        let mut state = running_state();
        state.high_score = 10;

        let mut saves = Vec::new();
        let mut now = 0.0;
        // One passed obstacle per frame
        while state.score < 15 {
            now += 16.0;
            let track = vec![obstacle_at(0.0), obstacle_at(400.0)];
            let out = tick(&mut state, &input(now, &[], track));
            saves.extend(out.into_iter().filter(|d| matches!(d, Directive::PersistHighScore(_))));
        }
        assert_eq!(state.score, 15);

        // Collide, then keep ticking in GameOver
        for _ in 0..5 {
            now += 16.0;
            let out = tick(&mut state, &input(now, &[], vec![obstacle_at(60.0)]));
            saves.extend(out.into_iter().filter(|d| matches!(d, Directive::PersistHighScore(_))));
        }
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.high_score, 15);
        assert_eq!(saves, vec![Directive::PersistHighScore(15)]);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut state = running_state();
        state.score = 7;

        let out = tick(&mut state, &input(16.0, &[Intent::Toggle], clear_track()));
        assert_eq!(state.phase, GamePhase::Paused);
        assert!(out.contains(&Directive::SetAnimationPlayState(PlayState::Paused)));

        // Overlapping geometry is ignored while paused
        tick(&mut state, &input(32.0, &[], vec![obstacle_at(60.0)]));
        assert_eq!(state.phase, GamePhase::Paused);
        assert_eq!(state.score, 7);

        let out = tick(&mut state, &input(48.0, &[Intent::Toggle], clear_track()));
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 7);
        assert!(out.contains(&Directive::SetAnimationPlayState(PlayState::Running)));
    }

    #[test]
    fn test_start_while_paused_restarts() {
        let mut state = running_state();
        state.score = 7;
        tick(&mut state, &input(16.0, &[Intent::Toggle], clear_track()));

        let out = tick(&mut state, &input(32.0, &[Intent::Start], clear_track()));
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 0);
        assert!(out.contains(&Directive::UpdateScoreDisplay(0)));
        assert!(!out.contains(&Directive::HideInstructions));
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut state = running_state();
        state.score = 5;
        tick(&mut state, &input(16.0, &[], vec![obstacle_at(60.0)]));
        assert_eq!(state.phase, GamePhase::GameOver);

        let out = tick(&mut state, &input(32.0, &[Intent::Start], clear_track()));
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 0);
        assert_eq!(state.high_score, 5);
        assert!(out.contains(&Directive::HideGameOver));
        assert!(out.contains(&Directive::SetObstaclesVisible(true)));
    }

    #[test]
    fn test_start_while_running_is_ignored() {
        let mut state = running_state();
        state.score = 9;
        let out = tick(&mut state, &input(16.0, &[Intent::Start], clear_track()));
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 9);
        assert!(out.is_empty());
    }

    #[test]
    fn test_double_jump_yields_single_pair() {
        let mut state = running_state();
        let mut all = Vec::new();

        all.extend(tick(&mut state, &input(100.0, &[Intent::Jump], clear_track())));
        assert!(state.is_jumping());
        all.extend(tick(&mut state, &input(300.0, &[Intent::Jump], clear_track())));
        // Second jump must not move the deadline
        assert_eq!(state.jump.map(|t| t.deadline_ms), Some(600.0));
        all.extend(tick(&mut state, &input(599.0, &[], clear_track())));
        assert!(state.is_jumping());
        all.extend(tick(&mut state, &input(600.0, &[], clear_track())));
        assert!(!state.is_jumping());
        all.extend(tick(&mut state, &input(700.0, &[], clear_track())));

        assert_eq!(count(&all, Directive::SetJumpAnimation(JumpAnimation::On)), 1);
        assert_eq!(count(&all, Directive::SetJumpAnimation(JumpAnimation::Off)), 1);
    }

    #[test]
    fn test_jump_duration_independent_of_frame_rate() {
        for frame_ms in [4.0, 16.0, 33.0] {
            let mut state = running_state();
            tick(&mut state, &input(0.0, &[Intent::Jump], clear_track()));
            let mut now = 0.0;
            while state.is_jumping() {
                now += frame_ms;
                tick(&mut state, &input(now, &[], clear_track()));
            }
            assert!(now >= 500.0 && now < 500.0 + frame_ms, "ended at {}", now);
        }
    }

    #[test]
    fn test_jump_ignored_outside_running() {
        let mut state = GameState::default();
        let out = tick(&mut state, &input(0.0, &[Intent::Jump], clear_track()));
        assert!(out.is_empty());
        assert!(!state.is_jumping());

        let mut state = running_state();
        tick(&mut state, &input(16.0, &[Intent::Toggle], clear_track()));
        let out = tick(&mut state, &input(32.0, &[Intent::Jump], clear_track()));
        assert!(out.is_empty());
        assert!(!state.is_jumping());
    }

    #[test]
    fn test_jump_expires_after_game_over() {
        let mut state = running_state();
        tick(&mut state, &input(0.0, &[Intent::Jump], clear_track()));
        tick(&mut state, &input(100.0, &[], vec![obstacle_at(60.0)]));
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.is_jumping());

        let out = tick(&mut state, &input(500.0, &[], clear_track()));
        assert!(!state.is_jumping());
        assert_eq!(out, vec![Directive::SetJumpAnimation(JumpAnimation::Off)]);
    }

    #[test]
    fn test_restart_cancels_jump() {
        let mut state = running_state();
        tick(&mut state, &input(0.0, &[Intent::Jump], clear_track()));
        tick(&mut state, &input(100.0, &[], vec![obstacle_at(60.0)]));

        let out = tick(&mut state, &input(200.0, &[Intent::Start], clear_track()));
        assert!(!state.is_jumping());
        assert_eq!(count(&out, Directive::SetJumpAnimation(JumpAnimation::Off)), 1);

        // The old deadline passes without a second Off
        let out = tick(&mut state, &input(600.0, &[], clear_track()));
        assert!(!out.contains(&Directive::SetJumpAnimation(JumpAnimation::Off)));
    }

    #[test]
    fn test_airborne_character_clears_obstacle() {
        let mut state = running_state();
        let airborne = character().translated(Vec2::new(0.0, -40.0));
        let out = tick(
            &mut state,
            &TickInput {
                now_ms: 16.0,
                intents: vec![],
                character: airborne,
                obstacles: vec![obstacle_at(55.0), obstacle_at(400.0)],
            },
        );
        assert_eq!(state.phase, GamePhase::Running);
        // The obstacle under the character counts as passed
        assert_eq!(state.score, 1);
        assert_eq!(out, vec![Directive::UpdateScoreDisplay(1)]);
    }

    #[test]
    fn test_start_with_passed_obstacles_refreshes_score_once() {
        let mut state = GameState::default();
        let track = vec![obstacle_at(0.0), obstacle_at(10.0), obstacle_at(400.0)];
        let out = tick(&mut state, &input(0.0, &[Intent::Start], track));

        assert_eq!(state.score, 2);
        let refreshes: Vec<_> = out
            .iter()
            .filter(|d| matches!(d, Directive::UpdateScoreDisplay(_)))
            .collect();
        assert_eq!(refreshes, vec![&Directive::UpdateScoreDisplay(2)]);
    }

    #[test]
    fn test_start_with_hidden_obstacle_boxes_scores_nothing() {
        // Obstacles with display:none measure as zero-size boxes at the origin
        let mut state = GameState::default();
        let hidden = vec![Rect::from_edges(0.0, 0.0, 0.0, 0.0); 3];
        let out = tick(&mut state, &input(0.0, &[Intent::Start], hidden.clone()));

        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.score, 0);
        assert_eq!(count(&out, Directive::UpdateScoreDisplay(0)), 1);

        // Same with the once-per-obstacle policy
        let mut state = GameState::new(GameConfig {
            scoring: ScoringPolicy::OncePerObstacle,
            ..Default::default()
        });
        tick(&mut state, &input(0.0, &[Intent::Start], hidden));
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_per_frame_scoring_counts_every_frame() {
        let mut state = running_state();
        let track = vec![obstacle_at(0.0), obstacle_at(10.0), obstacle_at(400.0)];
        for frame in 1..=3 {
            tick(&mut state, &input(frame as f64 * 16.0, &[], track.clone()));
        }
        assert_eq!(state.score, 6);
    }

    #[test]
    fn test_once_per_obstacle_scoring() {
        let mut state = GameState::new(GameConfig {
            scoring: ScoringPolicy::OncePerObstacle,
            ..Default::default()
        });
        tick(&mut state, &input(0.0, &[Intent::Start], clear_track()));

        let passed = vec![obstacle_at(0.0), obstacle_at(400.0)];
        for frame in 1..=5 {
            tick(&mut state, &input(frame as f64 * 16.0, &[], passed.clone()));
        }
        assert_eq!(state.score, 1);

        // First obstacle wraps back ahead, then passes again
        tick(&mut state, &input(100.0, &[], vec![obstacle_at(600.0), obstacle_at(400.0)]));
        assert_eq!(state.score, 1);
        tick(&mut state, &input(116.0, &[], vec![obstacle_at(0.0), obstacle_at(0.0)]));
        assert_eq!(state.score, 3);
    }

    #[test]
    fn test_once_per_obstacle_rearms_on_restart() {
        let mut state = GameState::new(GameConfig {
            scoring: ScoringPolicy::OncePerObstacle,
            ..Default::default()
        });
        tick(&mut state, &input(0.0, &[Intent::Start], clear_track()));
        tick(&mut state, &input(16.0, &[], vec![obstacle_at(0.0)]));
        assert_eq!(state.score, 1);

        tick(&mut state, &input(32.0, &[Intent::Toggle], vec![obstacle_at(0.0)]));
        tick(&mut state, &input(48.0, &[Intent::Start], vec![obstacle_at(0.0)]));
        assert_eq!(state.score, 1);
    }

    #[test]
    fn test_no_score_while_paused() {
        let mut state = running_state();
        tick(&mut state, &input(16.0, &[Intent::Toggle], clear_track()));
        for frame in 2..10 {
            tick(&mut state, &input(frame as f64 * 16.0, &[], vec![obstacle_at(0.0)]));
        }
        assert_eq!(state.score, 0);
    }

    fn arb_phase() -> impl Strategy<Value = GamePhase> {
        prop::sample::select(GamePhase::ALL.to_vec())
    }

    fn arb_intent() -> impl Strategy<Value = Intent> {
        prop::sample::select(Intent::ALL.to_vec())
    }

    /// Random frame: a few intents and an obstacle that may or may not overlap
    fn arb_frame() -> impl Strategy<Value = (Vec<Intent>, f32, f64)> {
        (
            prop::collection::vec(arb_intent(), 0..3),
            -50.0f32..400.0,
            1.0f64..40.0,
        )
    }

    proptest! {
        #[test]
        fn prop_transition_total(phase in arb_phase(), intent in arb_intent()) {
            let t = transition(phase, intent);
            prop_assert_eq!(t, transition(phase, intent));
            if t.reset_score {
                prop_assert_eq!(t.next, GamePhase::Running);
            }
        }

        #[test]
        fn prop_session_invariants(frames in prop::collection::vec(arb_frame(), 1..120)) {
            let mut state = GameState::default();
            let mut now = 0.0;
            let mut best = 0;

            for (intents, x, dt) in frames {
                now += dt;
                let before = state.clone();
                let out = tick(&mut state, &input(now, &intents, vec![obstacle_at(x)]));

                // Best score never drops
                prop_assert!(state.high_score >= best);
                best = state.high_score;

                let restarted = out.contains(&Directive::SetObstaclesVisible(true));
                let still_running =
                    before.phase == GamePhase::Running && state.phase == GamePhase::Running;
                if still_running && !restarted {
                    prop_assert!(state.score >= before.score);
                }
                // Score only moves while running
                if state.phase != GamePhase::Running && !restarted {
                    prop_assert_eq!(state.score, before.score);
                }
                if before.phase != GamePhase::Running && state.phase == GamePhase::GameOver {
                    prop_assert_eq!(before.high_score, state.high_score);
                }

                let ons = count(&out, Directive::SetJumpAnimation(JumpAnimation::On));
                prop_assert!(ons <= 1);
                if ons == 1 {
                    prop_assert!(state.is_jumping());
                }

                let persisted = out
                    .iter()
                    .filter(|d| matches!(d, Directive::PersistHighScore(_)))
                    .count();
                prop_assert!(persisted <= 1);

                // One score refresh at most, and only when the number changed
                let refreshes = out
                    .iter()
                    .filter(|d| matches!(d, Directive::UpdateScoreDisplay(_)))
                    .count();
                prop_assert!(refreshes <= 1);
                if refreshes == 1 {
                    prop_assert!(out.contains(&Directive::UpdateScoreDisplay(state.score)));
                } else {
                    prop_assert_eq!(state.score, before.score);
                }
                if persisted == 1 {
                    prop_assert_eq!(state.phase, GamePhase::GameOver);
                }
            }
        }
    }
}
