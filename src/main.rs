//! Block Jump entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlElement, KeyboardEvent};

    use block_jump::persistence::LocalStorageStore;
    use block_jump::sim::{Directive, GameState, InputQueue, JumpAnimation, Rect, TickInput, tick};
    use block_jump::{HighScoreStore, Settings};

    const OBSTACLE_IDS: [&str; 3] = ["block1", "block2", "block3"];

    /// Page elements the game reads from and writes to
    struct Elements {
        character: HtmlElement,
        obstacles: Vec<HtmlElement>,
        score: Option<Element>,
        high_score: Option<Element>,
        game_over: Option<HtmlElement>,
        game_over_score: Option<Element>,
        instructions: Option<HtmlElement>,
    }

    impl Elements {
        fn find(document: &Document) -> Option<Self> {
            let html = |id: &str| {
                document
                    .get_element_by_id(id)
                    .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            };
            Some(Self {
                character: html("character")?,
                obstacles: OBSTACLE_IDS.iter().filter_map(|&id| html(id)).collect(),
                score: document.get_element_by_id("score"),
                high_score: document.get_element_by_id("highScore"),
                game_over: html("gameOver"),
                game_over_score: document.get_element_by_id("gameOverScore"),
                instructions: html("instructions"),
            })
        }
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        settings: Settings,
        elements: Elements,
        high_scores: Option<HighScoreStore<LocalStorageStore>>,
        /// Input received since the last frame
        input: InputQueue,
        /// Hidden obstacles have no layout box and are left out of snapshots
        obstacles_visible: bool,
    }

    impl Game {
        /// Queue a key for the next frame; true if it is bound
        fn on_key(&mut self, key: &str) -> bool {
            let keys = &self.settings.keys;
            if key != keys.jump && key != keys.action {
                return false;
            }
            self.input.push_key(key);
            true
        }

        /// Snapshot the page and run one tick
        fn frame(&mut self, now_ms: f64) {
            let obstacles = if self.obstacles_visible {
                self.elements.obstacles.iter().map(|el| rect_of(el)).collect()
            } else {
                Vec::new()
            };
            let input = TickInput {
                now_ms,
                intents: self.input.drain(&self.settings.keys, self.state.phase),
                character: rect_of(&self.elements.character),
                obstacles,
            };
            for directive in tick(&mut self.state, &input) {
                self.apply(directive);
            }
        }

        fn apply(&mut self, directive: Directive) {
            let el = &self.elements;
            match directive {
                Directive::ShowGameOver(score) => {
                    if let Some(text) = &el.game_over_score {
                        text.set_text_content(Some(&score.to_string()));
                    }
                    if let Some(banner) = &el.game_over {
                        set_style(banner, "display", "block");
                    }
                }
                Directive::HideGameOver => {
                    if let Some(banner) = &el.game_over {
                        set_style(banner, "display", "none");
                    }
                }
                Directive::HideInstructions => {
                    if let Some(instructions) = &el.instructions {
                        set_style(instructions, "display", "none");
                    }
                }
                Directive::SetAnimationPlayState(play_state) => {
                    set_style(&el.character, "animation-play-state", play_state.as_css());
                    for obstacle in &el.obstacles {
                        set_style(obstacle, "animation-play-state", play_state.as_css());
                    }
                }
                Directive::SetObstaclesVisible(visible) => {
                    self.obstacles_visible = visible;
                    let display = if visible { "block" } else { "none" };
                    for obstacle in &el.obstacles {
                        set_style(obstacle, "display", display);
                    }
                }
                Directive::SetJumpAnimation(animation) => {
                    let classes = el.character.class_list();
                    let _ = match animation {
                        JumpAnimation::On => classes.add_1("animate"),
                        JumpAnimation::Off => classes.remove_1("animate"),
                    };
                }
                Directive::UpdateScoreDisplay(score) => {
                    if let Some(text) = &el.score {
                        text.set_text_content(Some(&format!("Score: {}", score)));
                    }
                }
                Directive::UpdateHighScoreDisplay(score) => {
                    if let Some(text) = &el.high_score {
                        text.set_text_content(Some(&format!("High Score: {}", score)));
                    }
                }
                Directive::PersistHighScore(score) => {
                    if let Some(store) = &self.high_scores {
                        store.save(score);
                    }
                }
            }
        }
    }

    fn rect_of(el: &Element) -> Rect {
        let r = el.get_bounding_client_rect();
        Rect::from_edges(r.left() as f32, r.top() as f32, r.right() as f32, r.bottom() as f32)
    }

    fn set_style(el: &HtmlElement, property: &str, value: &str) {
        let _ = el.style().set_property(property, value);
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Block Jump starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let Some(elements) = Elements::find(&document) else {
            log::error!("Missing #character element, not starting");
            return;
        };

        let storage = match LocalStorageStore::new() {
            Ok(storage) => Some(storage),
            Err(e) => {
                log::warn!("Storage unavailable, scores will not persist: {}", e);
                None
            }
        };

        let settings = storage
            .as_ref()
            .map(Settings::load_from)
            .unwrap_or_default();
        let high_scores = storage.map(HighScoreStore::new);

        let mut state = GameState::new(settings.game_config());
        let loaded = high_scores.as_ref().map(|s| s.load()).unwrap_or(0);
        let restored = state.restore_high_score(loaded);

        let game = Rc::new(RefCell::new(Game {
            state,
            settings,
            elements,
            high_scores,
            input: InputQueue::new(),
            obstacles_visible: false,
        }));
        if let Some(directive) = restored {
            game.borrow_mut().apply(directive);
        }

        setup_input_handlers(&document, game.clone());
        if game.borrow().settings.auto_pause {
            setup_auto_pause(game.clone());
        }

        request_animation_frame(game);

        log::info!("Block Jump running!");
    }

    fn setup_input_handlers(document: &Document, game: Rc<RefCell<Game>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            if game.borrow_mut().on_key(&event.key()) {
                // Keep space/arrow keys from scrolling the page
                event.prevent_default();
            }
        });
        let _ = document
            .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().frame(time);
        request_animation_frame(game);
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().input.request_pause();
                    log::debug!("Pause requested (tab hidden)");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().input.request_pause();
                log::debug!("Pause requested (window blur)");
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use block_jump::Settings;
    use block_jump::persistence::MemoryStore;
    use block_jump::platform::HeadlessSession;

    env_logger::init();
    log::info!("Block Jump (native) starting...");
    log::info!("Native mode plays headless demo runs - run with `trunk serve` for the web version");

    // Optional seed as the first argument
    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<u64>().ok())
        .unwrap_or(2024);

    let mut session = HeadlessSession::new(Settings::default(), MemoryStore::new(), seed, 0.05);
    for run in 1..=3 {
        let summary = session.run(60 * 120);
        println!(
            "Run {}: score {} after {} frames ({}), best {}",
            run,
            summary.score,
            summary.frames,
            if summary.game_over { "crashed" } else { "survived" },
            summary.high_score
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
