//! SkyRun entry point
//!
//! On the web: sets up WebGPU, input and the DOM HUD, then runs the
//! fixed-step game loop. Natively: plays a seeded headless run and logs it.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use skyrun::audio::AudioManager;
    use skyrun::consts::*;
    use skyrun::persistence::{KeyValueStore, LocalStore, MemoryStore};
    use skyrun::platform;
    use skyrun::renderer::{RenderState, scene};
    use skyrun::session::Session;
    use skyrun::shop::{Upgrade, upgrade_cost};
    use skyrun::sim::{GamePhase, GameState, TickInput, tick};
    use skyrun::wallet::WalletBridge;

    /// Downward swipe distance (CSS px) that counts as a slide
    const SWIPE_SLIDE_PX: i32 = 40;

    /// Game instance holding all state
    struct Game {
        state: GameState,
        session: Session,
        audio: AudioManager,
        render_state: Option<RenderState>,
        /// Cosmetic randomness (shake jitter) kept off the simulation RNG
        render_rng: Pcg32,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        touch_start_y: Option<i32>,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let store: Box<dyn KeyValueStore> = match LocalStore::open() {
                Some(store) => Box::new(store),
                None => {
                    log::warn!("LocalStorage unavailable - progress will not persist");
                    Box::new(MemoryStore::new())
                }
            };
            let mut session = Session::new(store, WalletBridge::detect());
            // The page may already hold a paired wallet from a previous visit
            session.wallet.refresh_status();
            let mut audio = AudioManager::new();
            audio.apply_settings(&session.settings);
            audio.set_muted(session.progress.muted);

            let mut state = GameState::new(seed);
            session.new_run(&mut state, seed);

            Self {
                state,
                session,
                audio,
                render_state: None,
                render_rng: Pcg32::seed_from_u64(seed ^ 0x5eed),
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                touch_start_y: None,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Run simulation ticks, then react to what happened
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.clone();
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // One-shot inputs
                self.input = TickInput::default();
            }

            for (effect, pitch) in self.session.handle_game_events(&mut self.state) {
                self.audio.play(effect, pitch);
            }
            self.session.poll_wallet(&mut self.state);

            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        fn render(&mut self) {
            let segments = self.session.settings.quality.circle_segments();
            let Some(render_state) = self.render_state.as_mut() else {
                return;
            };
            let vertices = scene::build(&self.state, segments, &mut self.render_rng);
            match render_state.render(&vertices) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    render_state.resize(render_state.size.0, render_state.size.1);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        fn restart(&mut self) {
            let seed = platform::run_seed();
            self.session.new_run(&mut self.state, seed);
            self.accumulator = 0.0;
            self.input = TickInput::default();
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document) {
            let state = &self.state;
            let tier = state.difficulty.current();

            set_text(document, "hud-distance", &format!("{:.0} m", state.distance));
            set_text(document, "hud-coins", &state.stats.coins.to_string());
            set_text(document, "hud-score", &state.score().to_string());
            set_text(document, "hud-high", &self.session.progress.high_score.to_string());
            set_text(document, "hud-tier", tier.name);
            set_text(document, "hud-lifelines", &state.lifelines.to_string());
            if self.session.settings.show_fps {
                set_text(document, "hud-fps", &self.fps.to_string());
            }
            if let Some(el) = document.get_element_by_id("hud-progress") {
                let pct = state.difficulty.progress_to_next_milestone();
                let _ = el.set_attribute("style", &format!("width: {:.1}%", pct));
            }

            match &state.banner {
                Some(banner) => {
                    set_text(document, "difficulty-banner", &banner.text);
                    set_visible(document, "difficulty-banner", true);
                }
                None => set_visible(document, "difficulty-banner", false),
            }

            set_visible(document, "start-prompt", state.phase == GamePhase::Ready);
            set_visible(document, "pause-menu", state.phase == GamePhase::Paused);
            set_visible(document, "crash-prompt", state.phase == GamePhase::Crashed);
            set_visible(
                document,
                "continue-btn",
                state.phase == GamePhase::Crashed && state.lifelines > 0,
            );

            let game_over = state.phase == GamePhase::GameOver;
            set_visible(document, "game-over", game_over);
            if game_over {
                set_text(document, "final-score", &state.score().to_string());
                set_text(document, "final-distance", &format!("{:.0}", state.distance));
                let rank = self
                    .session
                    .last_rank
                    .map(|r| format!("#{}", r))
                    .unwrap_or_else(|| "-".to_string());
                set_text(document, "final-rank", &rank);
                if let Some(best) = self.session.high_scores.entries.first() {
                    let when = skyrun::highscores::format_date(best.timestamp, platform::now_ms());
                    set_text(
                        document,
                        "final-best",
                        &format!("{} ({})", best.score, when),
                    );
                }
            }

            let wallet = self.session.wallet.status();
            let wallet_text = match (wallet.connected, &wallet.account) {
                (true, Some(account)) => account.clone(),
                (true, None) => "Connected".to_string(),
                (false, _) => "Not connected".to_string(),
            };
            set_text(document, "wallet-status", &wallet_text);
            set_text(
                document,
                "quests-claimable",
                &self.session.quests.claimable().len().to_string(),
            );

            let progress = &self.session.progress;
            set_text(document, "shop-coins", &progress.coins.to_string());
            for (upgrade, id) in [(Upgrade::Shield, "shop-shield"), (Upgrade::Booster, "shop-booster")] {
                let level = upgrade.level(progress);
                let label = match upgrade_cost(level) {
                    Some(cost) => format!("{} Lv{} ({} coins)", upgrade.as_str(), level, cost),
                    None => format!("{} Lv{} (max)", upgrade.as_str(), level),
                };
                set_text(document, id, &label);
            }
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    pub async fn run() {
        platform::init_logging();
        log::info!("SkyRun starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let seed = platform::run_seed();
        let game = Rc::new(RefCell::new(Game::new(seed)));
        log::info!("Game initialized with seed: {}", seed);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => {
                let adapter = instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::HighPerformance,
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: false,
                    })
                    .await;
                match adapter {
                    Ok(adapter) => {
                        log::info!("Using adapter: {:?}", adapter.get_info().name);
                        match RenderState::new(surface, &adapter, width, height).await {
                            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
                            Err(e) => log::error!("Failed to create device: {}", e),
                        }
                    }
                    Err(e) => log::error!("No graphics adapter: {}", e),
                }
            }
            Err(e) => log::error!("Failed to create surface: {}", e),
        }

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());
        setup_auto_pause(game.clone());

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        request_animation_frame(game);

        log::info!("SkyRun running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Click/tap on the canvas jumps
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.audio.resume();
                g.input.jump = true;
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch: tap jumps, downward swipe slides
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                g.audio.resume();
                g.touch_start_y = event.touches().get(0).map(|t| t.client_y());
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                let end_y = event.changed_touches().get(0).map(|t| t.client_y());
                match (g.touch_start_y.take(), end_y) {
                    (Some(start), Some(end)) if end - start > SWIPE_SLIDE_PX => g.input.slide = true,
                    _ => g.input.jump = true,
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let Some(window) = web_sys::window() else {
                return;
            };
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                g.audio.resume();
                match event.key().as_str() {
                    " " | "ArrowUp" | "w" | "W" => {
                        event.prevent_default();
                        g.input.jump = true;
                    }
                    "ArrowDown" | "s" | "S" => {
                        event.prevent_default();
                        g.input.slide = true;
                    }
                    "Escape" | "p" | "P" => g.input.pause = true,
                    "c" | "C" => g.input.continue_run = true,
                    "Enter" | "r" | "R" => {
                        if g.state.phase == GamePhase::GameOver {
                            g.restart();
                        }
                    }
                    "m" | "M" => {
                        let muted = g.session.toggle_mute();
                        g.audio.set_muted(muted);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Wire a button id to a handler
    fn on_click(document: &Document, id: &str, mut handler: impl FnMut() + 'static) {
        let Some(btn) = document.get_element_by_id(id) else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| handler());
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        let g = game.clone();
        on_click(&document, "restart-btn", move || g.borrow_mut().restart());

        let g = game.clone();
        on_click(&document, "resume-btn", move || g.borrow_mut().input.pause = true);

        let g = game.clone();
        on_click(&document, "continue-btn", move || {
            g.borrow_mut().input.continue_run = true
        });

        let g = game.clone();
        on_click(&document, "mute-btn", move || {
            let mut g = g.borrow_mut();
            let muted = g.session.toggle_mute();
            g.audio.set_muted(muted);
        });

        let g = game.clone();
        on_click(&document, "connect-wallet-btn", move || {
            if let Err(e) = g.borrow_mut().session.wallet.connect() {
                alert(&format!("Wallet: {}", e));
            }
        });

        let g = game.clone();
        on_click(&document, "disconnect-wallet-btn", move || {
            g.borrow_mut().session.disconnect_wallet()
        });

        let g = game.clone();
        on_click(&document, "claim-quests-btn", move || {
            match g.borrow_mut().session.claim_quests() {
                Ok(0) => alert("No quests ready to claim"),
                Ok(n) => log::info!("Sent {} quest claims", n),
                Err(e) => alert(&format!("Cannot claim: {}", e)),
            }
        });

        let g = game.clone();
        on_click(&document, "buy-lifeline-btn", move || {
            if let Err(e) = g.borrow_mut().session.buy_lifeline() {
                alert(&format!("Cannot buy lifeline: {}", e));
            }
        });

        for (id, upgrade) in [
            ("buy-shield-btn", Upgrade::Shield),
            ("buy-booster-btn", Upgrade::Booster),
        ] {
            let g = game.clone();
            on_click(&document, id, move || {
                if let Err(e) = g.borrow_mut().session.purchase(upgrade) {
                    log::info!("{} purchase refused: {}", upgrade.as_str(), e);
                }
            });
        }
    }

    fn alert(message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Tab hidden
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.state.phase == GamePhase::Running {
                        g.input.pause = true;
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.state.phase == GamePhase::Running {
                    g.input.pause = true;
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
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
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt, time);
            g.render();
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.update_hud(&document);
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}

/// Headless run driven by a simple autopilot, for smoke-testing the simulation
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use skyrun::consts::{PLAYER_X, SIM_DT};
    use skyrun::persistence::MemoryStore;
    use skyrun::session::Session;
    use skyrun::sim::{GamePhase, GameState, ObstacleKind, TickInput, tick};
    use skyrun::wallet::WalletBridge;

    skyrun::platform::init_logging();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(7u64);
    log::info!("SkyRun (native) headless run, seed {}", seed);
    log::info!("The playable build targets wasm32 - use `trunk serve`");

    let mut session = Session::new(Box::new(MemoryStore::new()), WalletBridge::fallback());
    let mut state = GameState::new(seed);
    session.new_run(&mut state, seed);

    // Ten simulated minutes at most
    let max_ticks = 60 * 60 * 10;
    for _ in 0..max_ticks {
        let mut input = TickInput::default();
        match state.phase {
            GamePhase::Ready => input.jump = true,
            GamePhase::Running => {
                // React to the nearest obstacle ahead
                if let Some(next) = state
                    .obstacles
                    .iter()
                    .filter(|o| o.right() > PLAYER_X)
                    .min_by(|a, b| a.x.total_cmp(&b.x))
                {
                    let gap = next.x - PLAYER_X;
                    let lead = state.speed * 0.2;
                    if gap < lead {
                        match next.kind {
                            ObstacleKind::Barrier => input.slide = true,
                            ObstacleKind::Crate | ObstacleKind::Spikes => input.jump = true,
                        }
                    }
                }
            }
            GamePhase::GameOver => break,
            GamePhase::Crashed | GamePhase::Paused => {}
        }
        tick(&mut state, &input, SIM_DT);
        for (effect, _) in session.handle_game_events(&mut state) {
            log::debug!("sound: {:?}", effect);
        }
    }

    log::info!(
        "Run finished: {:.0} m, {} coins, score {}, tier {}",
        state.distance,
        state.stats.coins,
        state.score(),
        state.difficulty.current().name
    );
    println!(
        "distance={:.0} coins={} score={} jumps={} tier={}",
        state.distance,
        state.stats.coins,
        state.score(),
        state.stats.jumps,
        state.difficulty.current().name
    );
}
