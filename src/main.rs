//! Bounce Toy entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, MouseEvent, PointerEvent};

    use bounce_toy::SceneSettings;
    use bounce_toy::consts::*;
    use bounce_toy::renderer::{SdfRenderState, sprite};
    use bounce_toy::sim::{InputEvent, Simulation, Viewport, dispatch, tick};
    use glam::Vec2;

    /// Toy instance holding all state
    struct Toy {
        sim: Simulation,
        render_state: Option<SdfRenderState>,
        accumulator: f32,
        last_time: f64,
        /// Input received since the last frame, in arrival order
        pending: Vec<InputEvent>,
        pixel_ratio: f32,
    }

    impl Toy {
        fn new(settings: SceneSettings, viewport: Viewport, pixel_ratio: f32) -> Self {
            Self {
                sim: Simulation::new(settings, viewport),
                render_state: None,
                accumulator: 0.0,
                last_time: 0.0,
                pending: Vec::new(),
                pixel_ratio,
            }
        }

        /// Apply queued input, then run simulation ticks
        fn update(&mut self, dt: f32, time: f64) {
            for event in self.pending.drain(..) {
                dispatch(&mut self.sim, event);
            }

            let dt = dt.min(MAX_FRAME_DT);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                tick(&mut self.sim, SIM_DT, time);
                self.accumulator -= SIM_DT;
                substeps += 1;
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.sim) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        let (w, h) = render_state.size;
                        render_state.resize(w, h, self.pixel_ratio);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }
    }

    /// Size the canvas to fill the window; returns its CSS and physical size
    fn fit_canvas(
        window: &web_sys::Window,
        canvas: &HtmlCanvasElement,
    ) -> (Viewport, (u32, u32), f32) {
        let dpr = window.device_pixel_ratio();
        let css_w = window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let css_h = window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);

        let style = canvas.style();
        let _ = style.set_property("width", &format!("{css_w}px"));
        let _ = style.set_property("height", &format!("{css_h}px"));

        let width = (css_w * dpr) as u32;
        let height = (css_h * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        (
            Viewport::new(css_w as f32, css_h as f32),
            (width, height),
            dpr as f32,
        )
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Bounce Toy starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .query_selector(".js-canvas")
            .ok()
            .flatten()
            .expect("no .js-canvas element")
            .dyn_into()
            .expect("not a canvas");

        let settings = SceneSettings::load(canvas.get_attribute("data-settings").as_deref());
        let sprite_path = settings
            .ball
            .options
            .render
            .sprite
            .as_ref()
            .map(|s| s.texture.clone());

        let (viewport, (width, height), dpr) = fit_canvas(&window, &canvas);
        let toy = Rc::new(RefCell::new(Toy::new(settings, viewport, dpr)));

        // Initialize WebGPU, with WebGL2 as fallback
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = SdfRenderState::new(surface, &adapter, width, height, dpr).await;
        toy.borrow_mut().render_state = Some(render_state);

        if let Some(path) = sprite_path {
            load_sprite(toy.clone(), path);
        }

        setup_input_handlers(&canvas, toy.clone());
        setup_resize_handler(&canvas, toy.clone());

        request_animation_frame(toy);

        log::info!("Bounce Toy running!");
    }

    /// Fetch the ball sprite in the background; until it arrives the balls are flat disks
    fn load_sprite(toy: Rc<RefCell<Toy>>, path: String) {
        wasm_bindgen_futures::spawn_local(async move {
            match sprite::fetch(&path).await {
                Ok(image) => {
                    if let Some(ref mut render_state) = toy.borrow_mut().render_state {
                        render_state.set_sprite(&image);
                    }
                }
                Err(e) => log::warn!("Sprite unavailable, drawing plain balls: {e}"),
            }
        });
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, toy: Rc<RefCell<Toy>>) {
        let at = |event: &PointerEvent| Vec2::new(event.offset_x() as f32, event.offset_y() as f32);

        // Pointer down - grab a ball and keep receiving moves outside the canvas
        {
            let toy = toy.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let _ = canvas_clone.set_pointer_capture(event.pointer_id());
                toy.borrow_mut().pending.push(InputEvent::PointerDown(at(&event)));
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer move
        {
            let toy = toy.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                toy.borrow_mut().pending.push(InputEvent::PointerMove(at(&event)));
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer up / cancel - release the grab
        for name in ["pointerup", "pointercancel"] {
            let toy = toy.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                toy.borrow_mut().pending.push(InputEvent::PointerUp);
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click anywhere on the page, mapped into canvas coordinates
        {
            let document = web_sys::window().unwrap().document().unwrap();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let rect = canvas_clone.get_bounding_client_rect();
                let at = Vec2::new(
                    (f64::from(event.client_x()) - rect.left()) as f32,
                    (f64::from(event.client_y()) - rect.top()) as f32,
                );
                toy.borrow_mut().pending.push(InputEvent::Click(at));
            });
            let _ = document
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize_handler(canvas: &HtmlCanvasElement, toy: Rc<RefCell<Toy>>) {
        let window = web_sys::window().unwrap();
        let window_clone = window.clone();
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let (viewport, (width, height), dpr) = fit_canvas(&window_clone, &canvas);
            let mut t = toy.borrow_mut();
            t.pixel_ratio = dpr;
            t.pending.push(InputEvent::Resize(viewport));
            if let Some(ref mut render_state) = t.render_state {
                render_state.resize(width, height, dpr);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(toy: Rc<RefCell<Toy>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            frame_loop(toy, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(toy: Rc<RefCell<Toy>>, time: f64) {
        {
            let mut t = toy.borrow_mut();

            // Calculate delta time
            let dt = if t.last_time > 0.0 {
                ((time - t.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            t.last_time = time;

            t.update(dt, time);
            t.render();
        }

        request_animation_frame(toy);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Bounce Toy (native) starting...");
    log::info!("Native mode has no window - run with `trunk serve` for the web version");

    run_headless();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted session at 800x600: a click, a ball dropped out of view, its reset
#[cfg(not(target_arch = "wasm32"))]
fn run_headless() {
    use bounce_toy::SceneSettings;
    use bounce_toy::consts::SIM_DT;
    use bounce_toy::sim::{BallId, InputEvent, Simulation, Viewport, dispatch, tick};
    use glam::Vec2;

    let settings = SceneSettings::load(std::env::var("BOUNCE_SETTINGS").ok().as_deref());
    let mut sim = Simulation::new(settings, Viewport::new(800.0, 600.0));
    let frame_ms = |i: u32| f64::from(i) * f64::from(SIM_DT) * 1000.0;

    let center = sim.ball_position(BallId::Ball1);
    dispatch(&mut sim, InputEvent::Click(center + Vec2::new(-20.0, 10.0)));
    tick(&mut sim, SIM_DT, frame_ms(0));
    log::info!(
        "After click: ball1 at {} moving {}",
        sim.ball_position(BallId::Ball1),
        sim.ball_velocity(BallId::Ball1)
    );

    sim.place_ball(BallId::Ball2, Vec2::new(400.0, 700.0), Vec2::new(0.0, 200.0));
    for i in 1..=90 {
        tick(&mut sim, SIM_DT, frame_ms(i));
        if let Some(deadline) = sim.resets().deadline(BallId::Ball2) {
            log::debug!("step {i}: ball2 reset pending at {deadline:.0} ms");
        }
    }

    for ball in sim.snapshot() {
        log::info!(
            "{} at {} moving {} after {} steps",
            ball.id.as_str(),
            ball.pos,
            ball.vel,
            sim.time_ticks
        );
    }
}
