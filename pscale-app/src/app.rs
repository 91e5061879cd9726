use anyhow::{Result, anyhow};
use pixels::{Pixels, SurfaceTexture};
use pscale_core::{Cursor, Phase, SessionPhase, StimulusSink, SurfaceCommand, Viewport};
use pscale_experiment::{ExperimentConfig, Session, TrialInput};
use pscale_timing::HighPrecisionTimer;
use rand::rngs::StdRng;
use std::path::Path;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorIcon, Fullscreen, Window, WindowId},
};

use crate::render::{Scene, SceneRenderer};

type LiveSession = Session<SessionPhase, HighPrecisionTimer, StdRng, Box<dyn StimulusSink>>;

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    session: LiveSession,
    renderer: Option<SceneRenderer>,
    scene: Scene,
    pointer: (f64, f64),
    current_size: Option<PhysicalSize<u32>>,
    saved: bool,
    should_exit: bool,
}

impl App {
    pub fn new(config: ExperimentConfig, rng: StdRng, sink: Box<dyn StimulusSink>) -> Self {
        let criterion_y = config.criterion_initial_y_px as f32;
        // Real size arrives with the window.
        let viewport = Viewport::new(1.0, 1.0);
        let session = Session::new(config, viewport, HighPrecisionTimer::new(), rng, sink);

        Self {
            window: None,
            pixels: None,
            session,
            renderer: None,
            scene: Scene::new(1.0, 1.0, criterion_y),
            pointer: (0.0, 0.0),
            current_size: None,
            saved: false,
            should_exit: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        tracing::info!(os = std::env::consts::OS, arch = std::env::consts::ARCH, "starting");
        announce(self.session.phase);

        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("No monitor available"))?;

        let window_attributes = Window::default_attributes()
            .with_title("Pseudo-scale")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let size = window.inner_size();
        tracing::info!(
            width = size.width,
            height = size.height,
            scale_factor = window.scale_factor(),
            "window created"
        );

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface_texture)?);
        self.renderer = Some(SceneRenderer::new(size.width, size.height)?);
        self.apply_size(size);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn apply_size(&mut self, size: PhysicalSize<u32>) {
        self.current_size = Some(size);
        let (w, h) = (size.width as f64, size.height as f64);
        self.session.machine.resize(Viewport::new(w, h));
        self.scene.resize(w as f32, h as f32);
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        renderer.render_frame(
            self.session.phase,
            &self.scene,
            self.session.task_progress(),
            pixels.frame_mut(),
        );
        pixels.render()?;
        Ok(())
    }

    fn update(&mut self) {
        let commands = self.session.update();
        self.apply_commands(commands);
    }

    fn apply_commands(&mut self, commands: Vec<SurfaceCommand>) {
        for command in commands {
            if let SurfaceCommand::SetCursor(cursor) = command {
                if let Some(window) = &self.window {
                    window.set_cursor(cursor_icon(cursor));
                }
            }
            self.scene.apply(command);
        }
    }

    fn handle_pointer_move(&mut self, x: f64, y: f64) {
        self.pointer = (x, y);
        if self.scene.response_box.is_some() {
            self.scene.hover_at(x as f32, y as f32);
        }
        let commands = self.session.handle_input(TrialInput::PointerMove { x, y });
        self.apply_commands(commands);
    }

    fn handle_mouse_button(&mut self, state: ElementState) {
        let (x, y) = self.pointer;
        let input = if self.session.machine.is_awaiting_response() {
            if state.is_pressed() {
                self.scene.press_response(x as f32, y as f32);
                return;
            }
            match self.scene.release_response(x as f32, y as f32) {
                Some(response) => TrialInput::ResponseChosen(response),
                None => return,
            }
        } else if state.is_pressed() {
            TrialInput::PointerDown { x, y }
        } else {
            TrialInput::PointerUp { x, y }
        };
        let commands = self.session.handle_input(input);
        self.apply_commands(commands);
    }

    fn handle_key(&mut self, key: PhysicalKey, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        match code {
            KeyCode::Space => {
                let phase = self.session.phase;
                if phase.is_welcome() || phase == SessionPhase::Intermission {
                    self.change_phase();
                }
            }
            KeyCode::Enter | KeyCode::NumpadEnter => {
                if self.session.phase.is_practice() {
                    self.change_phase();
                } else if self.session.phase.is_experiment() {
                    self.finish_task();
                }
            }
            KeyCode::Escape => self.cleanup_and_exit(event_loop),
            _ => {}
        }
    }

    fn change_phase(&mut self) {
        if self.session.advance_phase() {
            self.reset_scene();
            announce(self.session.phase);
        }
    }

    fn finish_task(&mut self) {
        let done = self.session.next_task();
        self.reset_scene();
        if done {
            self.save_data();
            announce(self.session.phase);
        } else if let Some((task, total)) = self.session.task_progress() {
            tracing::info!(task, total, "next task");
        }
    }

    fn reset_scene(&mut self) {
        self.scene
            .reset(self.session.config.criterion_initial_y_px as f32);
        if let Some(window) = &self.window {
            window.set_cursor(cursor_icon(Cursor::Default));
        }
    }

    fn save_data(&mut self) {
        if self.saved {
            return;
        }
        let dir = Path::new(&self.session.config.output_dir).to_path_buf();
        match self.session.write_data(&dir) {
            Ok(path) => {
                self.saved = true;
                tracing::info!(path = %path.display(), "results saved");
            }
            Err(err) => tracing::error!("failed to save results: {err:#}"),
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                tracing::error!("Failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                tracing::error!("Failed to resize buffer: {e}");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                tracing::error!("Failed to resize canvas: {e:#}");
            }
        }
        self.apply_size(new_size);
        tracing::info!(width = new_size.width, height = new_size.height, "display resized");
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if !self.session.is_finished() && !self.session.completed().is_empty() {
            tracing::warn!(
                completed = self.session.completed().len(),
                "session aborted before the last task, no data written"
            );
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                tracing::error!("Failed to create window and surface: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                self.update();
                if let Err(e) = self.render() {
                    tracing::error!("render failed: {e:#}");
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if let Some(win) = &self.window {
                    win.request_redraw();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_pointer_move(position.x, position.y);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.handle_mouse_button(state),
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed() && !event.repeat =>
            {
                self.handle_key(event.physical_key, event_loop);
            }
            WindowEvent::Resized(sz) => self.handle_resize(sz),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.handle_resize(size);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(task) = self.session.machine.dispose() {
            tracing::debug!(trials = task.current_index(), "running task discarded");
        }
    }
}

fn cursor_icon(cursor: Cursor) -> CursorIcon {
    match cursor {
        Cursor::Default => CursorIcon::Default,
        Cursor::Grab => CursorIcon::Grab,
        Cursor::Grabbing => CursorIcon::Grabbing,
    }
}

fn announce(phase: SessionPhase) {
    let message = match phase {
        SessionPhase::Welcome => "Press SPACE to start the practice task, ESC to exit.",
        SessionPhase::Practice => {
            "Click anywhere to hear a tone pair and answer in the box. Drag the red line to \
             mark where tones start to sound different. Press ENTER to end practice."
        }
        SessionPhase::Intermission => "Practice over. Press SPACE to start the experiment.",
        SessionPhase::Experiment => "Press ENTER when you are done with a task.",
        SessionPhase::Goodbye => "All tasks done, thank you! Press ESC to exit.",
    };
    tracing::info!(phase = ?phase, "{message}");
}
