use anyhow::{Result, anyhow};
use doorplay_core::Phase;
use doorplay_experiment::ExperimentEvent;
use doorplay_render::{FrameStats, SkiaRenderer, load_font};
use doorplay_timing::Timer;
use pixels::{Pixels, SurfaceTexture};
use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowId},
};

use crate::Session;
use crate::audio::CuePlayer;

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    experiment: Session,
    renderer: Option<SkiaRenderer>,
    cues: CuePlayer,
    font_path: PathBuf,
    scale_factor: f64,
    refresh_rate: Option<f64>,

    should_exit: bool,
}

impl App {
    pub fn new(experiment: Session, font_path: PathBuf) -> Self {
        let font_path = experiment.config.asset_root.join(font_path);
        let cues = CuePlayer::new(
            experiment.assets.clone(),
            experiment.config.sounds.clone(),
        );
        Self {
            window: None,
            pixels: None,
            experiment,
            renderer: None,
            cues,
            font_path,
            scale_factor: 1.0,
            refresh_rate: None,
            should_exit: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        log::info!(
            "Platform: {} ({})",
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        log::info!("Arrow keys move, SPACE opens or continues, ESC exits");

        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("No monitor available"))?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let window_attributes = Window::default_attributes()
            .with_title("Doorplay")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.scale_factor = window.scale_factor();

        log::info!(
            "Display {}x{} at scale {:.2}, refresh {:?} Hz",
            physical_size.width,
            physical_size.height,
            self.scale_factor,
            self.refresh_rate
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);
        self.renderer = Some(SkiaRenderer::new(
            physical_size.width,
            physical_size.height,
            load_font(&self.font_path),
        )?);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);

        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pix), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        let screen = self.experiment.screen();
        let timer = self.experiment.timer.clone();
        let stats: FrameStats = renderer.render_frame(&screen, pix.frame_mut(), &timer)?;

        let now = timer.now();
        pix.render()?;
        let present = timer.elapsed(now);

        log::trace!(
            "frame: draw {:.3}ms, copy {:.3}ms, present {:.3}ms",
            stats.draw.as_secs_f64() * 1e3,
            stats.copy.as_secs_f64() * 1e3,
            present.as_secs_f64() * 1e3,
        );
        Ok(())
    }

    fn update(&mut self) {
        for event in self.experiment.update() {
            self.experiment.handle_event(event);
        }
        self.cues.play_all(self.experiment.drain_cues());
    }

    fn handle_input(&mut self, key: PhysicalKey, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let in_block = self.experiment.current_phase().is_block();
        let event = match code {
            KeyCode::ArrowUp | KeyCode::KeyW => ExperimentEvent::MoveForward,
            KeyCode::ArrowDown | KeyCode::KeyS => ExperimentEvent::MoveBackward,
            KeyCode::Space | KeyCode::Enter if in_block => ExperimentEvent::Confirm,
            KeyCode::Space | KeyCode::Enter => ExperimentEvent::Continue,
            KeyCode::Escape => {
                self.cleanup_and_exit(event_loop);
                return;
            }
            _ => return,
        };
        self.experiment.handle_event(event);
        self.cues.play_all(self.experiment.drain_cues());
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                log::error!("Failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                log::error!("Failed to resize buffer: {e}");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                log::error!("Failed to resize canvas: {e}");
            }
        }
        log::info!("Display resized to {}x{}", new_size.width, new_size.height);
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }

        let summary = self.experiment.summary();
        log::info!(
            "Session closed after {} doors with {} coins",
            summary.trials,
            summary.total_coins
        );

        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                log::error!("Failed to create window and surface: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                self.update();
                if self.experiment.is_finished() {
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if let Err(e) = self.render() {
                    log::error!("Render failed: {e}");
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if let Some(win) = &self.window {
                    win.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed() && !event.repeat =>
            {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(sz) => self.handle_resize(sz),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
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
