mod diagnostics;

use anyhow::Result;
use clap::Parser;
use diagnostics::{Diagnostics, SharedDiagnostics};
use mirrorworld_character::{CharacterError, CharacterParts, FsLoader};
use mirrorworld_common::{SurfaceSize, ViewRole};
use mirrorworld_engine::{Engine, EngineConfig, EngineHost, FrameScheduler, Viewpoint};
use mirrorworld_input::{ControlsSender, Key};
use mirrorworld_render_wgpu::{GpuContext, WgpuSurface};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "mirrorworld-desktop", about = "Mirrorworld: one character, two views")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Engine config file (YAML); built-in defaults otherwise
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory character model paths are resolved against
    #[arg(long, default_value = "./assets")]
    assets: PathBuf,

    /// Overview vantage point: top, front, right or left
    #[arg(long)]
    viewpoint: Option<Viewpoint>,
}

/// Messages from worker threads into the event loop.
enum UserEvent {
    RigLoaded(ViewRole, Result<CharacterParts, CharacterError>),
}

/// Asks the primary window for another redraw; each redraw is one tick.
struct RedrawScheduler {
    window: Arc<Window>,
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) {
        self.window.request_redraw();
    }
}

fn inner_size(window: &Window) -> SurfaceSize {
    let size = window.inner_size();
    SurfaceSize::new(size.width, size.height)
}

/// Everything that exists once the windows are up.
struct Running {
    primary: Arc<Window>,
    engine: Engine,
    controls: ControlsSender,
    diagnostics: Rc<RefCell<Diagnostics>>,
    // Keeps the overview window open.
    _secondary: Arc<Window>,
}

struct App {
    config: EngineConfig,
    assets: PathBuf,
    proxy: EventLoopProxy<UserEvent>,
    running: Option<Running>,
}

impl App {
    fn new(config: EngineConfig, assets: PathBuf, proxy: EventLoopProxy<UserEvent>) -> Self {
        Self {
            config,
            assets,
            proxy,
            running: None,
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let primary = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_title("Mirrorworld")
                    .with_inner_size(PhysicalSize::new(1280u32, 720)),
            )?,
        );
        let secondary = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_title(format!("Mirrorworld ({})", self.config.secondary.viewpoint))
                    .with_inner_size(PhysicalSize::new(640u32, 480)),
            )?,
        );

        let options = self.config.renderer;
        let instance = GpuContext::create_instance();
        let primary_surface = instance.create_surface(primary.clone())?;
        let secondary_surface = instance.create_surface(secondary.clone())?;
        let gpu = GpuContext::new(instance, &primary_surface, &options)?;

        let mut primary_view = WgpuSurface::new(&gpu, primary_surface, inner_size(&primary), options)?;
        let secondary_view = WgpuSurface::new(&gpu, secondary_surface, inner_size(&secondary), options)?;

        let diagnostics = Rc::new(RefCell::new(Diagnostics::new(
            primary.clone(),
            gpu.device(),
            primary_view.format(),
        )));
        primary_view.set_overlay_painter(Box::new(SharedDiagnostics(diagnostics.clone())));

        let host = EngineHost::new(Box::new(primary_view), Box::new(secondary_view)).with_scheduler(
            Box::new(RedrawScheduler {
                window: primary.clone(),
            }),
        );
        let mut engine = Engine::new(self.config.clone(), host);
        diagnostics.borrow_mut().attach(
            engine.stats(),
            format!("overview: {}", self.config.secondary.viewpoint),
        );
        let controls = engine.enable_controls();

        let loader = FsLoader::new(self.assets.clone());
        for role in ViewRole::ALL {
            let proxy = self.proxy.clone();
            engine.create_character_rig(role, &loader, move |role, outcome| {
                if proxy.send_event(UserEvent::RigLoaded(role, outcome)).is_err() {
                    tracing::debug!(%role, "event loop closed before the character arrived");
                }
            })?;
        }

        primary.request_redraw();
        Ok(Running {
            primary,
            engine,
            controls,
            diagnostics,
            _secondary: secondary,
        })
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                tracing::error!("startup failed: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        let Some(running) = &mut self.running else {
            return;
        };
        match event {
            UserEvent::RigLoaded(role, outcome) => {
                if let Err(e) = running.engine.complete_rig_load(role, outcome) {
                    tracing::warn!(%role, "character not attached: {e}");
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };
        let is_primary = window_id == running.primary.id();
        if is_primary && running.diagnostics.borrow_mut().on_window_event(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let size = SurfaceSize::new(size.width, size.height);
                if is_primary {
                    running.engine.resize_primary(size);
                } else {
                    running.engine.resize_secondary(size);
                }
            }
            WindowEvent::Focused(false) => running.controls.release_all(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => match (code, state) {
                (KeyCode::F1, ElementState::Pressed) => running.diagnostics.borrow_mut().toggle(),
                (KeyCode::Escape, ElementState::Pressed) => event_loop.exit(),
                // Key names follow winit's key codes: KeyW, Space, ShiftLeft, ...
                (code, ElementState::Pressed) => running.controls.press(Key::new(format!("{code:?}"))),
                (code, ElementState::Released) => running.controls.release(Key::new(format!("{code:?}"))),
            },
            WindowEvent::RedrawRequested if is_primary => {
                let report = running.engine.tick();
                tracing::trace!(?report, "tick");
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("mirrorworld-desktop starting");

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(viewpoint) = cli.viewpoint {
        config.secondary.viewpoint = viewpoint;
    }

    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, cli.assets, event_loop.create_proxy());
    event_loop.run_app(&mut app)?;

    Ok(())
}
