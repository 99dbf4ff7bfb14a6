mod script;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mirrorworld_character::{CharacterError, CharacterLoader, CharacterParts, FsLoader, MemoryLoader};
use mirrorworld_common::{SurfaceSize, ViewRole};
use mirrorworld_engine::{Engine, EngineConfig, EngineHost, LoadState, TickReport};
use mirrorworld_input::ControlsSender;
use mirrorworld_render::{Clock, FixedClock, HeadlessSurface};
use script::{Action, Script};
use std::path::PathBuf;
use std::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mirrorworld-cli", about = "Headless mirrorworld runner")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Engine config file (YAML); built-in defaults otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the effective engine config as YAML
    Config,
    /// Run the engine headless for a number of ticks
    Run {
        /// Number of ticks to run
        #[arg(short, long, default_value = "120")]
        ticks: u64,
        /// Input script applied while running
        #[arg(short, long)]
        script: Option<PathBuf>,
        /// Simulated milliseconds per tick
        #[arg(long, default_value = "16.667")]
        step_ms: f32,
        /// Load character models from this directory instead of placeholders
        #[arg(long)]
        assets: Option<PathBuf>,
        /// Primary view size
        #[arg(long, default_value = "1280x720", value_parser = script::parse_size)]
        primary: SurfaceSize,
        /// Overview size
        #[arg(long, default_value = "640x480", value_parser = script::parse_size)]
        secondary: SurfaceSize,
        /// Print both scenes after the run
        #[arg(long)]
        dump: bool,
    },
}

struct RunOptions {
    ticks: u64,
    step: f32,
    primary: SurfaceSize,
    secondary: SurfaceSize,
}

/// Where each tick's rig outcomes land until the loop picks them up.
type Completions = mpsc::Receiver<(ViewRole, Result<CharacterParts, CharacterError>)>;

fn build_engine(
    config: EngineConfig,
    options: &RunOptions,
    loader: &dyn CharacterLoader,
) -> Result<(Engine, ControlsSender, Completions)> {
    let step = options.step;
    let host = EngineHost::new(
        Box::new(HeadlessSurface::new(options.primary)),
        Box::new(HeadlessSurface::new(options.secondary)),
    )
    .with_clocks(Box::new(move || Box::new(FixedClock::new(step)) as Box<dyn Clock>));
    let mut engine = Engine::new(config, host);
    let controls = engine.enable_controls();

    let (tx, rx) = mpsc::channel();
    for role in ViewRole::ALL {
        let tx = tx.clone();
        engine.create_character_rig(role, loader, move |role, outcome| {
            let _ = tx.send((role, outcome));
        })?;
    }
    Ok((engine, controls, rx))
}

fn deliver(engine: &mut Engine, completions: &Completions) {
    while let Ok((role, outcome)) = completions.try_recv() {
        match engine.complete_rig_load(role, outcome) {
            Ok(node) => tracing::info!(%role, node = %node.short(), "character attached"),
            Err(e) => tracing::warn!(%role, "character not attached: {e}"),
        }
    }
}

fn apply(engine: &mut Engine, controls: &ControlsSender, action: &Action) {
    match action {
        Action::Press(key) => controls.press(key.clone()),
        Action::Release(key) => controls.release(key.clone()),
        Action::ReleaseAll => controls.release_all(),
        Action::Resize(ViewRole::Primary, size) => engine.resize_primary(*size),
        Action::Resize(ViewRole::Secondary, size) => engine.resize_secondary(*size),
    }
}

/// Totals over a run.
#[derive(Debug, Default, PartialEq, Eq)]
struct RunSummary {
    ticks: u64,
    key_events: usize,
    moving: u64,
    directed: u64,
    rendered_primary: u64,
    rendered_secondary: u64,
}

impl RunSummary {
    fn add(&mut self, report: &TickReport) {
        self.ticks = report.tick;
        self.key_events += report.key_events;
        self.moving += u64::from(report.moving);
        self.directed += u64::from(report.directed);
        self.rendered_primary += u64::from(report.rendered_primary);
        self.rendered_secondary += u64::from(report.rendered_secondary);
    }
}

fn run(
    engine: &mut Engine,
    controls: &ControlsSender,
    completions: &Completions,
    script: &Script,
    ticks: u64,
) -> RunSummary {
    let mut summary = RunSummary::default();
    for tick in 1..=ticks {
        deliver(engine, completions);
        for event in script.at(tick) {
            apply(engine, controls, &event.action);
        }
        let report = engine.tick();
        tracing::debug!(?report, "tick");
        summary.add(&report);
    }
    summary
}

fn print_results(engine: &Engine, summary: &RunSummary, dump: bool) {
    println!(
        "ticks={} key_events={} moving={} directed={} rendered: primary={} overview={}",
        summary.ticks,
        summary.key_events,
        summary.moving,
        summary.directed,
        summary.rendered_primary,
        summary.rendered_secondary
    );
    for role in ViewRole::ALL {
        let view = engine.view(role);
        let camera = view.camera();
        let rig = match engine.rig(role).map(|r| r.state()) {
            Some(LoadState::Attached(_)) => "attached",
            Some(LoadState::Pending) => "pending",
            Some(LoadState::Failed) => "failed",
            None => "none",
        };
        println!(
            "{role}: rig={rig} camera={:?} -> {:?} surface={}",
            camera.position(),
            camera.target(),
            view.surface().size()
        );
        if let Some(root) = engine.rig(role).and_then(|r| r.root_position()) {
            println!("{role}: character at {root:?}");
        }
    }
    println!("stats: {}", engine.stats().borrow().summary());

    if dump {
        for role in ViewRole::ALL {
            println!("--- {role} ---");
            println!("{}", engine.view(role).debug_text());
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("mirrorworld-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", mirrorworld_render::crate_info());
            println!("input: {}", mirrorworld_input::crate_info());
            println!("character: {}", mirrorworld_character::crate_info());
            println!("engine: {}", mirrorworld_engine::crate_info());
            println!("tools: {}", mirrorworld_tools::crate_info());
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
        Commands::Run {
            ticks,
            script,
            step_ms,
            assets,
            primary,
            secondary,
            dump,
        } => {
            let script = match &script {
                Some(path) => Script::load(path)?,
                None => Script::default(),
            };
            let options = RunOptions {
                ticks,
                step: step_ms / 1000.0,
                primary,
                secondary,
            };
            let loader: Box<dyn CharacterLoader> = match assets {
                Some(root) => Box::new(FsLoader::new(root)),
                None => Box::new(MemoryLoader::placeholder(&config.rig.character)),
            };
            println!(
                "Headless run: ticks={}, step={step_ms}ms, script events={}",
                options.ticks,
                script.len()
            );

            let (mut engine, controls, completions) = build_engine(config, &options, loader.as_ref())?;
            let summary = run(&mut engine, &controls, &completions, &script, options.ticks);
            print_results(&engine, &summary, dump);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(ticks: u64) -> RunOptions {
        RunOptions {
            ticks,
            step: 1.0 / 60.0,
            primary: SurfaceSize::new(800, 600),
            secondary: SurfaceSize::new(400, 300),
        }
    }

    fn start(loader: &dyn CharacterLoader) -> (Engine, ControlsSender, Completions) {
        build_engine(EngineConfig::default(), &options(0), loader).unwrap()
    }

    #[test]
    fn scripted_walk_moves_both_cameras() {
        let config = EngineConfig::default();
        let loader = MemoryLoader::placeholder(&config.rig.character);
        let (mut engine, controls, completions) = start(&loader);
        let script = Script::parse("1 press KeyW\n31 release KeyW\n").unwrap();

        let secondary_before = engine.view(ViewRole::Secondary).camera().target();
        let summary = run(&mut engine, &controls, &completions, &script, 40);

        assert_eq!(summary.ticks, 40);
        assert_eq!(summary.key_events, 2);
        assert_eq!(summary.moving, 30);
        assert_eq!(summary.directed, 30);
        assert_eq!(summary.rendered_primary, 40);
        assert!(engine.rig(ViewRole::Primary).unwrap().is_attached());
        assert_ne!(engine.view(ViewRole::Secondary).camera().target(), secondary_before);
    }

    #[test]
    fn failed_load_keeps_running() {
        let loader = MemoryLoader::failing("no such model");
        let (mut engine, controls, completions) = start(&loader);
        let script = Script::parse("1 press KeyW\n").unwrap();

        let summary = run(&mut engine, &controls, &completions, &script, 10);
        assert_eq!(summary.directed, 0);
        assert_eq!(summary.rendered_secondary, 10);
        assert_eq!(engine.rig(ViewRole::Primary).unwrap().state(), LoadState::Failed);
    }

    #[test]
    fn scripted_resize_reaches_the_surface() {
        let loader = MemoryLoader::failing("unused");
        let (mut engine, controls, completions) = start(&loader);
        let script = Script::parse("2 resize secondary 320x200\n").unwrap();

        run(&mut engine, &controls, &completions, &script, 3);
        assert_eq!(
            engine.view(ViewRole::Secondary).surface().size(),
            SurfaceSize::new(320, 200)
        );
    }
}
