//! Flypast CLI - play, render and inspect the onboarding intro

use clap::{Parser, Subcommand};
use flypast::{
    AudioEngine, ContextFactory, DeviceContextFactory, FlypastConfig, OnboardingFlow, Phase,
    PhaseObserver, RenderConfig, SequenceController, SequenceRenderer, StartOutcome,
    UnsupportedContextFactory,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::Level;

#[derive(Parser)]
#[command(name = "flypast")]
#[command(about = "Procedurally synthesized onboarding intro", long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/flypast/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the intro on the default output device
    Play {
        /// Run the visuals only, without opening the audio device
        #[arg(long)]
        silent: bool,
    },

    /// Render the intro to a stereo WAV file
    Render {
        /// Output WAV file path
        output: PathBuf,

        /// Sample rate (overrides the config file)
        #[arg(short, long)]
        sample_rate: Option<u32>,

        /// Master gain 0.0-1.0 (overrides the config file)
        #[arg(short, long)]
        gain: Option<f32>,

        /// Keep rendering until every voice has decayed
        #[arg(long)]
        tail: bool,
    },

    /// Print the timeline table
    Timeline,

    /// Print the effective configuration as TOML
    Config,
}

/// Prints each phase with a small banner
struct TerminalObserver {
    started: Instant,
}

impl TerminalObserver {
    fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    fn stamp(&self) -> String {
        format!("[{:>5.2}s]", self.started.elapsed().as_secs_f64())
    }
}

impl PhaseObserver for TerminalObserver {
    fn on_phase_change(&mut self, phase: Phase) {
        let banner = match phase {
            Phase::Approaching => "  >>---->   incoming...",
            Phase::InFlight => "       ====>---  capsule away",
            Phase::Impact => "  *** IMPACT ***",
            Phase::Idle | Phase::Complete => return,
        };
        println!("{} {}", self.stamp(), banner);
    }

    fn on_complete(&mut self) {
        println!("{} Welcome aboard.", self.stamp());
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = FlypastConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Play { silent } => {
            let timeline = config.timeline()?;
            let factory: Box<dyn ContextFactory> = if silent || !config.audio.enabled {
                Box::new(UnsupportedContextFactory::new("audio disabled"))
            } else {
                Box::new(DeviceContextFactory::new(config.audio.master_gain))
            };

            let controller =
                SequenceController::new(AudioEngine::new(factory), timeline, TerminalObserver::new());

            if controller.start() == StartOutcome::Silent {
                println!("(no audio output, playing silently)");
            }

            tokio::select! {
                _ = controller.wait_until_complete() => {}
                _ = tokio::signal::ctrl_c() => {
                    controller.cancel();
                    println!("Intro skipped.");
                }
            }

            let mut flow = OnboardingFlow::new();
            if controller.is_complete() {
                flow.intro_complete();
            }
            println!("Next stage: {}", flow.stage());
        }

        Commands::Render {
            output,
            sample_rate,
            gain,
            tail,
        } => {
            let timeline = config.timeline()?;
            let mut render_config = RenderConfig::from_config(&config);
            if let Some(sr) = sample_rate {
                render_config.sample_rate = sr;
            }
            if let Some(g) = gain {
                render_config.master_gain = g.clamp(0.0, 1.0);
            }
            render_config.include_tail = tail;

            println!("Rendering intro to {}", output.display());
            println!("  Sample rate: {} Hz", render_config.sample_rate);
            println!("  Master gain: {:.2}", render_config.master_gain);
            println!();

            let stats = SequenceRenderer::new(render_config).render_to_file(&timeline, &output)?;
            stats.print_summary();
            println!("\nRender complete: {}", output.display());
        }

        Commands::Timeline => {
            print!("{}", config.timeline()?);
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
