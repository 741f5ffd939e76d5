use anyhow::Result;
use clap::Parser;
use kinesis_core::config::SimConfig;
use kinesis_lib::app::{App, AppOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Mode to run the simulation in
    #[arg(short, long, value_enum, default_value = "headless")]
    mode: Mode,

    /// Custom config file path
    #[arg(short, long, default_value = "kinesis.toml")]
    config: PathBuf,

    /// Stop after this many generations (headless only)
    #[arg(short, long)]
    generations: Option<u64>,

    /// Override the RNG seed from the config
    #[arg(long)]
    seed: Option<u64>,

    /// Checkpoint to resume from and save to
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Directory for the generation history log
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Port for the HTTP and WebSocket server (serve only)
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum Mode {
    Headless,
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    kinesis_core::init_logging("kinesis=info");
    let args = Args::parse();

    let mut config = SimConfig::load(&args.config)?;
    if args.seed.is_some() {
        config.world.seed = args.seed;
    }
    let options = AppOptions {
        checkpoint: args.checkpoint,
        log_dir: args.log_dir,
    };
    let app = App::new(config, options)?;

    match args.mode {
        Mode::Headless => {
            let running = app.running();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Shutdown requested");
                    running.store(false, std::sync::atomic::Ordering::Relaxed);
                }
            });
            let generations = args.generations;
            let mut app = app;
            tokio::task::spawn_blocking(move || app.run_headless(generations)).await??;
        }
        Mode::Serve => kinesis_lib::server::serve(app, args.port).await?,
    }
    Ok(())
}
