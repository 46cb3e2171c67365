//! Streams a character into an in-memory tree at 60 Hz and logs the waits
//! that resolve against it.
//!
//! Run with `RUST_LOG=debug` to see every wait start and finish.
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Context;
use async_executor::{LocalExecutor, Task};
use clap::Parser;
use demo::character::{self, FRAME, Rig};
use treewait::prelude::*;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Path to a JSON wait config, like `{"default_timeout_secs": 10}`.
    /// Falls back to the `TREEWAIT_CONFIG` environment variable.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Frames to run before the character is destroyed.
    #[clap(long, default_value = "120")]
    frames: u64,
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<WaitConfig> {
    let Some(path) = path.or_else(|| std::env::var_os("TREEWAIT_CONFIG").map(PathBuf::from))
    else {
        return Ok(WaitConfig::default());
    };
    log::info!("loading wait config from '{}'", path.display());
    WaitConfig::load(&path).with_context(|| format!("could not load '{}'", path.display()))
}

fn report<T: std::fmt::Debug>(name: &str, task: Task<Result<T, WaitError>>) {
    if !task.is_finished() {
        log::warn!("{name}: still waiting");
        return;
    }
    match futures_lite::future::block_on(task) {
        Ok(value) => log::info!("{name}: {value:?}"),
        Err(e) => log::warn!("{name}: {e}"),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    log::info!("default timeout is {:?}", config.default_timeout);

    let scheduler = Scheduler::new();
    let waiter = Waiter::with_config(scheduler.clone(), config);
    let rig = Rig::new()?;

    let executor = LocalExecutor::new();
    let assembled = executor.spawn({
        let waiter = waiter.clone();
        let model = rig.model.clone();
        async move { character::assemble(&waiter, &model).await }
    });
    // Nobody ever brings a hat.
    let hat = executor.spawn({
        let waiter = waiter.clone();
        let model = rig.model.clone();
        async move { waiter.child(&model, "Hat", true, None).await }
    });

    let mut last_frame = Instant::now();
    for frame in 1..=cli.frames {
        std::thread::sleep(FRAME.saturating_sub(last_frame.elapsed()));
        rig.stream_in(frame)?;
        if frame == cli.frames {
            log::info!("frame {frame}: destroying the character");
            rig.model.destroy();
        }
        let dt: Duration = last_frame.elapsed();
        last_frame = Instant::now();
        scheduler.step(dt);
        while executor.try_tick() {}
    }
    log::info!("ran {} frames, {:?} simulated", scheduler.frame(), scheduler.now());

    report("assemble", assembled);
    report("hat", hat);
    Ok(())
}
