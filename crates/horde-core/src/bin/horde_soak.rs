//! Headless soak run of the population engine.
//!
//! Spawns a ring of enemies around a player walking in a circle, hits them
//! with a periodic area attack and reports the population counters and state
//! hash at the end. Set `RUST_LOG=horde_core=debug` for per-tick detail.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use tracing::info;
use tracing_subscriber::EnvFilter;

use horde_core::horde_grid::{Circle, Rect};
use horde_core::{DamageRequest, Frustum, Horde, HordeConfig, SpawnKind, SpawnRequest};

const DT: f32 = 1.0 / 60.0;
const TICKS_PER_WAVE: u64 = 60;
const ATTACK_EVERY: u64 = 30;
const VIEW: Vec2 = Vec2::new(1280.0, 720.0);

/// Headless soak test for the spawn population engine
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 3600)]
    ticks: u64,

    /// Seed for loot rolls
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Enemies per spawn wave
    #[arg(short, long, default_value_t = 24)]
    wave: usize,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<HordeConfig> {
    let Some(path) = path else {
        return Ok(HordeConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    HordeConfig::from_json(&json).with_context(|| format!("loading config {}", path.display()))
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = load_config(args.config.as_ref())?;
    let mut horde = Horde::new(config, args.seed)?;

    let mut accepted = 0usize;
    let mut rejected = 0usize;
    let mut kills = 0usize;
    for tick in 0..args.ticks {
        let t = tick as f32 * DT;
        let player = Vec2::new(t.cos(), t.sin()) * 400.0;
        let camera = Frustum::new(Rect::from_center_size(player, VIEW));

        if tick % TICKS_PER_WAVE == 0 {
            let wave = (tick / TICKS_PER_WAVE) as usize;
            let radius = VIEW.length() * 0.5 + 64.0;
            for i in 0..args.wave {
                let turn = i as f32 / args.wave as f32 + wave as f32 * 0.13;
                let angle = turn * std::f32::consts::TAU;
                let position = player + Vec2::new(angle.cos(), angle.sin()) * radius;
                let kind = SpawnKind::ALL[(i + wave) % SpawnKind::ALL.len()];
                let request = SpawnRequest::new(kind, position).with_level(1 + (wave as u32 / 4));
                match horde.spawn(&request, &camera) {
                    Ok(_) => accepted += 1,
                    Err(_) => rejected += 1,
                }
            }
        }
        if tick % ATTACK_EVERY == 0 {
            horde.submit_damage(DamageRequest::new(Circle::new(player, 220.0), 30.0));
        }

        let report = horde.tick(player, &camera, DT);
        kills += report.kills;
    }

    let hash = horde.state_hash();
    let stats = horde.teardown();
    info!(
        ticks = args.ticks,
        accepted,
        rejected,
        kills,
        live = stats.live,
        dying = stats.dying,
        removed_total = stats.removed_total,
        hash = format_args!("{hash:016x}"),
        "soak finished"
    );
    Ok(())
}
