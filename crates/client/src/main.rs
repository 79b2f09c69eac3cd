mod bot;
mod input;

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use bot::Bot;
use vanguard::lobby::LoadoutTrack;
use vanguard::{BalanceConfig, ClientSession, FixedTimestep, load_ron};

#[derive(Parser)]
#[command(name = "vanguard-client")]
#[command(about = "Headless Vanguard participant")]
struct Args {
    #[arg(short, long, default_value = "127.0.0.1", help = "Host address")]
    server: String,

    #[arg(short, long, default_value_t = vanguard::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value = "Guest")]
    name: String,

    #[arg(
        short,
        long,
        value_delimiter = ',',
        help = "Loadout tracks to upgrade, 0=melee 1=ranged 2=armor 3=support (e.g. 0,0,2)"
    )]
    upgrade: Vec<i32>,

    #[arg(short, long, default_value_t = vanguard::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(long, help = "Balance file matching the host's, for cooldown display")]
    balance: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let upgrades = args
        .upgrade
        .iter()
        .map(|&index| {
            LoadoutTrack::from_index(index)
                .ok_or_else(|| anyhow::anyhow!("unknown loadout track {}", index))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let balance = match &args.balance {
        Some(path) => load_ron::<BalanceConfig>(path)?,
        None => BalanceConfig::default(),
    };

    let mut client = ClientSession::connect((args.server.as_str(), args.port), args.name, balance)?;
    let mut bot = Bot::new(upgrades);
    let mut timestep = FixedTimestep::new(args.tick_rate);
    let mut last_phase = client.phase().name();
    let mut last_frame = Instant::now();

    while !client.is_finished() {
        let now = Instant::now();
        timestep.accumulate((now - last_frame).as_secs_f32());
        last_frame = now;

        while timestep.consume_tick() {
            bot.update(&mut client, timestep.dt());
            client.tick(timestep.dt());
        }

        let phase = client.phase().name();
        if phase != last_phase {
            log::info!("{} -> {}", last_phase, phase);
            last_phase = phase;
        }

        thread::sleep(Duration::from_millis(1));
    }

    if let Some(reason) = client.disconnect_reason() {
        log::info!("session over: {}", reason);
    }

    Ok(())
}
