mod config;
mod server;
mod tui;

use std::io;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use config::ServerConfig;
use server::GameServer;
use tui::TuiState;
use vanguard::PacketLossSimulation;
use vanguard::lobby::{LoadoutTrack, LobbyAction};

#[derive(Parser)]
#[command(name = "vanguard-server")]
#[command(about = "Vanguard co-op host")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = vanguard::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value = "Host", help = "Display name of the host's player")]
    name: String,

    #[arg(short, long, default_value_t = vanguard::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(long)]
    headless: bool,

    #[arg(long, help = "Level description (RON)")]
    level: Option<PathBuf>,

    #[arg(long, help = "Balance overrides (RON)")]
    balance: Option<PathBuf>,

    #[arg(long, default_value_t = 0, help = "Seed for the match RNG")]
    seed: u64,

    #[arg(long, help = "Enable outbound packet loss simulation")]
    simulate_packet_loss: bool,

    #[arg(long, default_value_t = 0.0, help = "Packet loss percentage (0-100)")]
    loss_percent: f32,

    #[arg(long, help = "Ready the host once every guest is ready")]
    auto_ready: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let mut config = ServerConfig::new(format!("{}:{}", args.bind, args.port), args.name);
    config.tick_rate = args.tick_rate;
    config.host.seed = args.seed;
    config.auto_ready = args.auto_ready || args.headless;
    config.load_overrides(args.level.as_ref(), args.balance.as_ref())?;
    if args.simulate_packet_loss {
        config.packet_loss = Some(PacketLossSimulation::with_loss(args.loss_percent));
    }

    let mut server = GameServer::new(config)?;

    if args.headless {
        log::info!("Server started on {}", server.local_addr());
        server.run();
        log::info!("Server shutting down");
    } else {
        run_with_tui(&mut server)?;
    }

    Ok(())
}

fn run_with_tui(server: &mut GameServer) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let running = server.running();
    let mut tui_state = TuiState::new();

    tui_state.log_info(format!("Server started on {}", server.local_addr()));

    while running.load(Ordering::SeqCst) && !server.is_finished() {
        server.tick_once();

        for event in server.drain_events() {
            if event.is_milestone() {
                tui_state.log_warn(event.to_string());
            } else {
                tui_state.log_info(event.to_string());
            }
        }

        if event::poll(Duration::from_millis(1))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => {
                            running.store(false, Ordering::SeqCst);
                        }
                        KeyCode::Char('r') => {
                            server.local_action(LobbyAction::ToggleReady);
                        }
                        KeyCode::Char('s') => {
                            server.cycle_local_slot();
                        }
                        KeyCode::Char(c @ '1'..='4') => {
                            let index = c as i32 - '1' as i32;
                            if let Some(track) = LoadoutTrack::from_index(index) {
                                server.local_action(LobbyAction::Upgrade(track));
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        let stats = server.stats();
        terminal.draw(|frame| {
            tui::render(frame, &tui_state, &stats);
        })?;
    }

    tui_state.log_info("Shutting down...");
    server.shutdown();

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}
