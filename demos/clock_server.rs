// ABOUTME: Demo clock server hosting a single game
// ABOUTME: Starts the first side's clock and optionally presses the clock on a fixed cadence

use clap::Parser;
use duelclock::protocol::server::game_url;
use duelclock::registry::GameRegistry;
use duelclock::{AuthorityConfig, Side, TimeControl};
use std::sync::Arc;
use std::time::Duration;

/// Clock authority server
#[derive(Parser, Debug)]
#[command(name = "clock_server")]
#[command(about = "Host a two-sided game clock over WebSocket", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8927")]
    bind: String,

    /// Time control preset, e.g. "Blitz 3+0"
    #[arg(short, long)]
    mode: Option<String>,

    /// Press the clock every N seconds to simulate moves
    #[arg(long)]
    autoplay: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let mut config = AuthorityConfig::from_env()?;
    if let Some(mode) = &args.mode {
        config.time_control = TimeControl::find(mode)?;
    }

    let registry = Arc::new(GameRegistry::new());
    let (game, _task) = registry.create(&config);
    let server = duelclock::protocol::ClockServer::bind(&args.bind, Arc::clone(&registry)).await?;

    println!("Time control: {}", config.time_control.name);
    println!("Watch with: {}", game_url(server.local_addr()?, game.id()));

    game.start(Side::First).await?;

    if let Some(secs) = args.autoplay {
        let game = game.clone();
        tokio::spawn(async move {
            let mut moves = tokio::time::interval(Duration::from_secs(secs));
            moves.tick().await;
            loop {
                moves.tick().await;
                let Ok(snapshot) = game.snapshot().await else { break };
                let Some(side) = snapshot.running_side() else { break };
                if let Err(e) = game.press(side, None).await {
                    println!("Game over: {e}");
                    break;
                }
            }
        });
    }

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            registry.close(&game.id()).await?;
            println!("Game closed");
        }
    }

    Ok(())
}
