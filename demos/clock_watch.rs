// ABOUTME: Demo observer rendering both clocks in the terminal
// ABOUTME: Connects to a game, reconciles snapshots locally and redraws at a fixed frame rate

use clap::Parser;
use duelclock::protocol::ProtocolClient;
use duelclock::scheduler::run_render_loop;
use duelclock::{ClockReconciler, DisplaySink, Side, SnapshotInbox, SystemClock};
use std::io::Write;
use std::time::Duration;
use tokio::sync::oneshot;

/// Terminal clock observer
#[derive(Parser, Debug)]
#[command(name = "clock_watch")]
#[command(about = "Watch a game clock served by clock_server", long_about = None)]
struct Args {
    /// Game URL printed by clock_server
    url: String,

    /// Milliseconds between redraws
    #[arg(short, long, default_value_t = 50)]
    frame_ms: u64,
}

/// Redraws a single status line
#[derive(Default)]
struct TerminalSink {
    first: String,
    second: String,
}

impl DisplaySink for TerminalSink {
    fn show(&mut self, side: Side, text: &str) {
        match side {
            Side::First => self.first = text.to_string(),
            Side::Second => self.second = text.to_string(),
        }
        print!("\rfirst {:>8} | second {:>8}", self.first, self.second);
        let _ = std::io::stdout().flush();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let inbox = SnapshotInbox::new();
    let client = ProtocolClient::connect(&args.url, inbox.clone()).await?;
    let mut reconciler = ClockReconciler::new(SystemClock, TerminalSink::default());

    let (cancel, cancelled) = oneshot::channel();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = cancel.send(());
    });

    run_render_loop(
        &mut reconciler,
        &inbox,
        Duration::from_millis(args.frame_ms),
        cancelled,
    )
    .await;

    println!();
    client.close().await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    Ok(())
}
