use clap::Parser;
use client::game::Outcome;
use client::network::{BoxError, Client};
use log::{info, warn};
use shared::{ServerMessage, DEFAULT_HOST, DEFAULT_PORT};
use std::time::Duration;

/// Plays one scripted game: asks for the solution, marks every mine,
/// reveals every other cell and submits the marks.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("ws://{}:{}", DEFAULT_HOST, DEFAULT_PORT))]
    server: String,

    /// Board rows
    #[arg(short = 'r', long, default_value = "10")]
    rows: usize,

    /// Board columns
    #[arg(short = 'c', long, default_value = "10")]
    columns: usize,

    /// Number of mines
    #[arg(short = 'm', long, default_value = "15")]
    mines: usize,

    /// Milliseconds to wait for each reply
    #[arg(short = 't', long, default_value = "5000")]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let mut client = Client::connect(&args.server).await?;
    client.set_reply_timeout(Duration::from_millis(args.timeout));
    let session_id = client.start_game(args.rows, args.columns, args.mines).await?;
    info!("Playing session {}", session_id);

    let mines = client.solve().await?;
    for &mine in &mines {
        client.game_mut().toggle_mark(mine);
    }
    info!("Marked {} mines", mines.len());

    for x in 0..args.rows {
        for y in 0..args.columns {
            if !client.game().can_reveal((x, y)) {
                continue;
            }
            if let ServerMessage::GameOver { message } = client.reveal((x, y)).await? {
                warn!("Revealed a mine at ({}, {}): {}", x, y, message);
            }
        }
    }
    info!("Revealed {} cells", client.game().revealed_count());

    client.verify_marks().await?;
    match client.game().outcome() {
        Some(Outcome::Won) => info!("Won: {}", client.game().last_notice().unwrap_or_default()),
        Some(Outcome::Lost) => warn!("Lost the game"),
        None => warn!(
            "Marks rejected: {}",
            client.game().last_notice().unwrap_or_default()
        ),
    }

    client.close().await
}
