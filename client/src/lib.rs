//! # Minesweeper Client Library
//!
//! Headless client for the Minesweeper server. It speaks the JSON protocol
//! over a WebSocket and keeps a local view of the game, including the marks,
//! which only ever live on the client.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Client-side game view:
//! - Cells the server has revealed so far
//! - Mark toggling and the remaining-mines counter
//! - Outcome tracking once the game is lost or won
//!
//! ### Network Module (`network`)
//! Connection handling:
//! - WebSocket connect and close
//! - Request/reply helpers for every protocol message
//! - Every received message is folded into the game view
//!
//! A presentation layer drives [`network::Client`] and redraws from
//! [`game::ClientGameState`].
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), client::network::BoxError> {
//!     let mut client = Client::connect("ws://127.0.0.1:8766").await?;
//!     client.start_game(10, 10, 15).await?;
//!     client.reveal((0, 0)).await?;
//!     client.game_mut().toggle_mark((1, 1));
//!     client.verify_marks().await?;
//!     client.close().await
//! }
//! ```

pub mod game;
pub mod network;
