//! # Minesweeper Server Library
//!
//! This library provides the authoritative server for networked Minesweeper.
//! It owns every board, answers each request from the client that sent it,
//! and keeps concurrently running games fully isolated from one another.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Boards
//! Mine positions and cell numbers only ever exist on the server. Clients
//! learn a cell's value by revealing it and learn the full layout by asking
//! for the solution.
//!
//! ### Caller-Held Marks
//! The server never stores flags. A client submits its whole mark set when it
//! wants it checked, and the server compares that set against the real mines.
//!
//! ### Session Lifecycle
//! - Creation on `start_game`, with an identifier that is never reused
//! - Replacement when the same connection starts another game
//! - Removal when the owning connection closes or the session sits idle
//!
//! ## Module Organization
//!
//! ### Board Module (`board`)
//! Pure minefield generation and adjacency counting.
//!
//! ### Session Module (`session`)
//! One game's state machine: `Active`, then `Lost` or `Won` for good.
//!
//! ### Session Manager Module (`session_manager`)
//! The session table and per-message dispatch.
//!
//! ### Network Module (`network`)
//! WebSocket accept loop, one task per connection, JSON text frames.
//!
//! ## Concurrency
//!
//! Every connection runs in its own task. Requests only ever touch one
//! session, and each session sits behind its own lock, so games proceed in
//! parallel while requests within one game are applied in order.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut server = Server::new("127.0.0.1:8766", ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod board;
pub mod config;
pub mod error;
pub mod network;
pub mod session;
pub mod session_manager;
