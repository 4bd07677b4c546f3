// ABOUTME: Clock sync protocol for duelclock
// ABOUTME: Message types, JSON codec, WebSocket server and client

/// WebSocket client implementation
pub mod client;
/// JSON encoding and validating decoding
pub mod codec;
/// Protocol message type definitions and serialization
pub mod messages;
/// WebSocket fan-out server
pub mod server;

pub use client::ProtocolClient;
pub use codec::{decode, decode_sync, encode};
pub use messages::Message;
pub use server::ClockServer;
