//! Gateway: HTTP + WebSocket server for the chat backend.
//!
//! Lifecycle:
//! 1. Load config, build the token keys and session authenticator
//! 2. Wire the store, blob store, mailer and domain services
//! 3. Start the HTTP server (REST routes, health, static uploads)
//! 4. Attach the WebSocket upgrade handler
//!
//! Connections authenticate with the same access tokens as the REST
//! surface. Each connection joins its identity room at handshake and
//! chat rooms on request; the domain services push events through the
//! room registry's broadcast primitive.

pub mod error;
pub mod events;
pub mod extract;
pub mod rooms;
pub mod routes;
pub mod server;
pub mod state;
pub mod ws;
