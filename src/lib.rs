//! Signaling service for one-to-many live broadcasts.
//!
//! Sessions join named rooms as broadcaster or viewer, discover each other
//! through `watcher` / `broadcaster` announcements, and exchange opaque
//! offer/answer/candidate payloads through an addressed relay. Rooms also keep
//! a short chat history and fan out reactions and bitrate requests.

pub mod config;
pub mod error;
pub mod history;
pub mod hub;
pub mod protocol;
pub mod routes;
pub mod state;
