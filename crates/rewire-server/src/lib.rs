//! rewire-server — the HTTP surface (§6): an axum router over
//! `rewire-core::Store`/`TrialManager`, plus the `main.rs` wiring that
//! constructs concrete adapters and spawns the `CheckerLoop`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
