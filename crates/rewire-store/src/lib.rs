//! rewire-store — SQLite adapter implementing `rewire_core::Store`.
//!
//! `db_path` (§6 configuration) names a single SQLite file; WAL mode is
//! enabled so the checker's reads and the HTTP surface's writes don't
//! contend (§4.B, §5). All SQL is runtime-checked (`sqlx::query`, not
//! `sqlx::query!`), matching the teacher's own preference for a
//! build that doesn't require a live database connection.

pub mod schema;
pub mod store;

pub use store::SqliteStore;
