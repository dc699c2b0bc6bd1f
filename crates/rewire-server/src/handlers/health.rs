//! `GET /status` (§6) — literal liveness line, no JSON envelope.

pub async fn status() -> &'static str {
    "rewire ok\n"
}
