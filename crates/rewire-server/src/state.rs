//! Shared state injected into every handler via `Extension`.

use std::sync::Arc;

use rewire_core::clock::Clock;
use rewire_core::ports::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
}
