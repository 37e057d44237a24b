use lib_common::core::KataBuffer;
use std::sync::Arc;

use crate::kata_logic::service::{KataService, UserService};

/// Shared by every handler behind an `Arc`.
pub struct AppState {
    pub katas: KataService,
    pub users: UserService,
    // Held separately from the service for health reporting.
    pub buffer: Arc<KataBuffer>,
}

impl AppState {
    pub fn new(katas: KataService, users: UserService, buffer: Arc<KataBuffer>) -> Arc<Self> {
        Arc::new(Self { katas, users, buffer })
    }
}
