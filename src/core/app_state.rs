use std::sync::Arc;

use crate::{core::config::AuthConfig, engine::OrderEngine, media::MediaGate, store::Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub media: MediaGate,
    pub auth: AuthConfig,
    /// Request body ceiling for multipart uploads.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn orders(&self) -> OrderEngine<'_> {
        OrderEngine::new(self.store.as_ref(), &self.media)
    }
}
