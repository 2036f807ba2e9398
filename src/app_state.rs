use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use crate::{backend::RagBackend, config::AppConfig, playground::{Playground, SharedPlayground}};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub playground: SharedPlayground,
    pub backend: Arc<dyn RagBackend>,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        backend: Arc<dyn RagBackend>,
        shutdown_sender: Option<oneshot::Sender<()>>,
    ) -> Self {
        Self {
            config,
            playground: Arc::new(Mutex::new(Playground::new())),
            backend,
            shutdown_sender: Arc::new(Mutex::new(shutdown_sender)),
        }
    }
}
