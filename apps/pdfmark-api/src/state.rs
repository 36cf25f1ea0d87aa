//! Application state for the pdfmark API
//!
//! Every client session owns its own [`AnnotationSession`]; sessions never
//! share a document.

use pdfmark_core::{AnnotationSession, PageRasterizer};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;

pub type SharedSession = Arc<Mutex<AnnotationSession>>;

pub struct AppState {
    pub config: Config,
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
    rasterizer: Option<Arc<dyn PageRasterizer>>,
}

fn poisoned<T>(_: T) -> ApiError {
    ApiError::Internal("session lock poisoned".into())
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::SessionNotFound(id.to_string()))
}

impl AppState {
    pub fn new(config: Config, rasterizer: Option<Arc<dyn PageRasterizer>>) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
            rasterizer,
        }
    }

    /// State with the rasterizer the build supports
    pub fn from_config(config: Config) -> Self {
        let rasterizer = default_rasterizer(&config);
        Self::new(config, rasterizer)
    }

    pub fn rasterizer(&self) -> Result<Arc<dyn PageRasterizer>, ApiError> {
        self.rasterizer.clone().ok_or(ApiError::RenderUnavailable)
    }

    pub fn create_session(&self) -> Result<Uuid, ApiError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        if sessions.len() >= self.config.max_sessions {
            return Err(ApiError::TooManySessions(self.config.max_sessions));
        }
        let id = Uuid::new_v4();
        sessions.insert(id, Arc::new(Mutex::new(AnnotationSession::new())));
        tracing::info!("Created session: {}", id);
        Ok(id)
    }

    pub fn session(&self, id: &str) -> Result<SharedSession, ApiError> {
        let key = parse_id(id)?;
        self.sessions
            .read()
            .map_err(poisoned)?
            .get(&key)
            .cloned()
            .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))
    }

    pub fn remove_session(&self, id: &str) -> Result<(), ApiError> {
        let key = parse_id(id)?;
        let removed = self.sessions.write().map_err(poisoned)?.remove(&key);
        match removed {
            Some(_) => {
                tracing::info!("Removed session: {}", id);
                Ok(())
            }
            None => Err(ApiError::SessionNotFound(id.to_string())),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Run `f` against one session on the blocking pool. PDF parsing and
    /// serialization are CPU-bound, so they stay off the async workers.
    pub async fn with_session<T, F>(&self, id: &str, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut AnnotationSession) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let session = self.session(id)?;
        tokio::task::spawn_blocking(move || {
            let mut guard = session.lock().map_err(poisoned)?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    }
}

#[cfg(feature = "pdfium")]
fn default_rasterizer(config: &Config) -> Option<Arc<dyn PageRasterizer>> {
    use pdfmark_core::PdfiumRasterizer;

    let rasterizer = match &config.pdfium_library {
        Some(dir) => PdfiumRasterizer::from_dir(dir),
        None => PdfiumRasterizer::system(),
    };
    Some(Arc::new(rasterizer))
}

#[cfg(not(feature = "pdfium"))]
fn default_rasterizer(config: &Config) -> Option<Arc<dyn PageRasterizer>> {
    if config.pdfium_library.is_some() {
        tracing::warn!("Pdfium library path set but built without the pdfium feature");
    }
    None
}
