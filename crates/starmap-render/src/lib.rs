//! Bridge between catalog snapshots and the external rendering surface.
//!
//! The renderer is a black box: it accepts one catalog payload plus an
//! optional camera focus, and reports back how many systems it rendered and
//! whether the focus was honored. Re-rendering a live surface leaks stale
//! renderer state across imports, so the bridge discards the previous
//! surface and asks its factory for a fresh one on every render; the
//! monotonically increasing session id it passes along is the
//! cache-busting token.
//!
//! The acknowledgement wait is unbounded by default. `with_ack_timeout`
//! opts into a bounded wait that fails with `RenderError::AckTimeout`
//! instead of hanging on a surface that never reports.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use starmap_catalog::CatalogSnapshot;
use std::path::PathBuf;
use std::time::Duration;

/// What crosses into the renderer: the snapshot body plus the focus triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPayload {
    #[serde(flatten)]
    pub snapshot: CatalogSnapshot,
    pub focus: Option<[f64; 3]>,
}

/// The renderer's report after accepting a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderAck {
    pub rendered_systems: usize,
    pub centered: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render surface failed: {0}")]
    Surface(String),
    #[error("renderer did not acknowledge within {0:?}")]
    AckTimeout(Duration),
    #[error("failed to write payload: {0}")]
    Io(#[from] std::io::Error),
}

/// One renderer instance. `bootstrap` delivers the payload once the
/// surface is ready and resolves with its acknowledgement.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    async fn bootstrap(&self, payload: &RenderPayload) -> Result<RenderAck, RenderError>;
}

/// Creates a fresh surface per render session.
pub trait SurfaceFactory: Send + Sync {
    fn create(&self, session: u64) -> Box<dyn RenderSurface>;
}

impl<F> SurfaceFactory for F
where
    F: Fn(u64) -> Box<dyn RenderSurface> + Send + Sync,
{
    fn create(&self, session: u64) -> Box<dyn RenderSurface> {
        self(session)
    }
}

/// Owns the current render session and the fresh-surface policy.
pub struct RenderBridge {
    factory: Box<dyn SurfaceFactory>,
    session: u64,
    ack_timeout: Option<Duration>,
    current: Option<Box<dyn RenderSurface>>,
}

impl RenderBridge {
    pub fn new(factory: Box<dyn SurfaceFactory>) -> Self {
        Self {
            factory,
            session: 0,
            ack_timeout: None,
            current: None,
        }
    }

    /// Bound the acknowledgement wait. The default is unbounded.
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = Some(timeout);
        self
    }

    /// Id of the most recent session, 0 before the first render.
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Discard the previous surface, start a fresh session and deliver the
    /// payload. Resolves with the renderer's acknowledgement.
    pub async fn render(
        &mut self,
        snapshot: CatalogSnapshot,
        focus: Option<[f64; 3]>,
    ) -> Result<RenderAck, RenderError> {
        // Dropping the old surface first: its state must not survive into
        // the new session even if the new bootstrap fails.
        self.current = None;
        self.session += 1;
        let surface = self.factory.create(self.session);

        let payload = RenderPayload { snapshot, focus };
        let ack = match self.ack_timeout {
            Some(bound) => tokio::time::timeout(bound, surface.bootstrap(&payload))
                .await
                .map_err(|_| RenderError::AckTimeout(bound))??,
            None => surface.bootstrap(&payload).await?,
        };
        tracing::debug!(
            session = self.session,
            rendered = ack.rendered_systems,
            centered = ack.centered,
            "render session acknowledged"
        );
        self.current = Some(surface);
        Ok(ack)
    }
}

// ============================================================================
// Surfaces
// ============================================================================

/// Headless surface: writes the payload JSON for an external viewer and
/// acknowledges with the payload's own counts.
pub struct JsonFileSurface {
    path: PathBuf,
}

impl JsonFileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RenderSurface for JsonFileSurface {
    async fn bootstrap(&self, payload: &RenderPayload) -> Result<RenderAck, RenderError> {
        let text = serde_json::to_string_pretty(payload)
            .map_err(|e| RenderError::Surface(e.to_string()))?;
        tokio::fs::write(&self.path, text).await?;
        Ok(RenderAck {
            rendered_systems: payload.snapshot.systems.len(),
            centered: payload.focus.is_some(),
        })
    }
}

pub mod mock {
    //! Recording surfaces for tests, shared-log so fresh-per-session
    //! surfaces stay observable.

    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    pub struct RecordingFactory {
        log: Arc<Mutex<Vec<(u64, RenderPayload)>>>,
    }

    impl RecordingFactory {
        pub fn new() -> Self {
            Self::default()
        }

        /// Shared view of the delivery log, usable after the factory moves
        /// into a bridge. Entries are (session id, payload) pairs in
        /// delivery order.
        pub fn handle(&self) -> Arc<Mutex<Vec<(u64, RenderPayload)>>> {
            Arc::clone(&self.log)
        }
    }

    impl SurfaceFactory for RecordingFactory {
        fn create(&self, session: u64) -> Box<dyn RenderSurface> {
            Box::new(RecordingSurface {
                session,
                log: Arc::clone(&self.log),
            })
        }
    }

    struct RecordingSurface {
        session: u64,
        log: Arc<Mutex<Vec<(u64, RenderPayload)>>>,
    }

    #[async_trait]
    impl RenderSurface for RecordingSurface {
        async fn bootstrap(&self, payload: &RenderPayload) -> Result<RenderAck, RenderError> {
            self.log
                .lock()
                .expect("render log poisoned")
                .push((self.session, payload.clone()));
            Ok(RenderAck {
                rendered_systems: payload.snapshot.systems.len(),
                centered: payload.focus.is_some(),
            })
        }
    }

    /// A surface whose acknowledgement never arrives.
    pub struct SilentSurface;

    #[async_trait]
    impl RenderSurface for SilentSurface {
        async fn bootstrap(&self, _payload: &RenderPayload) -> Result<RenderAck, RenderError> {
            std::future::pending().await
        }
    }
}
