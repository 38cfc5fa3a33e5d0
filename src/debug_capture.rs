//! Debug capture: persist raw payloads and screenshots per attempt.
//!
//! Disabled by default. When the capture toggle is on, every strategy
//! attempt writes its raw response body (and the browser strategy its
//! screenshot) under the capture directory for offline inspection of
//! parser misses and anti-bot pages.

use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::models::StrategyKind;

/// Writes attempt artifacts under a capture directory.
pub struct DebugCapture {
    dir: PathBuf,
}

impl DebugCapture {
    /// Build from config; `None` when capture is disabled.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Option<Self> {
        if !config.debug_capture() {
            return None;
        }
        let dir = config
            .capture_dir()
            .cloned()
            .unwrap_or_else(|| std::env::temp_dir().join("shopscout_capture"));
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("failed to create capture dir {}: {e}", dir.display());
            return None;
        }
        Some(Self { dir })
    }

    fn artifact_path(&self, retailer: &str, strategy: StrategyKind, ext: &str) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S");
        let short = Uuid::new_v4().simple().to_string();
        self.dir.join(format!(
            "{retailer}-{}-{stamp}-{}.{ext}",
            strategy.label(),
            &short[..8]
        ))
    }

    /// Persist a raw response payload. Failures are logged, never surfaced.
    pub async fn record_payload(
        &self,
        retailer: &str,
        strategy: StrategyKind,
        ext: &str,
        body: &[u8],
    ) {
        let path = self.artifact_path(retailer, strategy, ext);
        match tokio::fs::write(&path, body).await {
            Ok(()) => debug!("captured payload to {}", path.display()),
            Err(e) => warn!("payload capture failed for {}: {e}", path.display()),
        }
    }

    /// Persist a page screenshot taken by the browser strategy.
    pub async fn record_screenshot(&self, retailer: &str, png: &[u8]) {
        let path = self.artifact_path(retailer, StrategyKind::BrowserSniff, "png");
        match tokio::fs::write(&path, png).await {
            Ok(()) => debug!("captured screenshot to {}", path.display()),
            Err(e) => warn!("screenshot capture failed for {}: {e}", path.display()),
        }
    }
}
