//! Bounded browser-context pool.
//!
//! One long-lived headless browser process per engine type, holding a
//! bounded set of reusable contexts (tabs). Leases hand out a context for
//! the duration of one strategy attempt; at capacity, requests reuse an
//! existing context round-robin instead of growing the pool or blocking.
//! A periodic sweep closes idle contexts past their max age, keeping one
//! warm per engine.

mod slots;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, SetBlockedUrLsParams};
use chromiumoxide::page::Page;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser_setup::launch_browser;
use crate::config::EngineConfig;
use crate::identity::{BrowserIdentity, ProxyEndpoint};
use crate::stealth;
use slots::{LeaseDecision, SlotTable};

/// Pool-level failures surfaced to strategies.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Lease requested after shutdown
    #[error("browser pool is shut down")]
    ShutDown,
    /// Browser process failed to launch
    #[error("failed to launch pool browser: {0}")]
    Launch(String),
    /// Context creation or lookup failed
    #[error("failed to provision pooled context: {0}")]
    Context(String),
}

/// Request patterns aborted when resource blocking is on. Heavy assets and
/// trackers add load time and detection surface without affecting the data
/// the strategies read.
const BLOCKED_URL_PATTERNS: &[&str] = &[
    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.webp", "*.svg", "*.ico",
    "*.woff", "*.woff2", "*.ttf", "*.otf", "*.css", "*.mp4", "*.webm",
    "*analytics*", "*tracking*", "*doubleclick*", "*googletagmanager*",
    "*facebook.net*", "*hotjar*", "*clarity.ms*",
];

/// Pool sizing and behavior knobs, lifted from [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_contexts: usize,
    pub context_max_age: Duration,
    pub headless: bool,
    pub block_resources: bool,
}

impl From<&EngineConfig> for PoolSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_contexts: config.max_contexts(),
            context_max_age: config.context_max_age(),
            headless: config.headless(),
            block_resources: config.block_resources(),
        }
    }
}

/// One launched browser engine with its context slots.
struct EngineEntry {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
    slots: SlotTable,
    pages: HashMap<u64, Arc<Page>>,
}

/// Process-wide browser context pool.
///
/// Engines launch lazily on the first lease for their key and stay alive
/// until [`shutdown`](Self::shutdown). All mutation happens under one
/// async mutex; leases are released via guard drop.
pub struct ContextPool {
    settings: PoolSettings,
    /// Egress proxy applied at browser launch (whole-process egress).
    proxy: Option<ProxyEndpoint>,
    engines: Mutex<HashMap<String, EngineEntry>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
    shutdown: AtomicBool,
}

impl ContextPool {
    #[must_use]
    pub fn new(settings: PoolSettings, proxy: Option<ProxyEndpoint>) -> Arc<Self> {
        Arc::new(Self {
            settings,
            proxy,
            engines: Mutex::new(HashMap::new()),
            sweeper: Mutex::new(None),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Start the background cleanup sweep. Idempotent.
    pub async fn start(self: &Arc<Self>) {
        let mut sweeper = self.sweeper.lock().await;
        if sweeper.is_some() {
            return;
        }
        let pool = Arc::clone(self);
        *sweeper = Some(tokio::spawn(async move {
            sweep_loop(pool).await;
        }));
    }

    /// Lease a context for one attempt.
    ///
    /// Launches the engine's browser on first use. The returned guard
    /// releases the slot when dropped; callers must treat the page as
    /// possibly shared with earlier leaseholders and must not assume
    /// exclusive state beyond the current navigation.
    pub async fn lease(
        self: &Arc<Self>,
        engine: &str,
        identity: &BrowserIdentity,
    ) -> Result<ContextLease, PoolError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(PoolError::ShutDown);
        }

        let mut engines = self.engines.lock().await;

        if !engines.contains_key(engine) {
            info!(engine, "launching browser for pool");
            let profile_dir = tempfile::Builder::new()
                .prefix(&format!("shopscout_{engine}_{}", uuid::Uuid::new_v4().simple()))
                .tempdir()
                .map_err(|e| PoolError::Launch(e.to_string()))?
                .keep();
            let (browser, handler) = launch_browser(
                self.settings.headless,
                profile_dir.clone(),
                self.proxy.as_ref(),
                identity,
            )
            .await
            .map_err(|e| PoolError::Launch(format!("{e:#}")))?;

            engines.insert(
                engine.to_string(),
                EngineEntry {
                    browser: Arc::new(browser),
                    handler,
                    profile_dir,
                    slots: SlotTable::new(self.settings.max_contexts),
                    pages: HashMap::new(),
                },
            );
        }

        let entry = engines.get_mut(engine).expect("inserted above");
        let now = Instant::now();

        let (slot_id, page) = match entry.slots.lease(now) {
            LeaseDecision::Reuse(id) => {
                debug!(engine, slot = id, "reusing pooled context");
                let page = entry
                    .pages
                    .get(&id)
                    .map(Arc::clone)
                    .ok_or_else(|| PoolError::Context(format!("slot {id} has no page")))?;
                (id, page)
            }
            LeaseDecision::Create(id) => {
                debug!(engine, slot = id, "creating pooled context");
                let page = entry
                    .browser
                    .new_page("about:blank")
                    .await
                    .map_err(|e| PoolError::Context(e.to_string()))?;

                if let Err(e) = stealth::inject(&page, identity).await {
                    warn!(engine, "stealth injection failed: {e:#}");
                }
                if let Err(e) = stealth::apply_viewport(&page, identity).await {
                    warn!(engine, "viewport override failed: {e:#}");
                }
                if self.settings.block_resources {
                    if let Err(e) = install_resource_blocking(&page).await {
                        warn!(engine, "resource blocking failed: {e:#}");
                    }
                }

                let page = Arc::new(page);
                entry.pages.insert(id, Arc::clone(&page));
                entry.slots.register(id, now);
                (id, page)
            }
        };

        Ok(ContextLease {
            pool: Arc::clone(self),
            engine: engine.to_string(),
            slot_id,
            page,
            broken: false,
        })
    }

    /// Return a slot after a lease ends. Broken contexts are closed and
    /// their slot freed instead of being returned.
    fn release(self: &Arc<Self>, engine: String, slot_id: u64, broken: bool) {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            let mut engines = pool.engines.lock().await;
            let Some(entry) = engines.get_mut(&engine) else {
                return;
            };
            if broken {
                warn!(engine, slot = slot_id, "dropping broken context");
                entry.slots.remove(slot_id);
                if let Some(page) = entry.pages.remove(&slot_id)
                    && let Ok(page) = Arc::try_unwrap(page)
                    && let Err(e) = page.close().await
                {
                    debug!("close of broken context failed: {e}");
                }
            } else {
                entry.slots.release(slot_id, Instant::now());
                debug!(engine, slot = slot_id, "context released to pool");
            }
        });
    }

    /// Number of live contexts for an engine. Test/diagnostic hook.
    pub async fn context_count(&self, engine: &str) -> usize {
        self.engines
            .lock()
            .await
            .get(engine)
            .map_or(0, |e| e.slots.len())
    }

    /// Close everything: contexts, browsers, handler tasks, profile dirs.
    pub async fn shutdown(&self) {
        info!("shutting down browser pool");
        self.shutdown.store(true, Ordering::Relaxed);

        if let Some(handle) = self.sweeper.lock().await.take() {
            handle.abort();
        }

        let mut engines = self.engines.lock().await;
        for (key, mut entry) in engines.drain() {
            for (_, page) in entry.pages.drain() {
                if let Ok(page) = Arc::try_unwrap(page)
                    && let Err(e) = page.close().await
                {
                    debug!(engine = %key, "page close failed during shutdown: {e}");
                }
            }
            match Arc::try_unwrap(entry.browser) {
                Ok(mut browser) => {
                    if let Err(e) = browser.close().await {
                        warn!(engine = %key, "browser close failed: {e}");
                    }
                    let _ = browser.wait().await;
                }
                Err(_) => {
                    warn!(engine = %key, "browser still referenced at shutdown");
                }
            }
            entry.handler.abort();
            if let Err(e) = std::fs::remove_dir_all(&entry.profile_dir) {
                debug!(
                    "failed to remove profile dir {}: {e}",
                    entry.profile_dir.display()
                );
            }
        }
        info!("browser pool shutdown complete");
    }
}

/// RAII lease on a pooled context.
pub struct ContextLease {
    pool: Arc<ContextPool>,
    engine: String,
    slot_id: u64,
    page: Arc<Page>,
    broken: bool,
}

impl ContextLease {
    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Mark the context unrecoverable; drop will close it instead of
    /// returning it to the pool.
    pub fn mark_broken(&mut self) {
        self.broken = true;
    }
}

impl Drop for ContextLease {
    fn drop(&mut self) {
        self.pool
            .release(std::mem::take(&mut self.engine), self.slot_id, self.broken);
    }
}

async fn install_resource_blocking(page: &Page) -> Result<(), chromiumoxide::error::CdpError> {
    page.execute(EnableParams::default()).await?;
    page.execute(
        SetBlockedUrLsParams::new(
            BLOCKED_URL_PATTERNS.iter().map(|s| (*s).to_string()).collect::<Vec<_>>(),
        ),
    )
    .await?;
    Ok(())
}

/// Background task: close idle contexts past their max age, retaining one
/// warm context per engine.
async fn sweep_loop(pool: Arc<ContextPool>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    while !pool.shutdown.load(Ordering::Relaxed) {
        interval.tick().await;

        let mut engines = pool.engines.lock().await;
        for (key, entry) in engines.iter_mut() {
            let victims = entry.slots.sweep(pool.settings.context_max_age, Instant::now());
            for id in victims {
                debug!(engine = %key, slot = id, "sweeping idle context");
                if let Some(page) = entry.pages.remove(&id)
                    && let Ok(page) = Arc::try_unwrap(page)
                    && let Err(e) = page.close().await
                {
                    debug!("sweep close failed: {e}");
                }
            }
        }
    }
    debug!("pool sweep loop exiting");
}
