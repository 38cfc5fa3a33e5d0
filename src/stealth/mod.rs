//! Fingerprint spoofing injected before any page script runs.
//!
//! Each leased page gets a spoof config derived from the attempt's
//! [`BrowserIdentity`] plus a per-session random seed, then a fixed
//! sequence of evasion scripts. Order matters: the config object must
//! exist before the scripts that read it.

use anyhow::Result;
use chromiumoxide::{Page, cdp};
use tracing::{debug, warn};

use crate::identity::BrowserIdentity;

/// Evasion scripts in injection order. Each reads `window.__scoutFp` for
/// identity values so the same scripts serve every randomized identity.
const EVASION_SCRIPTS: &[(&str, &str)] = &[
    (
        "navigator_webdriver",
        r"Object.defineProperty(navigator, 'webdriver', { get: () => false });
          delete window.cdc_adoQpoasnfa76pfcZLmcfl_Array;
          delete window.cdc_adoQpoasnfa76pfcZLmcfl_Promise;
          delete window.cdc_adoQpoasnfa76pfcZLmcfl_Symbol;",
    ),
    (
        "navigator_languages",
        r"(() => {
            const fp = window.__scoutFp || {};
            Object.defineProperty(navigator, 'language', { get: () => fp.locale || 'en-US' });
            Object.defineProperty(navigator, 'languages', { get: () => fp.languages || ['en-US', 'en'] });
          })();",
    ),
    (
        "navigator_platform",
        r"(() => {
            const fp = window.__scoutFp || {};
            Object.defineProperty(navigator, 'platform', { get: () => fp.platform || 'Win32' });
            Object.defineProperty(navigator, 'hardwareConcurrency', { get: () => fp.cores || 8 });
          })();",
    ),
    (
        "navigator_plugins",
        r"(() => {
            const mockPlugins = [
                { name: 'Chrome PDF Plugin', description: 'Portable Document Format', filename: 'internal-pdf-viewer' },
                { name: 'Chrome PDF Viewer', description: '', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai' },
                { name: 'Native Client', description: '', filename: 'internal-nacl-plugin' }
            ];
            Object.defineProperty(navigator, 'plugins', {
                get: () => {
                    const plugins = {};
                    mockPlugins.forEach((plugin, i) => {
                        plugins[i] = plugin;
                        plugins[plugin.name] = plugin;
                    });
                    Object.defineProperty(plugins, 'length', { value: mockPlugins.length });
                    return plugins;
                }
            });
          })();",
    ),
    (
        "permissions_query",
        r"(() => {
            if (!navigator.permissions) return;
            const originalQuery = navigator.permissions.query.bind(navigator.permissions);
            navigator.permissions.query = (parameters) =>
                parameters && parameters.name === 'notifications'
                    ? Promise.resolve({ state: Notification.permission })
                    : originalQuery(parameters);
          })();",
    ),
    (
        "chrome_runtime",
        r"if (!window.chrome) { window.chrome = {}; }
          if (!window.chrome.runtime) {
              window.chrome.runtime = {
                  connect: () => ({
                      onMessage: { addListener: () => {}, removeListener: () => {} },
                      postMessage: () => {}
                  })
              };
          }",
    ),
    (
        "webgl_vendor",
        r"(() => {
            const fp = window.__scoutFp || {};
            const handler = {
                apply: function(target, ctx, args) {
                    const param = (args && args[0]) || null;
                    if (param === 37445) { return fp.webglVendor || 'Intel Inc.'; }
                    if (param === 37446) { return fp.webglRenderer || 'Intel(R) UHD Graphics'; }
                    return Reflect.apply(target, ctx, args);
                }
            };
            if (window.WebGLRenderingContext) {
                const getParameter = WebGLRenderingContext.prototype.getParameter;
                WebGLRenderingContext.prototype.getParameter = new Proxy(getParameter, handler);
            }
          })();",
    ),
];

/// WebGL identities paired with plausible hardware.
const WEBGL_PROFILES: &[(&str, &str)] = &[
    ("Intel Inc.", "Intel(R) UHD Graphics 630"),
    ("Intel Inc.", "Intel(R) Iris(R) Xe Graphics"),
    ("NVIDIA Corporation", "NVIDIA GeForce GTX 1650/PCIe/SSE2"),
];

/// Build the `window.__scoutFp` bootstrap for one identity.
fn fingerprint_config(identity: &BrowserIdentity) -> String {
    let seed: Vec<u8> = (0..16).map(|_| rand::random::<u8>()).collect();
    let seed_hex = hex::encode(&seed);
    let (webgl_vendor, webgl_renderer) =
        WEBGL_PROFILES[rand::random_range(0..WEBGL_PROFILES.len())];

    format!(
        r#"window.__scoutFp = {{
            locale: "{locale}",
            languages: {languages},
            platform: "{platform}",
            cores: {cores},
            webglVendor: "{webgl_vendor}",
            webglRenderer: "{webgl_renderer}",
            sessionSeed: "{seed_hex}"
        }};"#,
        locale = identity.locale,
        languages = serde_json::to_string(&[identity.locale.as_str(), "en"])
            .unwrap_or_else(|_| "[\"en-US\",\"en\"]".to_string()),
        platform = identity.platform,
        cores = identity.hardware_concurrency,
    )
}

/// Inject the fingerprint config and evasion scripts into a page.
///
/// Uses `AddScriptToEvaluateOnNewDocument` so everything is in place
/// before the first page script executes. Partial injection is tolerated;
/// only a total miss is an error.
pub async fn inject(page: &Page, identity: &BrowserIdentity) -> Result<()> {
    debug!("Injecting fingerprint config");
    page.execute(
        cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams {
            source: fingerprint_config(identity),
            include_command_line_api: None,
            world_name: None,
            run_immediately: None,
        },
    )
    .await?;

    let mut success_count = 0usize;
    for (name, source) in EVASION_SCRIPTS {
        let result = page
            .execute(
                cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams {
                    source: (*source).to_string(),
                    include_command_line_api: None,
                    world_name: None,
                    run_immediately: None,
                },
            )
            .await;
        match result {
            Ok(_) => success_count += 1,
            Err(e) => warn!("Failed to inject evasion script {name}: {e}"),
        }
    }

    if success_count == 0 {
        return Err(anyhow::anyhow!("Failed to inject any stealth scripts"));
    }

    // User agent last: strip the Headless marker and pin language/platform
    // to the same identity the scripts report.
    let ua = page
        .execute(cdp::browser_protocol::browser::GetVersionParams {})
        .await?;
    let modified_ua = ua.user_agent.replace("Headless", "");

    page.execute(cdp::browser_protocol::network::SetUserAgentOverrideParams {
        user_agent: modified_ua,
        accept_language: Some(identity.accept_language.clone()),
        platform: Some(identity.platform.clone()),
        user_agent_metadata: None,
    })
    .await?;

    debug!(
        "Stealth injection complete: {}/{} scripts active",
        success_count,
        EVASION_SCRIPTS.len()
    );
    Ok(())
}

/// Apply the identity's viewport to a page.
pub async fn apply_viewport(page: &Page, identity: &BrowserIdentity) -> Result<()> {
    page.execute(
        cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(identity.viewport.0))
            .height(i64::from(identity.viewport.1))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(anyhow::Error::msg)?,
    )
    .await?;

    page.execute(
        cdp::browser_protocol::emulation::SetTimezoneOverrideParams::builder()
            .timezone_id(identity.timezone.clone())
            .build()
            .map_err(anyhow::Error::msg)?,
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_config_embeds_identity() {
        let identity = BrowserIdentity::random();
        let config = fingerprint_config(&identity);
        assert!(config.contains(&identity.locale));
        assert!(config.contains(&identity.platform));
        assert!(config.contains("sessionSeed"));
    }
}
