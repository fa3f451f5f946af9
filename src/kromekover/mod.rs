//! Stealth injection for job pages
//!
//! Scripts are registered with `Page.addScriptToEvaluateOnNewDocument`, so
//! they run before any page script on every navigation of the page,
//! including HTML fragments loaded by chained indexers.

use anyhow::Result;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::browser::GetVersionParams;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use futures::future::join_all;
use tracing::{debug, warn};

mod config;
pub use config::StealthProfile;

// Injected in this order; later scripts may rely on earlier patches
const EVASION_SCRIPTS: &[(&str, &str)] = &[
    ("navigator_webdriver", include_str!("evasions/navigator_webdriver.js")),
    ("navigator_language", include_str!("evasions/navigator_language.js")),
    ("navigator_plugins", include_str!("evasions/navigator_plugins.js")),
    ("navigator_permissions", include_str!("evasions/navigator_permissions.js")),
    ("hardware_concurrency", include_str!("evasions/hardware_concurrency.js")),
    ("screen_size", include_str!("evasions/screen_size.js")),
    ("webgl_vendor_override", include_str!("evasions/webgl_vendor_override.js")),
    ("canvas_noise", include_str!("evasions/canvas_noise.js")),
    ("chrome_runtime", include_str!("evasions/chrome_runtime.js")),
];

fn on_new_document(source: String) -> AddScriptToEvaluateOnNewDocumentParams {
    AddScriptToEvaluateOnNewDocumentParams {
        source,
        include_command_line_api: None,
        world_name: None,
        run_immediately: None,
    }
}

/// Install the evasion scripts and a headless-free user agent on `page`
///
/// Best effort per script; fails only when nothing could be injected.
pub async fn inject(page: &Page, profile: &StealthProfile) -> Result<()> {
    debug!("Injecting window.__stealthProfile");
    page.execute(on_new_document(profile.bootstrap_script())).await?;

    let results = join_all(EVASION_SCRIPTS.iter().map(|(name, source)| {
        let page = page.clone();
        async move { (*name, page.execute(on_new_document((*source).to_string())).await) }
    }))
    .await;

    let mut injected = 0;
    for (name, result) in results {
        match result {
            Ok(_) => injected += 1,
            Err(e) => warn!("Failed to inject {name}: {e}"),
        }
    }
    if injected == 0 {
        return Err(anyhow::anyhow!("Failed to inject any stealth scripts"));
    }

    let version = page.execute(GetVersionParams {}).await?;
    page.execute(SetUserAgentOverrideParams {
        user_agent: version.user_agent.replace("Headless", ""),
        accept_language: Some(profile.accept_language.clone()),
        platform: Some(profile.platform.clone()),
        user_agent_metadata: None,
    })
    .await?;

    debug!("Stealth injection complete: {injected}/{} scripts active", EVASION_SCRIPTS.len());
    Ok(())
}
