//! Chromium renderer over CDP.
//!
//! Every [`PageRenderer::open`] launches its own browser process; nothing is
//! reused across runs. The session shuts the process down on
//! [`RenderSession::close`], and on drop if the run was cancelled first.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::binary::{find_chrome, is_constrained_device};
use super::stealth::STEALTH_SCRIPTS;
use super::{PageRenderer, RenderError, RenderSession, RenderedPage};
use crate::config::BrowserEngineConfig;
use crate::http_client::{resolve_user_agent, ACCEPT_LANGUAGE};

/// Resolves once no new resources were requested for 500ms and the document
/// finished loading. The caller bounds the wait.
const NETWORK_IDLE_SCRIPT: &str = r#"
    new Promise((resolve) => {
        const quietMs = 500;
        let seen = performance.getEntriesByType('resource').length;
        let quietSince = Date.now();
        const tick = () => {
            const count = performance.getEntriesByType('resource').length;
            if (count !== seen) {
                seen = count;
                quietSince = Date.now();
            }
            if (document.readyState === 'complete' && Date.now() - quietSince >= quietMs) {
                resolve('idle');
                return;
            }
            setTimeout(tick, 100);
        };
        tick();
    })
"#;

/// Outcome of the network-idle wait.
///
/// A client-side redirect after load destroys the execution context the
/// check runs in; the page is still snapshotted, so any error counts as settled.
fn settled_state(idle: Result<String, String>) -> String {
    match idle {
        Ok(state) => state,
        Err(e) => {
            debug!("Network idle check interrupted, snapshotting anyway: {}", e);
            "settled".to_string()
        }
    }
}

/// Renderer backed by a locally launched Chrome/Chromium.
pub struct ChromeRenderer {
    config: BrowserEngineConfig,
    user_agent: String,
}

impl ChromeRenderer {
    pub fn new(config: BrowserEngineConfig) -> Self {
        let user_agent = resolve_user_agent(config.user_agent.as_deref());
        Self { config, user_agent }
    }

    fn launch_config(&self) -> Result<BrowserConfig, RenderError> {
        let chrome_path = find_chrome(self.config.chrome_path.as_deref())?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(Duration::from_secs(self.config.timeout));

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--metrics-recording-only");

        if is_constrained_device() {
            debug!("Constrained device detected, using single-process Chromium");
            builder = builder.arg("--single-process").arg("--no-zygote");
        }

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        builder
            .build()
            .map_err(|e| RenderError::Launch(format!("invalid browser config: {}", e)))
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        let launch = self.launch_config()?;

        info!("Launching browser (headless={})", self.config.headless);
        let (browser, mut handler) = Browser::launch(launch)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(Box::new(ChromeSession {
            browser,
            handler_task,
            navigation_timeout: Duration::from_secs(self.config.timeout),
            user_agent: self.user_agent.clone(),
            stealth: self.config.stealth,
        }))
    }
}

/// One launched browser process.
struct ChromeSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    navigation_timeout: Duration,
    user_agent: String,
    stealth: bool,
}

impl ChromeSession {
    /// Inner render logic - page cleanup handled by caller.
    async fn render_inner(&self, page: &Page, url: &str) -> Result<RenderedPage, RenderError> {
        self.prepare_page(page).await.map_err(|e| RenderError::Navigation {
            url: url.to_string(),
            reason: format!("page setup failed: {}", e),
        })?;

        info!("Navigating to {}", url);
        let navigation = async {
            page.goto(url).await?;
            let idle = match page.evaluate(NETWORK_IDLE_SCRIPT).await {
                Ok(result) => result.into_value::<String>().map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            debug!("Network state after navigation: {}", settled_state(idle));
            Ok::<(), CdpError>(())
        };

        tokio::time::timeout(self.navigation_timeout, navigation)
            .await
            .map_err(|_| RenderError::NavigationTimeout {
                url: url.to_string(),
                secs: self.navigation_timeout.as_secs(),
            })?
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let final_url = page
            .url()
            .await
            .map_err(|e| RenderError::Snapshot(e.to_string()))?
            .unwrap_or_else(|| url.to_string());
        let markup = page
            .content()
            .await
            .map_err(|e| RenderError::Snapshot(e.to_string()))?;

        info!(final_url = %final_url, bytes = markup.len(), "Page rendered");
        Ok(RenderedPage::new(final_url, markup))
    }

    /// Client identity and evasions, applied before the first navigation.
    async fn prepare_page(&self, page: &Page) -> Result<(), CdpError> {
        let mut ua_override = SetUserAgentOverrideParams::new(self.user_agent.clone());
        ua_override.accept_language = Some(ACCEPT_LANGUAGE.to_string());
        page.execute(ua_override).await?;

        let headers = Headers::new(serde_json::json!({
            "Accept-Language": ACCEPT_LANGUAGE,
            "Upgrade-Insecure-Requests": "1",
        }));
        page.execute(SetExtraHttpHeadersParams::new(headers)).await?;

        if self.stealth {
            debug!("Registering stealth scripts");
            for script in STEALTH_SCRIPTS {
                page.execute(AddScriptToEvaluateOnNewDocumentParams::new(*script))
                    .await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl RenderSession for ChromeSession {
    async fn render(&mut self, url: &str) -> Result<RenderedPage, RenderError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Launch(format!("failed to open tab: {}", e)))?;

        // Inner function so the tab is always closed
        let result = self.render_inner(&page, url).await;
        let _ = page.close().await;
        result
    }

    async fn close(mut self: Box<Self>) {
        if let Err(e) = self.browser.close().await {
            debug!("Browser close command failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Waiting for browser exit failed: {}", e);
        }
        self.handler_task.abort();
        debug!("Browser session closed");
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        // Browser's own Drop kills the child process if it is still running.
        self.handler_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_result_is_reported() {
        assert_eq!(settled_state(Ok("idle".to_string())), "idle");
    }

    #[test]
    fn test_destroyed_context_counts_as_settled() {
        let idle = Err("Execution context was destroyed, most likely because of a navigation.".to_string());
        assert_eq!(settled_state(idle), "settled");
    }
}
