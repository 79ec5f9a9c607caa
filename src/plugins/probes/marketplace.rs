use anyhow::anyhow;
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use super::extractor::extract_purchase_link;
use crate::config::BrowserConfig;
use crate::plugins::traits::{PageProbe, ProbeResult, ProbeSession};
use crate::utils::error::{AppError, ProbeError};

/// Image loading is switched off; scripts stay on because the listing is
/// rendered client-side.
const CHROME_ARGS: [&str; 7] = [
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--no-sandbox",
    "--disable-extensions",
    "--disable-notifications",
    "--disable-infobars",
    "--blink-settings=imagesEnabled=false",
];

/// Inner HTML of the loading indicator once the listing has rendered.
const IDLE_INDICATOR_HTML: &str = "<!---->";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Allowance for opening the tab and the round trips between steps.
const RENDER_SLACK: Duration = Duration::from_secs(5);

type RenderHandle = JoinHandle<Result<String, ProbeError>>;

/// Probes a marketplace listing page with a throwaway headless Chrome per
/// session.
pub struct MarketplaceProbe {
    settings: BrowserConfig,
    executable: PathBuf,
}

pub struct MarketplaceSession {
    worker_id: usize,
    browser: Option<Arc<Browser>>,
    settings: BrowserConfig,
    /// Render that outlived its ceiling; it still holds a browser handle.
    abandoned_render: Option<RenderHandle>,
}

impl MarketplaceProbe {
    /// Resolves the Chrome executable up front so a missing browser aborts
    /// the run before any worker starts.
    pub fn new(settings: BrowserConfig) -> Result<Self, AppError> {
        let executable = match &settings.chrome_path {
            Some(path) => PathBuf::from(path),
            None => headless_chrome::browser::default_executable()
                .map_err(|e| AppError::Browser(format!("Chrome executable not found: {}", e)))?,
        };

        if !executable.exists() {
            return Err(AppError::Browser(format!(
                "Chrome executable not found at {}",
                executable.display()
            )));
        }

        Ok(Self {
            settings,
            executable,
        })
    }

    fn launch_options(&self) -> Result<LaunchOptions<'static>, ProbeError> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(self.settings.headless)
            .sandbox(false)
            .args(CHROME_ARGS.into_iter().map(OsStr::new).collect())
            .build()
            .map_err(|e| ProbeError::Transport(format!("Failed to create launch options: {}", e)))?;

        launch_options.path = Some(self.executable.clone());
        Ok(launch_options)
    }
}

#[async_trait]
impl PageProbe for MarketplaceProbe {
    fn name(&self) -> &str {
        "marketplace"
    }

    async fn open_session(&self, worker_id: usize) -> Result<Box<dyn ProbeSession>, ProbeError> {
        let launch_options = self.launch_options()?;

        let browser = tokio::task::spawn_blocking(move || Browser::new(launch_options))
            .await
            .map_err(|e| ProbeError::Other(anyhow!("Browser launch task failed: {}", e)))?
            .map_err(|e| ProbeError::Transport(format!("Failed to launch browser: {}", e)))?;

        tracing::debug!(worker_id, "Launched browser session");

        Ok(Box::new(MarketplaceSession {
            worker_id,
            browser: Some(Arc::new(browser)),
            settings: self.settings.clone(),
            abandoned_render: None,
        }))
    }
}

#[async_trait]
impl ProbeSession for MarketplaceSession {
    async fn probe(
        &mut self,
        url: &str,
        search_token: &str,
        timeout: Duration,
    ) -> Result<ProbeResult, ProbeError> {
        let browser = self
            .browser
            .clone()
            .ok_or_else(|| ProbeError::Transport("Browser session already closed".to_string()))?;
        let settings = self.settings.clone();
        let target = url.to_string();

        // The tab enforces the per-step timeouts; this is the hard ceiling
        // for the whole render in case the browser stops answering.
        let ceiling = render_ceiling(timeout, settings.page_wait());
        let mut render = tokio::task::spawn_blocking(move || {
            render_listing(&browser, &target, timeout, &settings)
        });

        let rendered = tokio::time::timeout(ceiling, &mut render).await;
        let html = match rendered {
            Err(_) => {
                self.abandoned_render = Some(render);
                return Err(ProbeError::PageTimeout(timeout));
            }
            Ok(Err(e)) => return Err(ProbeError::Other(anyhow!("Render task failed: {}", e))),
            Ok(Ok(rendered)) => rendered?,
        };

        tracing::debug!(worker_id = self.worker_id, bytes = html.len(), "Listing rendered");
        extract_purchase_link(&html, search_token, &self.settings.product_title_selector)
    }

    async fn close(&mut self) {
        // The blocking render cannot be cancelled; wait for it to let go of
        // its browser handle so the drop below really ends Chrome.
        if let Some(render) = self.abandoned_render.take() {
            tracing::debug!(worker_id = self.worker_id, "Waiting for abandoned render to finish");
            if let Err(e) = render.await {
                tracing::warn!(worker_id = self.worker_id, "Abandoned render task failed: {}", e);
            }
        }

        if let Some(browser) = self.browser.take() {
            // Dropping the last handle kills the Chrome process, which blocks.
            if let Err(e) = tokio::task::spawn_blocking(move || drop(browser)).await {
                tracing::warn!(worker_id = self.worker_id, "Failed to shut down browser: {}", e);
            }
        }
    }
}

fn render_listing(
    browser: &Browser,
    url: &str,
    timeout: Duration,
    settings: &BrowserConfig,
) -> Result<String, ProbeError> {
    let tab = browser
        .new_tab()
        .map_err(|e| ProbeError::Transport(format!("Failed to create tab: {}", e)))?;
    tab.set_default_timeout(timeout);

    tab.navigate_to(url)
        .map_err(|e| classify_browser_error(e, timeout))?;
    tab.wait_until_navigated()
        .map_err(|e| classify_browser_error(e, timeout))?;

    wait_for_loading_to_clear(&tab, &settings.loading_indicator_selector, settings.page_wait())?;
    tracing::debug!("Loading bar is no longer active");

    tab.set_default_timeout(settings.page_wait());
    tab.wait_for_elements(&settings.product_title_selector)
        .map_err(|e| classify_browser_error(e, settings.page_wait()))?;

    let html = tab
        .get_content()
        .map_err(|e| ProbeError::Transport(format!("Failed to get page content: {}", e)))?;

    if let Err(e) = tab.close(true) {
        tracing::debug!("Failed to close tab: {}", e);
    }
    Ok(html)
}

/// Upper bound on one `render_listing` call: navigation and the navigated
/// wait each get `timeout`, the indicator poll runs for `page_wait` plus one
/// final evaluate bounded by `timeout`, and the element wait and content
/// fetch each get `page_wait`.
fn render_ceiling(timeout: Duration, page_wait: Duration) -> Duration {
    timeout * 3 + page_wait * 3 + RENDER_SLACK
}

fn wait_for_loading_to_clear(tab: &Tab, selector: &str, wait: Duration) -> Result<(), ProbeError> {
    let quoted = serde_json::to_string(selector)
        .map_err(|e| ProbeError::Other(anyhow!("Failed to quote selector: {}", e)))?;
    let script = format!(
        "(() => {{ const el = document.querySelector({}); return el ? el.innerHTML.trim() : null; }})()",
        quoted
    );

    let deadline = Instant::now() + wait;
    loop {
        let indicator = tab
            .evaluate(&script, false)
            .map_err(|e| classify_browser_error(e, wait))?;

        if loading_cleared(indicator.value.as_ref()) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(ProbeError::PageTimeout(wait));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// The indicator counts as idle when it is gone or holds only the empty
/// placeholder comment.
fn loading_cleared(indicator_html: Option<&serde_json::Value>) -> bool {
    match indicator_html {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(html)) => html.trim() == IDLE_INDICATOR_HTML,
        Some(_) => false,
    }
}

fn classify_browser_error(error: anyhow::Error, timeout: Duration) -> ProbeError {
    let message = error.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("timeout") || lowered.contains("timed out") || lowered.contains("never came") {
        ProbeError::PageTimeout(timeout)
    } else {
        ProbeError::Transport(message)
    }
}
