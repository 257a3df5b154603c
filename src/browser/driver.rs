use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::Page;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::page::{
    feed_url, is_login_wall, login_url, search_terms, search_url, split_post_containers,
};
use super::session::SessionStore;
use crate::config::ScrapingConfig;
use crate::constants::{BASE_URL, BROWSER_USER_AGENT};
use crate::extract::RawUnit;
use crate::source::PostSource;

const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 900;

/// Time given to client-side rendering after a navigation.
const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Pause after each scroll so lazily loaded posts can render.
const SCROLL_PAUSE: Duration = Duration::from_secs(1);

/// How long a cached page gets to answer before the browser counts as dead.
const LIVENESS_TIMEOUT: Duration = Duration::from_secs(5);

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";
const PAGE_HEIGHT: &str = "document.body.scrollHeight";

/// Collects post containers from the feed and content search with a real browser.
///
/// The browser is launched on first use and kept open across runs so the
/// login session stays warm.
pub struct ChromiumDriver {
    config: ScrapingConfig,
    session: Box<dyn SessionStore>,
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
}

impl ChromiumDriver {
    #[must_use]
    pub fn new(config: ScrapingConfig, session: Box<dyn SessionStore>) -> Self {
        Self {
            config,
            session,
            browser: None,
            page: None,
            handler: None,
        }
    }

    async fn ensure_page(&mut self) -> Result<Page> {
        if let Some(page) = self.page.clone() {
            let finished = handler_finished(self.handler.as_ref());
            let responds = !finished
                && matches!(
                    tokio::time::timeout(LIVENESS_TIMEOUT, page.url()).await,
                    Ok(Ok(_))
                );
            if page_usable(finished, responds) {
                return Ok(page);
            }
            warn!(handler_finished = finished, "Browser is no longer responding; relaunching");
            self.shutdown().await;
        }

        if !self.session.has_saved_session() {
            warn!("No saved browser session found; log in through the browser window");
        }
        let user_data_dir = self.session.prepare().await?;
        info!(
            profile = %user_data_dir.display(),
            headless = self.config.headless,
            "Launching browser"
        );

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&user_data_dir)
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .request_timeout(self.config.timeout())
            .arg(format!("--user-agent={BROWSER_USER_AGENT}"))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-dev-shm-usage");
        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(ref chrome_path) = self.config.chrome_path {
            builder = builder.chrome_executable(chrome_path);
        }
        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        self.handler = Some(tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        }));

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open browser tab")?;
        self.browser = Some(browser);
        self.page = Some(page.clone());

        seed_cookies(&self.config, self.session.as_ref(), &page).await;
        Ok(page)
    }

    async fn shutdown(&mut self) {
        self.page = None;
        if let Some(mut browser) = self.browser.take() {
            match tokio::time::timeout(LIVENESS_TIMEOUT, browser.close()).await {
                Ok(Ok(_)) => info!("Browser closed"),
                Ok(Err(e)) => error!("Failed to close browser: {e}"),
                Err(_) => error!("Timed out closing browser"),
            }
            // Reap the process if it did not exit on its own.
            if let Some(Err(e)) = browser.kill().await {
                debug!("Browser process already gone: {e}");
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

/// Add the session's exported cookies; failures leave the profile session as is.
async fn seed_cookies(config: &ScrapingConfig, session: &dyn SessionStore, page: &Page) {
    let cookies = match session.cookies().await {
        Ok(cookies) if cookies.is_empty() => return,
        Ok(cookies) => cookies,
        Err(e) => {
            warn!("Could not load cookies: {e:#}");
            return;
        }
    };
    // Cookies cannot be set on about:blank.
    if let Err(e) = open(config, page, BASE_URL).await {
        warn!("Could not open site before adding cookies: {e:#}");
        return;
    }
    let params: Vec<CookieParam> = cookies.iter().map(CookieParam::from).collect();
    match page.set_cookies(params).await {
        Ok(_) => info!(count = cookies.len(), "Loaded session cookies"),
        Err(e) => warn!("Could not add cookies: {e}"),
    }
}

fn handler_finished(handler: Option<&JoinHandle<()>>) -> bool {
    handler.map_or(true, JoinHandle::is_finished)
}

/// Whether a cached page can serve another run: its event loop is still
/// running and it answered a query.
fn page_usable(handler_finished: bool, responds: bool) -> bool {
    !handler_finished && responds
}

/// Navigate, retrying once before giving up.
async fn open(config: &ScrapingConfig, page: &Page, url: &str) -> Result<()> {
    let mut last_error = None;
    for attempt in 1..=2 {
        match tokio::time::timeout(config.timeout(), page.goto(url)).await {
            Ok(Ok(_)) => {
                tokio::time::sleep(SETTLE_DELAY).await;
                return Ok(());
            }
            Ok(Err(e)) => {
                debug!(url, attempt, "Navigation failed: {e}");
                last_error = Some(anyhow::Error::new(e));
            }
            Err(elapsed) => {
                debug!(url, attempt, "Navigation timed out");
                last_error = Some(anyhow::Error::new(elapsed));
            }
        }
    }
    Err(last_error
        .unwrap_or_else(|| anyhow::anyhow!("navigation not attempted"))
        .context(format!("Failed to load {url}")))
}

/// Warn when the login page does not redirect away, i.e. there is no session.
async fn check_login(config: &ScrapingConfig, page: &Page) {
    if let Err(e) = open(config, page, &login_url()).await {
        warn!("Could not determine login status: {e:#}");
        return;
    }
    match page.url().await {
        Ok(Some(url)) if !is_login_wall(&url) => info!("Already logged in"),
        Ok(_) => warn!("Not logged in; please log in manually in the browser window"),
        Err(e) => warn!("Could not read current URL: {e}"),
    }
}

/// Scroll to the bottom up to `times` times, stopping when the page stops growing.
async fn scroll(page: &Page, times: u32) {
    let mut last_height = page_height(page).await;
    for _ in 0..times {
        if let Err(e) = page.evaluate(SCROLL_TO_BOTTOM).await {
            debug!("Scroll failed: {e}");
            break;
        }
        tokio::time::sleep(SCROLL_PAUSE).await;
        let height = page_height(page).await;
        if height == last_height {
            break;
        }
        last_height = height;
    }
}

/// Load one surface and split it into raw units.
async fn collect_surface(
    config: &ScrapingConfig,
    page: &Page,
    url: &str,
    scrolls: u32,
) -> Result<Vec<RawUnit>> {
    open(config, page, url).await?;
    if page
        .url()
        .await
        .ok()
        .flatten()
        .is_some_and(|current| is_login_wall(&current))
    {
        anyhow::bail!("Redirected to the login page");
    }
    scroll(page, scrolls).await;
    let html = page.content().await.context("Failed to read page content")?;
    Ok(split_post_containers(&html, config.max_posts_per_search))
}

/// Truncate to `max_total_posts`; true when the cap has been reached.
fn cap(config: &ScrapingConfig, units: &mut Vec<RawUnit>) -> bool {
    match config.max_total_posts {
        Some(max) if units.len() >= max => {
            units.truncate(max);
            true
        }
        _ => false,
    }
}

async fn page_height(page: &Page) -> Option<u64> {
    page.evaluate(PAGE_HEIGHT)
        .await
        .ok()
        .and_then(|result| result.into_value::<u64>().ok())
}

#[async_trait]
impl PostSource for ChromiumDriver {
    async fn collect(&mut self, keywords: &[String], hashtags: &[String]) -> Result<Vec<RawUnit>> {
        let page = self.ensure_page().await?;
        let config = &self.config;
        check_login(config, &page).await;

        let mut units = Vec::new();
        match collect_surface(config, &page, &feed_url(), config.feed_scrolls).await {
            Ok(found) => {
                info!(count = found.len(), "Collected posts from feed");
                units.extend(found);
            }
            Err(e) => warn!("Skipping feed: {e:#}"),
        }

        for (i, term) in search_terms(keywords, hashtags).into_iter().enumerate() {
            if cap(config, &mut units) {
                info!(max = units.len(), "Reached maximum number of posts");
                break;
            }
            if i > 0 {
                tokio::time::sleep(config.delay_between_requests()).await;
            }
            match collect_surface(config, &page, &search_url(term), config.search_scrolls).await {
                Ok(found) => {
                    info!(term = %term, count = found.len(), "Collected posts from search");
                    units.extend(found);
                }
                Err(e) => warn!(term = %term, "Skipping search: {e:#}"),
            }
        }
        cap(config, &mut units);

        info!(count = units.len(), "Collection finished");
        Ok(units)
    }

    async fn close(&mut self) {
        self.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(n: usize) -> Vec<RawUnit> {
        (0..n).map(|i| RawUnit::node(format!("<div>{i}</div>"))).collect()
    }

    #[test]
    fn test_cap_truncates_at_limit() {
        let config = ScrapingConfig {
            max_total_posts: Some(3),
            ..ScrapingConfig::default()
        };
        let mut collected = units(5);
        assert!(cap(&config, &mut collected));
        assert_eq!(collected.len(), 3);

        let mut few = units(2);
        assert!(!cap(&config, &mut few));
        assert_eq!(few.len(), 2);
    }

    #[test]
    fn test_no_cap_configured() {
        let config = ScrapingConfig::default();
        let mut collected = units(500);
        assert!(!cap(&config, &mut collected));
        assert_eq!(collected.len(), 500);
    }

    #[test]
    fn test_page_usable() {
        assert!(page_usable(false, true));
        assert!(!page_usable(false, false));
        assert!(!page_usable(true, true));
        assert!(!page_usable(true, false));
    }

    #[tokio::test]
    async fn test_handler_finished() {
        assert!(handler_finished(None));

        let running = tokio::spawn(std::future::pending::<()>());
        assert!(!handler_finished(Some(&running)));
        running.abort();

        let done = tokio::spawn(async {});
        while !done.is_finished() {
            tokio::task::yield_now().await;
        }
        assert!(handler_finished(Some(&done)));
        assert!(!page_usable(handler_finished(Some(&done)), true));
    }

    #[tokio::test]
    async fn test_close_without_browser_is_a_no_op() {
        let session = crate::browser::ProfileDirSession::new("/tmp/unused-profile");
        let mut driver = ChromiumDriver::new(ScrapingConfig::default(), Box::new(session));
        driver.close().await;
        assert!(driver.browser.is_none());
        assert!(driver.handler.is_none());
    }

    #[test]
    fn test_driver_starts_without_browser() {
        let session = crate::browser::ProfileDirSession::new("/tmp/unused-profile");
        let driver = ChromiumDriver::new(ScrapingConfig::default(), Box::new(session));
        assert!(driver.browser.is_none());
        assert!(driver.page.is_none());
    }
}
