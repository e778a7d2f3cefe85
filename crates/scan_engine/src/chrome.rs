use std::ffi::OsString;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use headless_chrome::{Browser, LaunchOptions, Tab};
use scan_logging::{scan_debug, scan_info};

use crate::session::{with_scoped, Closable};
use crate::{ResultsSession, ScanError};

const READY_POLL: Duration = Duration::from_millis(250);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    pub headless: bool,
    pub window_size: (u32, u32),
    pub user_agent: String,
    /// The browser is considered gone after this long without any CDP traffic.
    /// Must outlast the longest manual login held at the gate.
    pub idle_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1600, 1000),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"
                .to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// [`ResultsSession`] backed by a Chrome process driven over CDP.
///
/// Dropping the session closes its tab and shuts the browser down.
pub struct ChromeSession {
    tab: Arc<Tab>,
    browser: Browser,
}

impl ChromeSession {
    pub fn launch(options: &BrowserOptions) -> Result<Self, ScanError> {
        let user_agent = OsString::from(format!("--user-agent={}", options.user_agent));
        let automation = OsString::from("--disable-blink-features=AutomationControlled");
        let browser = Browser::new(LaunchOptions {
            headless: options.headless,
            window_size: Some(options.window_size),
            idle_browser_timeout: options.idle_timeout,
            args: vec![user_agent.as_os_str(), automation.as_os_str()],
            ..Default::default()
        })
        .map_err(|err| ScanError::Browser(format!("launch failed: {err}")))?;
        let tab = browser.new_tab().map_err(|err| classify(err, ScanError::Browser))?;
        scan_info!("browser launched (headless: {})", options.headless);
        Ok(Self { tab, browser })
    }

    fn run_script(&self, script: &str) -> Result<serde_json::Value, ScanError> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|err| classify(err, ScanError::Script))?;
        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(err) = self.tab.close(false) {
            scan_debug!("tab close on shutdown failed: {err}");
        }
        scan_info!("browser session closed");
    }
}

/// Secondary tab closed by [`with_scoped`].
struct IsolatedTab(Arc<Tab>);

impl Closable for IsolatedTab {
    fn close(&self) {
        if let Err(err) = self.0.close(true) {
            scan_debug!("isolated tab close failed: {err}");
        }
    }
}

impl ResultsSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<(), ScanError> {
        scan_debug!("navigating to {url}");
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|err| classify(err, ScanError::Navigation))?;
        Ok(())
    }

    fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<(), ScanError> {
        self.tab
            .wait_for_element_with_custom_timeout(css, timeout)
            .map_err(|err| classify(format!("{css}: {err}"), ScanError::ResultsMissing))?;
        Ok(())
    }

    fn html(&mut self) -> Result<String, ScanError> {
        self.tab
            .get_content()
            .map_err(|err| classify(err, ScanError::Script))
    }

    fn click_card(&mut self, card_css: &str, url: &str, index: usize) -> Result<(), ScanError> {
        let script = format!(
            r#"(() => {{
    const cards = Array.from(document.querySelectorAll({css}));
    const target = {url};
    const canonical = (href) => {{
        try {{ const u = new URL(href, location.href); u.search = ''; u.hash = ''; return u.href; }}
        catch (e) {{ return ''; }}
    }};
    let card = target ? cards.find((c) =>
        Array.from(c.querySelectorAll('a[href]')).some((a) => canonical(a.getAttribute('href')) === target)
    ) : undefined;
    if (!card) card = cards[{index}];
    if (!card) return false;
    card.scrollIntoView({{ block: 'center' }});
    card.click();
    return true;
}})()"#,
            css = js_string(card_css),
            url = js_string(url),
        );
        match self.run_script(&script)? {
            serde_json::Value::Bool(true) => Ok(()),
            _ => Err(ScanError::Click(format!("no card for {url} at index {index}"))),
        }
    }

    fn scroll_to_bottom(&mut self, css: &str) -> Result<(), ScanError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({css}); if (!el) return false; \
             el.scrollTop = el.scrollHeight; return true; }})()",
            css = js_string(css),
        );
        match self.run_script(&script)? {
            serde_json::Value::Bool(true) => Ok(()),
            _ => Err(ScanError::MissingElement(css.to_string())),
        }
    }

    fn click_if_present(&mut self, css: &str) -> Result<bool, ScanError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({css}); if (!el) return false; \
             el.click(); return true; }})()",
            css = js_string(css),
        );
        Ok(matches!(self.run_script(&script)?, serde_json::Value::Bool(true)))
    }

    fn isolated_html(
        &mut self,
        url: &str,
        ready_css: &[&str],
        wait: Duration,
    ) -> Result<String, ScanError> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|err| classify(err, ScanError::Browser))?;
        with_scoped(IsolatedTab(tab), |page| {
            let tab = &page.0;
            tab.navigate_to(url)
                .and_then(|tab| tab.wait_until_navigated())
                .map_err(|err| classify(err, ScanError::Navigation))?;

            let deadline = Instant::now() + wait;
            loop {
                if ready_css.iter().any(|css| tab.find_element(css).is_ok()) {
                    break;
                }
                if Instant::now() >= deadline {
                    return Err(ScanError::MissingElement(ready_css.join(" | ")));
                }
                std::thread::sleep(READY_POLL);
            }
            tab.get_content()
                .map_err(|err| classify(err, ScanError::Script))
        })
    }
}

/// JSON string literal, safe to splice into a script.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// A lost CDP connection is fatal whatever the call was; everything else
/// takes the caller's class.
fn classify(err: impl Display, otherwise: fn(String) -> ScanError) -> ScanError {
    let message = err.to_string();
    let lowered = message.to_lowercase();
    let disconnected = ["connection is closed", "channel closed", "browser has been closed"]
        .iter()
        .any(|marker| lowered.contains(marker));
    if disconnected {
        ScanError::Browser(message)
    } else {
        otherwise(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnect_messages_are_fatal() {
        let err = classify(
            "Unable to make method calls because underlying connection is closed",
            ScanError::Script,
        );
        assert!(err.is_fatal());
        let err = classify("Could not find node with given id", ScanError::Script);
        assert!(!err.is_fatal());
    }

    #[test]
    fn script_strings_are_escaped() {
        assert_eq!(js_string("a[x='1']\"b"), r#""a[x='1']\"b""#);
    }
}
