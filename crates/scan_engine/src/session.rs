use std::time::Duration;

use crate::ScanError;

/// Browser surface the scan driver needs.
///
/// Element handles never cross this boundary: every read returns a fresh
/// markup snapshot and every click re-acquires its target inside the page,
/// so nothing held by the caller can go stale after a navigation.
pub trait ResultsSession {
    fn navigate(&mut self, url: &str) -> Result<(), ScanError>;

    /// Block until `css` matches or `timeout` elapses.
    fn wait_for(&mut self, css: &str, timeout: Duration) -> Result<(), ScanError>;

    /// Current document markup.
    fn html(&mut self) -> Result<String, ScanError>;

    /// Click the card whose link resolves to `url`, falling back to the
    /// `index`-th element matching `card_css` when no link matches.
    fn click_card(&mut self, card_css: &str, url: &str, index: usize) -> Result<(), ScanError>;

    /// Scroll the first element matching `css` to its bottom.
    fn scroll_to_bottom(&mut self, css: &str) -> Result<(), ScanError>;

    /// Click the first element matching `css`; `Ok(false)` when there is none.
    fn click_if_present(&mut self, css: &str) -> Result<bool, ScanError>;

    /// Load `url` in a separate tab, wait up to `wait` for any of `ready_css`,
    /// and return that tab's markup. The tab is closed before returning.
    fn isolated_html(
        &mut self,
        url: &str,
        ready_css: &[&str],
        wait: Duration,
    ) -> Result<String, ScanError>;
}

/// A page that must be closed when its owner is done with it.
pub trait Closable {
    fn close(&self);
}

/// Owns a secondary page and closes it on drop, on every exit path.
pub struct ScopedTab<T: Closable> {
    inner: T,
}

impl<T: Closable> ScopedTab<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn get(&self) -> &T {
        &self.inner
    }
}

impl<T: Closable> Drop for ScopedTab<T> {
    fn drop(&mut self) {
        self.inner.close();
    }
}

/// Run `work` against a freshly opened page, closing it afterwards.
pub fn with_scoped<T, R, F>(page: T, work: F) -> R
where
    T: Closable,
    F: FnOnce(&T) -> R,
{
    let guard = ScopedTab::new(page);
    work(guard.get())
}
