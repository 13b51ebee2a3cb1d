//! Browser-history boundary.
//!
//! Writes are shallow: they change the address bar without asking the host
//! to reload anything. Back/forward navigation is reported to the engine as
//! [`MapEvent::HistoryNavigated`](crate::input::events::MapEvent::HistoryNavigated).

pub trait HistoryAdapter {
    /// Path of the current entry, including any query or fragment
    fn current_path(&self) -> String;
    /// Adds an entry
    fn push(&mut self, path: &str);
    /// Rewrites the current entry
    fn replace(&mut self, path: &str);
}

/// In-process history stack with back/forward
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    pub fn new(initial_path: &str) -> Self {
        Self {
            entries: vec![initial_path.to_string()],
            index: 0,
        }
    }

    /// Steps back; returns the new current path
    pub fn back(&mut self) -> Option<String> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].clone())
    }

    /// Steps forward; returns the new current path
    pub fn forward(&mut self) -> Option<String> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].clone())
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl HistoryAdapter for MemoryHistory {
    fn current_path(&self) -> String {
        self.entries[self.index].clone()
    }

    fn push(&mut self, path: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(path.to_string());
        self.index += 1;
    }

    fn replace(&mut self, path: &str) {
        self.entries[self.index] = path.to_string();
    }
}

#[cfg(feature = "wasm")]
pub use browser::BrowserHistory;

#[cfg(feature = "wasm")]
mod browser {
    use super::HistoryAdapter;
    use wasm_bindgen::JsValue;

    /// `window.history` backed adapter
    #[derive(Debug, Default)]
    pub struct BrowserHistory;

    impl BrowserHistory {
        fn history() -> Option<web_sys::History> {
            web_sys::window()?.history().ok()
        }
    }

    impl HistoryAdapter for BrowserHistory {
        fn current_path(&self) -> String {
            let Some(location) = web_sys::window().map(|w| w.location()) else {
                return "/".to_string();
            };
            let path = location.pathname().unwrap_or_else(|_| "/".to_string());
            let search = location.search().unwrap_or_default();
            format!("{}{}", path, search)
        }

        fn push(&mut self, path: &str) {
            let result = Self::history()
                .map(|h| h.push_state_with_url(&JsValue::NULL, "", Some(path)));
            if !matches!(result, Some(Ok(()))) {
                log::warn!("history push of {} failed", path);
            }
        }

        fn replace(&mut self, path: &str) {
            let result = Self::history()
                .map(|h| h.replace_state_with_url(&JsValue::NULL, "", Some(path)));
            if !matches!(result, Some(Ok(()))) {
                log::warn!("history replace of {} failed", path);
            }
        }
    }
}
