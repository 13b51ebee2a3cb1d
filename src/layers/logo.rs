use crate::layers::marker::LogoState;
use lru::LruCache;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoStatus {
    Loading,
    Loaded,
    Failed,
}

/// Remembers logo load results so a marker recreated after a zoom or filter
/// change shows its logo at once instead of requesting it again
pub struct LogoCache {
    entries: LruCache<String, LogoStatus>,
}

impl LogoCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn status(&mut self, url: &str) -> Option<LogoStatus> {
        self.entries.get(&url.to_string()).copied()
    }

    /// Logo state for a marker showing `url`, and whether the image still
    /// has to be requested from the renderer
    pub fn prepare(&mut self, url: Option<&str>) -> (LogoState, bool) {
        let Some(url) = url else {
            return (LogoState::Placeholder, false);
        };
        match self.status(url) {
            Some(LogoStatus::Loaded) => (LogoState::Ready(url.to_string()), false),
            Some(LogoStatus::Failed) => (LogoState::Placeholder, false),
            Some(LogoStatus::Loading) => (LogoState::Loading, false),
            None => {
                self.entries.put(url.to_string(), LogoStatus::Loading);
                (LogoState::Loading, true)
            }
        }
    }

    /// Current state for `url` without starting a request
    pub fn state_for(&mut self, url: Option<&str>) -> LogoState {
        let Some(url) = url else {
            return LogoState::Placeholder;
        };
        match self.status(url) {
            Some(LogoStatus::Loaded) => LogoState::Ready(url.to_string()),
            Some(LogoStatus::Failed) => LogoState::Placeholder,
            Some(LogoStatus::Loading) | None => LogoState::Loading,
        }
    }

    pub fn resolve(&mut self, url: &str, ok: bool) {
        let status = if ok {
            LogoStatus::Loaded
        } else {
            log::debug!("logo {} failed to load; using placeholder", url);
            LogoStatus::Failed
        };
        self.entries.put(url.to_string(), status);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_use_requests_once() {
        let mut cache = LogoCache::new(8);
        assert_eq!(cache.prepare(Some("a.png")), (LogoState::Loading, true));
        assert_eq!(cache.prepare(Some("a.png")), (LogoState::Loading, false));

        cache.resolve("a.png", true);
        assert_eq!(
            cache.prepare(Some("a.png")),
            (LogoState::Ready("a.png".into()), false)
        );
    }

    #[test]
    fn test_failure_and_missing_url_use_placeholder() {
        let mut cache = LogoCache::new(8);
        cache.prepare(Some("b.png"));
        cache.resolve("b.png", false);
        assert_eq!(cache.state_for(Some("b.png")), LogoState::Placeholder);
        assert_eq!(cache.prepare(None), (LogoState::Placeholder, false));
    }

    #[test]
    fn test_evicts_least_recent() {
        let mut cache = LogoCache::new(2);
        cache.resolve("a", true);
        cache.resolve("b", true);
        cache.status("a");
        cache.resolve("c", true);
        assert_eq!(cache.len(), 2);
        assert!(cache.status("b").is_none());
        assert_eq!(cache.status("a"), Some(LogoStatus::Loaded));
    }
}
