use crate::core::geo::LatLng;
use crate::data::feature::PointFeature;
use serde::{Deserialize, Serialize};

/// Which shops the map shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    All,
    Recommended,
}

impl FilterMode {
    pub fn admits(&self, feature: &PointFeature) -> bool {
        match self {
            Self::All => true,
            Self::Recommended => feature.metadata.recommended,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavMode {
    Explore,
    LocationSelected,
    ShopSelected,
    /// The user's position lies outside every covered city
    NearbyUnsupported,
}

/// The single navigable selection.
///
/// `shop_id` set implies the shop's location is (or becomes) the selected
/// location when the shop has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionState {
    pub location_id: Option<String>,
    pub shop_id: Option<String>,
    pub filter_mode: FilterMode,
    pub explore_mode: bool,
    pub nearby_mode: bool,
    pub user_position: Option<LatLng>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            location_id: None,
            shop_id: None,
            filter_mode: FilterMode::All,
            explore_mode: true,
            nearby_mode: false,
            user_position: None,
        }
    }
}

impl SelectionState {
    pub fn explore(filter_mode: FilterMode) -> Self {
        Self {
            filter_mode,
            ..Self::default()
        }
    }

    pub fn location(location_id: &str, filter_mode: FilterMode) -> Self {
        Self {
            location_id: Some(location_id.to_string()),
            explore_mode: false,
            ..Self::explore(filter_mode)
        }
    }

    pub fn shop(location_id: Option<&str>, shop_id: &str, filter_mode: FilterMode) -> Self {
        Self {
            location_id: location_id.map(str::to_string),
            shop_id: Some(shop_id.to_string()),
            explore_mode: false,
            ..Self::explore(filter_mode)
        }
    }

    pub fn mode(&self) -> NavMode {
        if self.shop_id.is_some() {
            NavMode::ShopSelected
        } else if self.location_id.is_some() {
            NavMode::LocationSelected
        } else if self.nearby_mode && self.user_position.is_some() {
            NavMode::NearbyUnsupported
        } else {
            NavMode::Explore
        }
    }

    /// Token for a content request issued under this selection
    pub fn ticket(&self) -> ContentTicket {
        ContentTicket {
            location_id: self.location_id.clone(),
            shop_id: self.shop_id.clone(),
        }
    }

    /// Whether a response requested under `ticket` still applies
    pub fn matches(&self, ticket: &ContentTicket) -> bool {
        self.location_id == ticket.location_id && self.shop_id == ticket.shop_id
    }
}

/// Selection a content request was issued for; a response whose ticket no
/// longer matches the current selection is stale
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentTicket {
    pub location_id: Option<String>,
    pub shop_id: Option<String>,
}

/// Shops visited by moving directly from one shop to another
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopVisitStack {
    entries: Vec<String>,
}

impl ShopVisitStack {
    pub fn push(&mut self, shop_id: &str) {
        if self.peek() != Some(shop_id) {
            self.entries.push(shop_id.to_string());
        }
    }

    pub fn pop(&mut self) -> Option<String> {
        self.entries.pop()
    }

    pub fn peek(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of a geolocation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeolocationFix {
    Position(LatLng),
    PermissionBlocked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes() {
        assert_eq!(SelectionState::default().mode(), NavMode::Explore);
        assert_eq!(
            SelectionState::location("nyc", FilterMode::All).mode(),
            NavMode::LocationSelected
        );
        assert_eq!(
            SelectionState::shop(Some("nyc"), "bb", FilterMode::All).mode(),
            NavMode::ShopSelected
        );

        let nearby = SelectionState {
            nearby_mode: true,
            explore_mode: false,
            user_position: Some(LatLng::new(10.0, 10.0)),
            ..SelectionState::default()
        };
        assert_eq!(nearby.mode(), NavMode::NearbyUnsupported);
    }

    #[test]
    fn test_ticket_goes_stale_on_selection_change() {
        let state = SelectionState::shop(Some("nyc"), "bb", FilterMode::All);
        let ticket = state.ticket();
        assert!(state.matches(&ticket));
        // filter changes do not invalidate content
        let filtered = SelectionState {
            filter_mode: FilterMode::Recommended,
            ..state.clone()
        };
        assert!(filtered.matches(&ticket));
        assert!(!SelectionState::shop(Some("nyc"), "other", FilterMode::All).matches(&ticket));
    }

    #[test]
    fn test_visit_stack_ignores_repeats() {
        let mut stack = ShopVisitStack::default();
        stack.push("a");
        stack.push("a");
        stack.push("b");
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop().as_deref(), Some("b"));
        assert_eq!(stack.peek(), Some("a"));
        stack.clear();
        assert!(stack.is_empty());
    }

    #[test]
    fn test_recommended_filter() {
        let plain = PointFeature::at("a", 0.0, 0.0);
        let starred = PointFeature::at("b", 0.0, 0.0).recommended(true);
        assert!(FilterMode::All.admits(&plain));
        assert!(!FilterMode::Recommended.admits(&plain));
        assert!(FilterMode::Recommended.admits(&starred));
    }
}
