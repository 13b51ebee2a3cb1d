//! Keeps [`SelectionState`] and the URL in agreement.
//!
//! Every operation updates the state first and then, when the selection maps
//! to a different path, writes the URL shallowly. History navigation runs
//! the other way: the state is rebuilt from the path alone and nothing is
//! written back.

use crate::core::geo::LatLng;
use crate::data::catalog::Catalog;
use crate::data::feature::Location;
use crate::navigation::history::HistoryAdapter;
use crate::navigation::route::Route;
use crate::navigation::state::{
    FilterMode, GeolocationFix, NavMode, SelectionState, ShopVisitStack,
};
use crate::spatial::geometry::ring_contains;
use crate::{MapError, Result};

/// What triggered a selection change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    LocationSelected,
    ShopSelected,
    Back,
    DrawerClosed,
    Explore,
    Filter,
    Geolocation,
    History,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChange {
    pub previous: SelectionState,
    pub current: SelectionState,
    pub cause: ChangeCause,
}

impl SelectionChange {
    pub fn shop_changed(&self) -> bool {
        self.previous.shop_id != self.current.shop_id
    }

    pub fn location_changed(&self) -> bool {
        self.previous.location_id != self.current.location_id
    }

    pub fn filter_changed(&self) -> bool {
        self.previous.filter_mode != self.current.filter_mode
    }

    pub fn mode_changed(&self) -> bool {
        self.previous.mode() != self.current.mode()
    }
}

pub struct NavigationSync<H: HistoryAdapter> {
    state: SelectionState,
    visits: ShopVisitStack,
    history: H,
}

impl<H: HistoryAdapter> NavigationSync<H> {
    /// Starts from whatever the history's current path describes
    pub fn new(history: H, catalog: &Catalog) -> Self {
        let state = resolve_path(catalog, &history.current_path(), FilterMode::All);
        log::debug!("initial selection {:?}", state.mode());
        Self {
            state,
            visits: ShopVisitStack::default(),
            history,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn mode(&self) -> NavMode {
        self.state.mode()
    }

    pub fn visits(&self) -> &ShopVisitStack {
        &self.visits
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    pub fn select_location(
        &mut self,
        catalog: &Catalog,
        location_id: &str,
    ) -> Result<Option<SelectionChange>> {
        if catalog.location(location_id).is_none() {
            return Err(MapError::UnknownLocation(location_id.to_string()));
        }
        self.visits.clear();
        let next = SelectionState::location(location_id, self.state.filter_mode);
        Ok(self.commit(catalog, next, ChangeCause::LocationSelected, true))
    }

    /// Opens a shop; moving from one shop to another records the previous
    /// one for [`NavigationSync::back`]
    pub fn select_shop(
        &mut self,
        catalog: &Catalog,
        shop_id: &str,
    ) -> Result<Option<SelectionChange>> {
        let shop = catalog
            .shop(shop_id)
            .ok_or_else(|| MapError::UnknownShop(shop_id.to_string()))?;
        if self.state.shop_id.as_deref() == Some(shop_id) {
            return Ok(None);
        }

        if let Some(previous) = self.state.shop_id.clone() {
            self.visits.push(&previous);
        }
        let location_id = shop
            .metadata
            .location_id
            .as_deref()
            .or(self.state.location_id.as_deref())
            .map(str::to_string);
        let next = SelectionState::shop(location_id.as_deref(), shop_id, self.state.filter_mode);
        Ok(self.commit(catalog, next, ChangeCause::ShopSelected, true))
    }

    /// Returns to the previously visited shop, or to the location when the
    /// visit stack is empty
    pub fn back(&mut self, catalog: &Catalog) -> Option<SelectionChange> {
        self.state.shop_id.as_ref()?;

        while let Some(previous) = self.visits.pop() {
            let Some(shop) = catalog.shop(&previous) else {
                log::debug!("visited shop {} no longer exists", previous);
                continue;
            };
            let location_id = shop
                .metadata
                .location_id
                .clone()
                .or_else(|| self.state.location_id.clone());
            let next =
                SelectionState::shop(location_id.as_deref(), &previous, self.state.filter_mode);
            return self.commit(catalog, next, ChangeCause::Back, true);
        }

        let next = self.without_shop();
        self.commit(catalog, next, ChangeCause::Back, true)
    }

    pub fn close_drawer(&mut self, catalog: &Catalog) -> Option<SelectionChange> {
        self.visits.clear();
        self.state.shop_id.as_ref()?;
        let next = self.without_shop();
        self.commit(catalog, next, ChangeCause::DrawerClosed, true)
    }

    pub fn explore(&mut self, catalog: &Catalog) -> Option<SelectionChange> {
        self.visits.clear();
        let next = SelectionState::explore(self.state.filter_mode);
        self.commit(catalog, next, ChangeCause::Explore, true)
    }

    pub fn set_filter_mode(
        &mut self,
        catalog: &Catalog,
        filter_mode: FilterMode,
    ) -> Option<SelectionChange> {
        let next = SelectionState {
            filter_mode,
            ..self.state.clone()
        };
        self.commit(catalog, next, ChangeCause::Filter, false)
    }

    /// Selects the covered city around a geolocation fix, or records that the
    /// user is outside coverage
    pub fn apply_geolocation(
        &mut self,
        catalog: &Catalog,
        fix: GeolocationFix,
        nearby_radius_km: f64,
    ) -> Option<SelectionChange> {
        let position = match fix {
            GeolocationFix::Position(position) if position.is_valid() => position,
            GeolocationFix::Position(position) => {
                log::warn!("ignoring invalid geolocation fix {:?}", position);
                return None;
            }
            GeolocationFix::PermissionBlocked => {
                log::info!("geolocation permission blocked; selection unchanged");
                let next = SelectionState {
                    nearby_mode: false,
                    ..self.state.clone()
                };
                return self.commit(catalog, next, ChangeCause::Geolocation, false);
            }
        };

        self.visits.clear();
        let next = match nearest_location(catalog, &position, nearby_radius_km) {
            Some(location) => SelectionState {
                nearby_mode: true,
                user_position: Some(position),
                ..SelectionState::location(&location.id, self.state.filter_mode)
            },
            None => SelectionState {
                explore_mode: false,
                nearby_mode: true,
                user_position: Some(position),
                ..SelectionState::explore(self.state.filter_mode)
            },
        };
        self.commit(catalog, next, ChangeCause::Geolocation, true)
    }

    /// Browser back/forward landed on `path`
    pub fn on_history_navigated(&mut self, catalog: &Catalog, path: &str) -> Option<SelectionChange> {
        self.visits.clear();
        let next = resolve_path(catalog, path, self.state.filter_mode);
        self.commit(catalog, next, ChangeCause::History, false)
    }

    /// Path the current selection is shared under
    pub fn current_route(&self, catalog: &Catalog) -> Route {
        route_for(catalog, &self.state)
    }

    fn without_shop(&self) -> SelectionState {
        match self.state.location_id.as_deref() {
            Some(location_id) => SelectionState::location(location_id, self.state.filter_mode),
            None => SelectionState::explore(self.state.filter_mode),
        }
    }

    fn commit(
        &mut self,
        catalog: &Catalog,
        next: SelectionState,
        cause: ChangeCause,
        write_url: bool,
    ) -> Option<SelectionChange> {
        if next == self.state {
            return None;
        }
        let previous = std::mem::replace(&mut self.state, next);

        if write_url {
            let path = route_for(catalog, &self.state).to_path();
            if Route::parse(&self.history.current_path()).to_path() != path {
                self.history.push(&path);
            }
        }

        log::debug!("{:?}: {:?} -> {:?}", cause, previous.mode(), self.state.mode());
        Some(SelectionChange {
            previous,
            current: self.state.clone(),
            cause,
        })
    }
}

/// Rebuilds a selection from a path; unknown slugs fall back to the deepest
/// prefix that resolves
pub fn resolve_path(catalog: &Catalog, path: &str, filter_mode: FilterMode) -> SelectionState {
    match Route::parse(path) {
        Route::Root => SelectionState::explore(filter_mode),
        Route::Location { country, city } => match catalog.location_by_slugs(&country, &city) {
            Some(location) => SelectionState::location(&location.id, filter_mode),
            None => {
                log::debug!("no location at /{}/{}", country, city);
                SelectionState::explore(filter_mode)
            }
        },
        Route::Shop {
            country,
            city,
            shop,
            ..
        } => {
            let Some(location) = catalog.location_by_slugs(&country, &city) else {
                log::debug!("no location at /{}/{}", country, city);
                return SelectionState::explore(filter_mode);
            };
            match catalog.shop_by_slug(&location.id, &shop) {
                Some(found) => SelectionState::shop(Some(&location.id), &found.id, filter_mode),
                None => {
                    log::debug!("no shop {} in {}", shop, location.id);
                    SelectionState::location(&location.id, filter_mode)
                }
            }
        }
    }
}

fn route_for(catalog: &Catalog, state: &SelectionState) -> Route {
    let location = state.location_id.as_deref().and_then(|id| catalog.location(id));
    let shop = state.shop_id.as_deref().and_then(|id| catalog.shop(id));
    match (location, shop) {
        (Some(location), Some(shop)) => Route::for_shop(location, shop),
        (Some(location), None) => Route::for_location(location),
        _ => Route::Root,
    }
}

/// Supported location containing `position`, else the closest one whose
/// center lies within `radius_km`
fn nearest_location<'a>(
    catalog: &'a Catalog,
    position: &LatLng,
    radius_km: f64,
) -> Option<&'a Location> {
    let supported = move || {
        catalog
            .locations()
            .iter()
            .filter(move |location| catalog.is_location_supported(location))
    };

    if let Some(inside) = supported().find(|location| ring_contains(&location.boundary, position)) {
        return Some(inside);
    }

    supported()
        .filter_map(|location| {
            let center = location.center?;
            let km = center.distance_to(position) / 1000.0;
            (km <= radius_km).then_some((location, km))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(location, _)| location)
}
