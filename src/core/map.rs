#[cfg(feature = "tokio-runtime")]
use crate::animation::{transitions::TransitionId, watchdog::WatchdogOutcome};
use crate::{
    animation::transitions::{TransitionOutcome, TransitionType},
    core::{
        camera::ViewportController,
        config::{EngineOptions, Theme},
        constants::ZOOM_EPSILON,
        geo::LatLng,
        viewport::Viewport,
    },
    data::{
        catalog::Catalog,
        feature::{Location, PointFeature},
    },
    input::events::{EngineEvent, MapEvent},
    layers::{
        manager::{MarkerManager, SyncReport},
        overlay::{InstallOutcome, OverlayManager},
    },
    navigation::{
        history::HistoryAdapter,
        route::Route,
        state::{ContentTicket, FilterMode, GeolocationFix, NavMode, SelectionState},
        sync::{ChangeCause, NavigationSync, SelectionChange},
    },
    prelude::Instant,
    rendering::surface::MapSurface,
    spatial::clustering::Clustering,
    Result,
};

/// One map instance: the renderer surface plus everything that keeps it in
/// step with the selection.
///
/// All state is owned here and mutated from a single thread. Each public
/// method is one update cycle: selection first, then markers and camera in
/// the same call.
pub struct MapEngine<S: MapSurface, H: HistoryAdapter> {
    surface: S,
    options: EngineOptions,
    catalog: Catalog,
    clustering: Clustering,
    markers: MarkerManager,
    overlays: OverlayManager,
    camera: ViewportController,
    nav: NavigationSync<H>,
    theme: Theme,
    /// Marker recomputation waits while a zoom gesture is running
    zoom_in_progress: bool,
    refresh_pending: bool,
    last_sync_zoom: Option<f64>,
    events: Vec<EngineEvent>,
}

impl<S: MapSurface, H: HistoryAdapter> MapEngine<S, H> {
    /// Builds an engine whose initial selection comes from the history's
    /// current path. Nothing touches the surface until [`MapEngine::mount`].
    pub fn new(surface: S, history: H, catalog: Catalog, options: EngineOptions) -> Result<Self> {
        options.validate()?;

        let viewport = Viewport::new(options.camera.world_center, options.camera.world_zoom);
        let camera = ViewportController::new(options.camera.clone(), viewport);
        let nav = NavigationSync::new(history, &catalog);
        let theme = Theme::default();

        Ok(Self {
            surface,
            clustering: Clustering::new(options.clustering.clone()),
            markers: MarkerManager::new(options.markers.clone(), theme),
            overlays: OverlayManager::new(options.overlay.clone(), theme),
            options,
            catalog,
            camera,
            nav,
            theme,
            zoom_in_progress: false,
            refresh_pending: false,
            last_sync_zoom: None,
            events: Vec::new(),
        })
    }

    /// First draw: overlays, markers, and the camera for the initial selection
    pub fn mount(&mut self, now: Instant) {
        if let InstallOutcome::Deferred = self.overlays.install(&mut self.surface, &self.catalog) {
            log::info!("overlays wait for the style-loaded signal");
        }
        self.refresh_markers();

        let current = self.nav.state().clone();
        let initial = SelectionChange {
            previous: SelectionState::explore(current.filter_mode),
            current,
            cause: ChangeCause::History,
        };
        if initial.previous != initial.current {
            self.apply_change(initial, now);
        }
    }

    /// Replaces the shop list (new data arrived); support flags may change
    /// so the overlays are rebuilt too
    pub fn set_shops(&mut self, shops: Vec<PointFeature>) {
        self.catalog.set_shops(shops);
        if let Some(id) = self.nav.state().shop_id.as_deref() {
            if self.catalog.shop(id).is_none() {
                log::debug!("selected shop {} is not in the new data", id);
            }
        }
        self.refresh_markers();
        self.overlays.install(&mut self.surface, &self.catalog);
    }

    /// Selects a location; returns whether the selection changed
    pub fn select_location(&mut self, location_id: &str, now: Instant) -> Result<bool> {
        let change = self.nav.select_location(&self.catalog, location_id)?;
        Ok(self.apply(change, now))
    }

    /// Selects a shop; re-selecting the selected shop does nothing
    pub fn select_shop(&mut self, shop_id: &str, now: Instant) -> Result<bool> {
        let change = self.nav.select_shop(&self.catalog, shop_id)?;
        Ok(self.apply(change, now))
    }

    /// In-app back from the shop drawer
    pub fn back(&mut self, now: Instant) -> bool {
        let change = self.nav.back(&self.catalog);
        self.apply(change, now)
    }

    pub fn close_drawer(&mut self, now: Instant) -> bool {
        let change = self.nav.close_drawer(&self.catalog);
        self.apply(change, now)
    }

    pub fn explore(&mut self, now: Instant) -> bool {
        let change = self.nav.explore(&self.catalog);
        self.apply(change, now)
    }

    /// Switches between all and recommended shops, then refits the camera
    pub fn apply_filter(&mut self, filter_mode: FilterMode, now: Instant) -> bool {
        let change = self.nav.set_filter_mode(&self.catalog, filter_mode);
        self.apply(change, now)
    }

    pub fn apply_geolocation(&mut self, fix: GeolocationFix, now: Instant) -> bool {
        let radius_km = self.options.camera.nearby_radius_km;
        let change = self.nav.apply_geolocation(&self.catalog, fix, radius_km);
        self.apply(change, now)
    }

    /// Light/dark switch; paint only, nothing is recreated
    pub fn set_theme(&mut self, theme: Theme) {
        if self.theme == theme {
            return;
        }
        self.theme = theme;
        let restyled = self.markers.set_theme(&mut self.surface, theme);
        self.overlays.apply_theme(&mut self.surface, theme);
        log::debug!("theme {:?} applied to {} markers", theme, restyled);
    }

    /// Feeds one renderer or host signal through the engine
    pub fn handle_event(&mut self, event: MapEvent, now: Instant) -> Result<()> {
        match event {
            MapEvent::MarkerClick { shop_id } => {
                self.select_shop(&shop_id, now)?;
                self.events.push(EngineEvent::ShopSelected { shop_id });
            }
            MapEvent::ClusterClick { cluster_id } => {
                match self.clustering.expansion_target(&cluster_id) {
                    Some(target) => {
                        self.camera.fly_to(
                            &mut self.surface,
                            target,
                            TransitionType::ClusterExpansion,
                            now,
                        );
                    }
                    None => log::debug!("cluster {} is gone", cluster_id),
                }
            }
            MapEvent::CountryClick { name, code } => {
                if let Some((name, code)) = self.overlays.country_clicked(&self.catalog, &name, &code) {
                    log::debug!("unsupported country {} clicked", code);
                    self.events
                        .push(EngineEvent::UnsupportedCountryClicked { name, code });
                }
            }
            MapEvent::CountryHover { code } => {
                self.overlays
                    .country_hovered(&mut self.surface, &self.catalog, code.as_deref());
            }
            MapEvent::ZoomStart { .. } => {
                self.zoom_in_progress = true;
            }
            MapEvent::ZoomEnd { zoom } => {
                self.zoom_in_progress = false;
                let center = self.camera.viewport().center;
                self.camera.observe(center, zoom);
                if !self.camera.is_transitioning() {
                    self.settle_markers();
                }
            }
            MapEvent::ViewChanged { center, zoom } => {
                self.camera.observe(center, zoom);
                if self.zoom_in_progress || self.camera.is_transitioning() {
                    if self.zoom_moved() {
                        self.refresh_pending = true;
                    }
                } else {
                    self.settle_markers();
                }
            }
            MapEvent::Idle => {
                self.zoom_in_progress = false;
                self.settle_markers();
            }
            MapEvent::StyleLoaded => {
                if let Some(outcome) = self.overlays.on_style_loaded(&mut self.surface, &self.catalog) {
                    log::debug!("style loaded: {:?}", outcome);
                }
            }
            MapEvent::TransitionEnd { id } => {
                if let Some(outcome) = self.camera.on_transition_end(id) {
                    self.events.push(EngineEvent::TransitionComplete {
                        id: outcome.id,
                        timed_out: false,
                    });
                    self.settle_markers();
                }
            }
            MapEvent::LogoLoaded { url, ok } => {
                self.markers.on_logo_loaded(&mut self.surface, &url, ok);
            }
            MapEvent::HistoryNavigated { path } => {
                let change = self.nav.on_history_navigated(&self.catalog, &path);
                self.apply(change, now);
            }
        }
        Ok(())
    }

    /// Releases a transition whose completion signal never came
    pub fn tick(&mut self, now: Instant) {
        if let Some(outcome) = self.camera.poll_timeout(now) {
            self.timed_out(outcome);
        }
    }

    /// Applies the result of [`await_transition`] for transition `watched`.
    ///
    /// A completion goes through the normal transition-end path; a fired
    /// ceiling or dropped sender releases `watched` if it is still current.
    ///
    /// [`await_transition`]: crate::animation::watchdog::await_transition
    #[cfg(feature = "tokio-runtime")]
    pub fn on_watchdog(
        &mut self,
        watched: TransitionId,
        outcome: WatchdogOutcome,
        now: Instant,
    ) -> Result<()> {
        match outcome {
            WatchdogOutcome::Completed(id) => self.handle_event(MapEvent::TransitionEnd { id }, now),
            WatchdogOutcome::TimedOut | WatchdogOutcome::Abandoned => {
                if let Some(outcome) = self.camera.expire(watched) {
                    self.timed_out(outcome);
                }
                Ok(())
            }
        }
    }

    /// Takes the notifications produced since the last drain
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether content requested under `ticket` still belongs on screen
    pub fn is_current(&self, ticket: &ContentTicket) -> bool {
        self.nav.state().matches(ticket)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn selection(&self) -> &SelectionState {
        self.nav.state()
    }

    pub fn mode(&self) -> NavMode {
        self.nav.mode()
    }

    pub fn route(&self) -> Route {
        self.nav.current_route(&self.catalog)
    }

    pub fn viewport(&self) -> &Viewport {
        self.camera.viewport()
    }

    pub fn is_transitioning(&self) -> bool {
        self.camera.is_transitioning()
    }

    pub fn markers(&self) -> &MarkerManager {
        &self.markers
    }

    pub fn overlays(&self) -> &OverlayManager {
        &self.overlays
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn navigation(&self) -> &NavigationSync<H> {
        &self.nav
    }

    /// The history backend, for hosts that drive back/forward themselves
    pub fn history_mut(&mut self) -> &mut H {
        self.nav.history_mut()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    fn timed_out(&mut self, outcome: TransitionOutcome) {
        log::debug!("{:?} transition {} timed out", outcome.transition_type, outcome.id);
        self.events.push(EngineEvent::TransitionComplete {
            id: outcome.id,
            timed_out: true,
        });
        self.settle_markers();
    }

    fn apply(&mut self, change: Option<SelectionChange>, now: Instant) -> bool {
        match change {
            Some(change) => {
                self.apply_change(change, now);
                true
            }
            None => false,
        }
    }

    /// Brings markers and camera in line with a committed selection change
    fn apply_change(&mut self, change: SelectionChange, now: Instant) {
        let current = change.current.clone();
        self.markers
            .set_selected(&mut self.surface, current.shop_id.as_deref());

        if change.filter_changed() {
            // New visible set, then frame it; supersedes any flight in progress
            self.refresh_markers();
            let positions = self.filtered_positions(current.location_id.as_deref());
            self.camera.fit_to(&mut self.surface, &positions, now);
        } else {
            match current.mode() {
                NavMode::ShopSelected if change.shop_changed() => {
                    let position = current
                        .shop_id
                        .as_deref()
                        .and_then(|id| self.catalog.shop(id))
                        .and_then(PointFeature::valid_position);
                    self.camera.focus_shop(&mut self.surface, position, now);
                }
                NavMode::LocationSelected if change.location_changed() => {
                    if let Some(location) =
                        current.location_id.as_deref().and_then(|id| self.catalog.location(id))
                    {
                        let positions = location_positions(&self.catalog, location);
                        self.camera
                            .focus_location(&mut self.surface, location, &positions, now);
                    }
                }
                NavMode::Explore if change.mode_changed() => {
                    self.camera.explore(&mut self.surface, now);
                }
                NavMode::NearbyUnsupported => {
                    if let Some(position) = current.user_position {
                        self.camera.focus_point(&mut self.surface, position, now);
                    }
                }
                _ => {}
            }
        }

        self.events.push(EngineEvent::SelectionChanged(current));
    }

    /// Reclusters the visible shops and syncs the marker registry; deferred
    /// while a zoom gesture runs
    fn refresh_markers(&mut self) -> Option<SyncReport> {
        if self.zoom_in_progress {
            self.refresh_pending = true;
            return None;
        }
        self.refresh_pending = false;

        let viewport = self.camera.viewport().clone();
        let filter_mode = self.nav.state().filter_mode;
        let output = self.clustering.cluster(
            self.catalog
                .shops()
                .iter()
                .filter(move |shop| filter_mode.admits(shop)),
            &viewport,
        );
        let report = self.markers.sync(&mut self.surface, &output, viewport.zoom);
        self.last_sync_zoom = Some(viewport.zoom);
        Some(report)
    }

    fn settle_markers(&mut self) {
        if self.refresh_pending || self.zoom_moved() {
            self.refresh_markers();
        }
    }

    fn zoom_moved(&self) -> bool {
        let zoom = self.camera.viewport().zoom;
        !matches!(self.last_sync_zoom, Some(synced) if (synced - zoom).abs() < ZOOM_EPSILON)
    }

    fn filtered_positions(&self, location_id: Option<&str>) -> Vec<LatLng> {
        let filter_mode = self.nav.state().filter_mode;
        self.catalog
            .shops()
            .iter()
            .filter(|shop| filter_mode.admits(shop))
            .filter(|shop| location_id.is_none() || shop.metadata.location_id.as_deref() == location_id)
            .filter_map(PointFeature::valid_position)
            .collect()
    }
}

fn location_positions(catalog: &Catalog, location: &Location) -> Vec<LatLng> {
    catalog
        .shops_in_location(&location.id)
        .filter_map(PointFeature::valid_position)
        .collect()
}
