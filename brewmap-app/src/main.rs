use anyhow::{Context, Result};
use brewmap::prelude::*;
use serde::Deserialize;

const DEFAULT_CATALOG: &str = include_str!("../fixtures/catalog.json");
const DEFAULT_SESSION: &str = include_str!("../fixtures/session.json");

/// One scripted user or renderer action
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Step {
    SelectLocation { id: String },
    SelectShop { id: String },
    Back,
    CloseDrawer,
    Explore,
    Filter { mode: FilterMode },
    Locate { lat: f64, lng: f64 },
    Theme { theme: Theme },
    Event { event: MapEvent },
    /// Reports the most recent fly-to as finished
    FinishTransition,
    /// Advances the session clock and lets timeouts fire
    Wait { ms: u64 },
}

/// Replays a session against a headless surface and in-memory history.
///
/// Usage: `brewmap-app [catalog.json] [session.json]`
fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let catalog_json = read_or(args.next(), DEFAULT_CATALOG)?;
    let session_json = read_or(args.next(), DEFAULT_SESSION)?;

    let catalog = Catalog::from_json(&catalog_json).context("parsing catalog")?;
    let steps: Vec<Step> = serde_json::from_str(&session_json).context("parsing session")?;
    log::info!(
        "{} shops in {} locations, {} steps",
        catalog.shops().len(),
        catalog.locations().len(),
        steps.len()
    );

    let options = EngineProfile::Balanced.resolve();
    let mut map = MapEngine::new(RecordingSurface::new(), MemoryHistory::new("/"), catalog, options)
        .context("building engine")?;

    let start = Instant::now();
    let mut elapsed = Duration::ZERO;
    map.mount(start);

    for (i, step) in steps.into_iter().enumerate() {
        log::debug!("step {}: {:?}", i, step);
        let now = start + elapsed;
        match step {
            Step::SelectLocation { id } => {
                map.select_location(&id, now)?;
            }
            Step::SelectShop { id } => {
                map.select_shop(&id, now)?;
            }
            Step::Back => {
                map.back(now);
            }
            Step::CloseDrawer => {
                map.close_drawer(now);
            }
            Step::Explore => {
                map.explore(now);
            }
            Step::Filter { mode } => {
                map.apply_filter(mode, now);
            }
            Step::Locate { lat, lng } => {
                map.apply_geolocation(GeolocationFix::Position(LatLng::new(lat, lng)), now);
            }
            Step::Theme { theme } => map.set_theme(theme),
            Step::Event { event } => map
                .handle_event(event, now)
                .with_context(|| format!("step {}", i))?,
            Step::FinishTransition => {
                let last = map.surface().last_fly_to();
                match last {
                    Some(fly) => map.handle_event(
                        MapEvent::TransitionEnd {
                            id: fly.transition_id,
                        },
                        now,
                    )?,
                    None => log::warn!("step {}: no transition to finish", i),
                }
            }
            Step::Wait { ms } => {
                elapsed += Duration::from_millis(ms);
                map.tick(start + elapsed);
            }
        }

        for event in map.drain_events() {
            log::info!("step {}: {:?}", i, event);
        }
    }

    report(&map)
}

fn read_or(path: Option<String>, fallback: &str) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("reading {}", path)),
        None => Ok(fallback.to_string()),
    }
}

fn report(map: &MapEngine<RecordingSurface, MemoryHistory>) -> Result<()> {
    let mut calls: HashMap<&'static str, usize> = HashMap::default();
    for call in map.surface().calls() {
        *calls.entry(call_kind(call)).or_default() += 1;
    }
    let mut calls: Vec<_> = calls.into_iter().collect();
    calls.sort_unstable();

    println!("selection: {}", serde_json::to_string(map.selection())?);
    println!("mode:      {:?}", map.mode());
    println!("url:       {}", map.navigation().history().current_path());
    println!(
        "camera:    {:?} @ z{:.2}",
        map.viewport().center,
        map.viewport().zoom
    );
    println!(
        "markers:   {} ({:?} tier)",
        map.markers().len(),
        map.markers().tier()
    );
    for (kind, count) in calls {
        println!("  {:<14} {}", kind, count);
    }
    Ok(())
}

fn call_kind(call: &SurfaceCall) -> &'static str {
    match call {
        SurfaceCall::AddMarker { .. } => "add_marker",
        SurfaceCall::PatchMarker { .. } => "patch_marker",
        SurfaceCall::RemoveMarker { .. } => "remove_marker",
        SurfaceCall::RequestImage { .. } => "request_image",
        SurfaceCall::AddSource { .. } => "add_source",
        SurfaceCall::RemoveSource { .. } => "remove_source",
        SurfaceCall::AddLayer { .. } => "add_layer",
        SurfaceCall::RemoveLayer { .. } => "remove_layer",
        SurfaceCall::SetPaint { .. } => "set_paint",
        SurfaceCall::SetCursor(_) => "set_cursor",
        SurfaceCall::FlyTo(_) => "fly_to",
    }
}
