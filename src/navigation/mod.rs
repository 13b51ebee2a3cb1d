pub mod history;
pub mod route;
pub mod state;
pub mod sync;

pub use history::{HistoryAdapter, MemoryHistory};
#[cfg(feature = "wasm")]
pub use history::BrowserHistory;
pub use route::Route;
pub use state::{
    ContentTicket, FilterMode, GeolocationFix, NavMode, SelectionState, ShopVisitStack,
};
pub use sync::{ChangeCause, NavigationSync, SelectionChange};
