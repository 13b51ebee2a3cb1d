pub mod recording;
pub mod surface;

// Re-export main types
pub use recording::{RecordingSurface, SurfaceCall};
pub use surface::{
    CursorStyle, FlyTo, LayerKind, LayerSpec, MapSurface, MarkerPatch, MarkerSpec, SourceData,
    SurfaceMarkerId,
};
