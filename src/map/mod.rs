mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use projection::Viewport;
pub use renderer::{marker_radius, LineString, Lod, MapLayers, MapRenderer, Marker};
pub use spatial::SpatialGrid;
