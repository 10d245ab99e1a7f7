pub mod grid;
pub mod hit;

pub use grid::{IndexStats, SpatialIndex, SpatialIndexConfig};
pub use hit::{MarqueeMode, hit_test, marquee, topmost_hit};
