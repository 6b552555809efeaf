pub mod placement;

pub use placement::{place_foliage, Anchor, Foliage, FoliageParams};
