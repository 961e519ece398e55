mod bbox;
mod geom;
mod index;
mod proj;

pub use geom::PolygonSet;
pub use index::SourceIndex;
pub use proj::Crs;
