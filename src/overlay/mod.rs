mod engine;
mod fraction;
mod mode;
mod table;

pub use engine::{overlay, Overlay};
pub use fraction::{intersecting_fractions, FractionVector};
pub use mode::Mode;
