#![doc = "Areal-weighted overlay of polygon attributes"]
mod config;
mod error;
mod geom;
mod overlay;
mod progress;

pub mod io;

#[doc(inline)]
pub use overlay::{intersecting_fractions, overlay, FractionVector, Mode, Overlay};

#[doc(inline)]
pub use geom::{Crs, PolygonSet, SourceIndex};

#[doc(inline)]
pub use config::OverlayConfig;

#[doc(inline)]
pub use error::{OverlayError, Result};

#[doc(inline)]
pub use progress::{track, LogProgress, Progress, Silent, Stage, Tracked};
