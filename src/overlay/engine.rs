use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::{Array1, Array2};
use polars::prelude::{Column, DataFrame, NamedFrom};
use tracing::{debug, info};

use crate::{
    config::OverlayConfig,
    error::{OverlayError, Result},
    geom::{Crs, PolygonSet, SourceIndex},
    overlay::{fraction::intersecting_fractions, table::AttributeMatrix, Mode},
    progress::{track, LogProgress, Progress, Silent, Stage},
};

/// A configured areal-weighted overlay of `sources` onto `targets`.
///
/// ```ignore
/// let out = Overlay::new(&blocks, &zones)
///     .weights(&population)
///     .mode(Mode::ScaleVariant)
///     .run(&counts)?;
/// ```
///
/// Without an explicit [`Overlay::mode`] the run is [`Mode::ScaleInvariant`]
/// (weighted mean). Without [`Overlay::progress`] progress goes to
/// [`LogProgress`] unless [`Overlay::quiet`] is set.
pub struct Overlay<'a> {
    sources: &'a PolygonSet,
    targets: &'a PolygonSet,
    weights: Option<&'a [f64]>,
    mode: Mode,
    quiet: bool,
    equal_area: Crs,
    progress: Option<&'a mut dyn Progress>,
    cancel: Option<&'a AtomicBool>,
}

/// Inputs after validation, projection and indexing.
struct Prepared {
    sources: PolygonSet,
    targets: PolygonSet,
    source_areas: Vec<f64>,
    index: SourceIndex,
    weights: Array1<f64>,
}

impl<'a> Overlay<'a> {
    pub fn new(sources: &'a PolygonSet, targets: &'a PolygonSet) -> Self {
        Self {
            sources,
            targets,
            weights: None,
            mode: Mode::default(),
            quiet: false,
            equal_area: Crs::CONUS_ALBERS,
            progress: None,
            cancel: None,
        }
    }

    /// Mode, quiet flag and equal-area CRS taken from `config`.
    pub fn from_config(sources: &'a PolygonSet, targets: &'a PolygonSet, config: &OverlayConfig) -> Self {
        Self::new(sources, targets)
            .mode(config.mode)
            .quiet(config.quiet)
            .equal_area(config.equal_area.clone())
    }

    /// One non-negative weight per source polygon. Defaults to all ones.
    pub fn weights(mut self, weights: &'a [f64]) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Suppress all progress reporting. Does not change the output.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// CRS that areas are measured in. Must be equal-area for the result to mean anything.
    pub fn equal_area(mut self, crs: Crs) -> Self {
        self.equal_area = crs;
        self
    }

    pub fn progress(mut self, progress: &'a mut dyn Progress) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Checked between targets; once set the run stops with [`OverlayError::Cancelled`].
    pub fn cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Aggregate `attributes` (one row per source) onto the targets.
    ///
    /// Returns one row per target, in target order, with the same columns as
    /// `attributes`, all `Float64`. Targets that overlap no weighted source
    /// get a row of zeros.
    pub fn run(mut self, attributes: &DataFrame) -> Result<DataFrame> {
        let weights = self.validate_weights()?;
        let attributes = AttributeMatrix::from_frame(attributes)?;
        if attributes.rows() != self.sources.len() {
            return Err(OverlayError::LengthMismatch {
                collection: "attribute rows",
                expected: self.sources.len(),
                found: attributes.rows(),
            })
        }

        match (self.quiet, self.progress.take()) {
            (true, _) => self.aggregate(weights, &attributes, &mut Silent),
            (false, Some(progress)) => self.aggregate(weights, &attributes, progress),
            (false, None) => self.aggregate(weights, &attributes, &mut LogProgress::default()),
        }
    }

    /// The sparse crosswalk between targets and sources: one row per pair
    /// with positive overlap, with the source's area share inside the target
    /// (`fraction`) and that share times the source weight (`weight`).
    pub fn crosswalk(mut self) -> Result<DataFrame> {
        let weights = self.validate_weights()?;

        match (self.quiet, self.progress.take()) {
            (true, _) => self.pairs(weights, &mut Silent),
            (false, Some(progress)) => self.pairs(weights, progress),
            (false, None) => self.pairs(weights, &mut LogProgress::default()),
        }
    }

    fn validate_weights(&self) -> Result<Array1<f64>> {
        let n = self.sources.len();
        let Some(weights) = self.weights else { return Ok(Array1::ones(n)) };

        if weights.len() != n {
            return Err(OverlayError::LengthMismatch { collection: "weights", expected: n, found: weights.len() })
        }
        if let Some((index, &value)) = weights.iter().enumerate().find(|(_, w)| !w.is_finite() || **w < 0.0) {
            return Err(OverlayError::InvalidWeight { index, value })
        }

        Ok(Array1::from_vec(weights.to_vec()))
    }

    /// Project both sets into the equal-area CRS and index the sources.
    fn prepare(&self, weights: Array1<f64>, progress: &mut dyn Progress) -> Result<Prepared> {
        // Both CRSs are checked before either set is projected.
        self.sources.crs().ok_or(OverlayError::MissingCrs { collection: "source polygons" })?;
        self.targets.crs().ok_or(OverlayError::MissingCrs { collection: "target polygons" })?;

        progress.stage(Stage::Projecting);
        info!(
            sources = self.sources.len(),
            targets = self.targets.len(),
            equal_area = %self.equal_area,
            mode = %self.mode,
            "[overlay] projecting geometries"
        );
        let sources = self.sources.to_crs(&self.equal_area, "source polygons")?;
        let targets = self.targets.to_crs(&self.equal_area, "target polygons")?;

        progress.stage(Stage::Indexing);
        let index = SourceIndex::new(sources.shapes());
        let source_areas = sources.areas();

        Ok(Prepared { sources, targets, source_areas, index, weights })
    }

    fn check_cancelled(&self, completed: usize, total: usize) -> Result<()> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(OverlayError::Cancelled { completed, total }),
            _ => Ok(()),
        }
    }

    fn aggregate(&self, weights: Array1<f64>, attributes: &AttributeMatrix, progress: &mut dyn Progress) -> Result<DataFrame> {
        let prepared = self.prepare(weights, progress)?;
        let total = prepared.targets.len();
        let mut output = Array2::<f64>::zeros((total, attributes.cols()));

        progress.stage(Stage::Overlaying);
        for (j, target) in track(progress, prepared.targets.shapes().iter().enumerate()) {
            self.check_cancelled(j, total)?;

            let fractions = intersecting_fractions(
                target, prepared.sources.shapes(), &prepared.source_areas, &prepared.index,
            );
            let mut target_weights = fractions.entries().iter()
                .map(|&(i, fraction)| (i, prepared.weights[i] * fraction))
                .collect::<Vec<_>>();

            if self.mode.is_scale_invariant() {
                let sum = target_weights.iter().map(|&(_, w)| w).sum::<f64>();
                if sum > 0.0 {
                    target_weights.iter_mut().for_each(|(_, w)| *w /= sum);
                } else {
                    // No weighted overlap: the row stays zero.
                    target_weights.clear();
                }
            }

            let mut row = output.row_mut(j);
            for &(i, w) in target_weights.iter().filter(|&&(_, w)| w != 0.0) {
                row.scaled_add(w, &attributes.row(i));
            }

            debug!(target = %prepared.targets.ids()[j], candidates = fractions.entries().len(), "[overlay] aggregated target");
        }
        progress.stage(Stage::Done);

        attributes.frame_like(&output)
    }

    fn pairs(&self, weights: Array1<f64>, progress: &mut dyn Progress) -> Result<DataFrame> {
        let prepared = self.prepare(weights, progress)?;
        let total = prepared.targets.len();

        let (mut target_ids, mut source_ids) = (Vec::new(), Vec::new());
        let (mut fractions, mut pair_weights) = (Vec::new(), Vec::new());

        progress.stage(Stage::Overlaying);
        for (j, target) in track(progress, prepared.targets.shapes().iter().enumerate()) {
            self.check_cancelled(j, total)?;

            let vector = intersecting_fractions(
                target, prepared.sources.shapes(), &prepared.source_areas, &prepared.index,
            );
            for &(i, fraction) in vector.entries().iter().filter(|&&(_, f)| f > 0.0) {
                target_ids.push(prepared.targets.ids()[j].clone());
                source_ids.push(prepared.sources.ids()[i].clone());
                fractions.push(fraction);
                pair_weights.push(prepared.weights[i] * fraction);
            }
        }
        progress.stage(Stage::Done);

        Ok(DataFrame::new(vec![
            Column::new("target_id".into(), target_ids),
            Column::new("source_id".into(), source_ids),
            Column::new("fraction".into(), fractions),
            Column::new("weight".into(), pair_weights),
        ])?)
    }
}

/// Aggregate `attributes` from `sources` onto `targets`.
///
/// `weights` defaults to all ones. `scale_invariant` picks the weighted mean
/// (`true`, for rates and densities) or the weighted sum (`false`, for counts
/// and totals); see [`Mode`]. `quiet` suppresses progress logging. Areas are
/// measured in [`Crs::CONUS_ALBERS`]; use [`Overlay`] to change that.
pub fn overlay(
    sources: &PolygonSet,
    targets: &PolygonSet,
    weights: Option<&[f64]>,
    attributes: &DataFrame,
    quiet: bool,
    scale_invariant: bool,
) -> Result<DataFrame> {
    let mut overlay = Overlay::new(sources, targets)
        .mode(Mode::from_scale_invariant(scale_invariant))
        .quiet(quiet);
    if let Some(weights) = weights {
        overlay = overlay.weights(weights);
    }
    overlay.run(attributes)
}
