//! Progress reporting for long overlays.
//!
//! The engine calls [`Progress::stage`] at each phase boundary and walks the
//! targets through [`track`], which calls [`Progress::target`] once per
//! finished target. Reporting never changes
//! the output; a quiet run does not call the observer at all.

use std::fmt;

use tracing::info;

/// Phase of an overlay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Projecting,
    Indexing,
    Overlaying,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Projecting => "projecting geometries",
            Self::Indexing => "building spatial index",
            Self::Overlaying => "performing overlay",
            Self::Done => "overlay complete",
        })
    }
}

/// Observer for overlay progress. All methods default to no-ops.
pub trait Progress {
    /// A new phase started.
    fn stage(&mut self, _stage: Stage) {}

    /// `done` of `total` targets have been aggregated.
    fn target(&mut self, _done: usize, _total: usize) {}
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Progress for Silent {}

/// Closures receive `(done, total)` per target.
impl<F: FnMut(usize, usize)> Progress for F {
    fn target(&mut self, done: usize, total: usize) { self(done, total) }
}

/// Logs stages and every `step_percent` of targets through `tracing`.
#[derive(Debug, Clone)]
pub struct LogProgress {
    step_percent: usize,
    next_percent: usize,
}

impl LogProgress {
    pub fn new(step_percent: usize) -> Self {
        let step_percent = step_percent.clamp(1, 100);
        Self { step_percent, next_percent: step_percent }
    }
}

impl Default for LogProgress {
    fn default() -> Self { Self::new(10) }
}

impl Progress for LogProgress {
    fn stage(&mut self, stage: Stage) {
        if stage == Stage::Overlaying {
            self.next_percent = self.step_percent;
        }
        info!("[overlay] {stage}");
    }

    fn target(&mut self, done: usize, total: usize) {
        let percent = done * 100 / total.max(1);
        if percent >= self.next_percent || done == total {
            info!("[overlay] {done}/{total} targets ({percent}%)");
            while self.next_percent <= percent {
                self.next_percent += self.step_percent;
            }
        }
    }
}

/// Pass `iter` through unchanged, reporting each item to `progress` once the
/// caller asks for the next one (or the iterator runs out).
pub fn track<'a, I>(progress: &'a mut dyn Progress, iter: I) -> Tracked<'a, I::IntoIter>
where
    I: IntoIterator,
    I::IntoIter: ExactSizeIterator,
{
    let iter = iter.into_iter();
    Tracked { total: iter.len(), yielded: 0, reported: 0, progress, iter }
}

/// Iterator adapter returned by [`track`].
pub struct Tracked<'a, I> {
    progress: &'a mut dyn Progress,
    iter: I,
    yielded: usize,
    reported: usize,
    total: usize,
}

impl<I: Iterator> Iterator for Tracked<'_, I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reported < self.yielded {
            self.reported = self.yielded;
            self.progress.target(self.reported, self.total);
        }
        let item = self.iter.next()?;
        self.yielded += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) { self.iter.size_hint() }
}
