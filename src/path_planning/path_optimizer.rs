//! Visibility-based waypoint shortcutting
//!
//! A raw tree path zig-zags between random samples. The optimizer resamples
//! the path densely, walks an anchor along the samples and looks ahead from
//! the anchor: where line of sight is lost again after having been held, the
//! stretch between the anchor and the last visible sample is replaced by a
//! straight segment. When the anchor sees the end of the path, everything up
//! to the final waypoint is dropped.
//!
//! A pass never adds waypoints and keeps both endpoints in place.

use itertools::Itertools;
use log::{debug, info, warn};

use crate::common::{CollisionChecker, Path2D, PlanningError, PlanningResult, Point2D};
use crate::path_planning::RrtConfig;

/// Point on the resampled path, tagged with the index of the waypoint that
/// starts the segment it lies on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenseSample {
    pub position: Point2D,
    pub waypoint: usize,
}

/// Resample `path` every `step` along each segment.
///
/// Each segment contributes `ceil(length / step)` samples starting at its
/// first waypoint; the final waypoint closes the sequence.
pub fn resample(path: &Path2D, step: f64) -> Vec<DenseSample> {
    let mut samples = Vec::new();
    for (k, (a, b)) in path.points.iter().tuple_windows().enumerate() {
        let n = (a.distance(b) / step).ceil() as usize;
        samples.extend((0..n).map(|t| DenseSample {
            position: a.lerp(b, t as f64 / n as f64),
            waypoint: k,
        }));
    }
    if let Some(last) = path.last() {
        samples.push(DenseSample {
            position: *last,
            waypoint: path.len() - 1,
        });
    }
    samples
}

/// What one optimization pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub splices: usize,
    pub collapsed: bool,
    pub changed: bool,
}

pub struct PathOptimizer<'a, C: ?Sized> {
    oracle: &'a C,
    /// Resampling and line-of-sight step
    step: f64,
    /// Shortcuts no longer than this are not worth a splice
    min_splice_distance: f64,
    max_waypoints: usize,
}

impl<'a, C> PathOptimizer<'a, C>
where
    C: CollisionChecker + ?Sized,
{
    pub fn new(oracle: &'a C, config: &RrtConfig) -> Self {
        PathOptimizer {
            oracle,
            step: config.optimization_step,
            min_splice_distance: config.collision_step,
            max_waypoints: config.max_waypoints,
        }
    }

    /// Run up to `runs` passes, stopping after the first pass that leaves
    /// the path unchanged. Returns the number of passes executed.
    pub fn optimize(&self, path: &mut Path2D, runs: usize) -> PlanningResult<usize> {
        info!("Non optimal - amount of waypoints: {}", path.len());
        let mut passes = 0;
        while passes < runs {
            let report = self.optimize_pass(path)?;
            passes += 1;
            debug!(
                "Optimization run {}: {} waypoints, {} splices, collapsed {}",
                passes,
                path.len(),
                report.splices,
                report.collapsed
            );
            if !report.changed {
                break;
            }
        }
        info!("Optimized - amount of waypoints: {}", path.len());
        Ok(passes)
    }

    /// One shortcutting pass over `path`.
    ///
    /// On `WaypointLimitExceeded` the pass stops and `path` keeps whatever
    /// shape it had at that point, which is still a valid path.
    pub fn optimize_pass(&self, path: &mut Path2D) -> PlanningResult<PassReport> {
        let mut report = PassReport::default();
        if path.len() < 2 {
            return Ok(report);
        }
        let original = path.clone();
        let mut samples = resample(path, self.step);
        let mut anchor = 0;

        while anchor + 1 < samples.len() {
            let origin = samples[anchor];
            let mut was_visible = false;
            let mut ever_lost = false;
            let mut splice_at = None;

            for j in anchor + 1..samples.len() {
                if self.visible(&origin.position, &samples[j].position) {
                    was_visible = true;
                } else if was_visible {
                    was_visible = false;
                    ever_lost = true;
                    let boundary = samples[j - 1];
                    if self.worth_splicing(&origin, &boundary) {
                        splice_at = Some(boundary);
                        break;
                    }
                }
            }

            if let Some(boundary) = splice_at {
                let new_anchor_waypoint = splice(path, &origin, &boundary);
                samples = resample(path, self.step);
                anchor = samples
                    .iter()
                    .position(|s| s.waypoint == new_anchor_waypoint)
                    .unwrap_or(anchor);
                report.splices += 1;
            } else if !ever_lost && was_visible {
                if collapse(path, &origin) {
                    report.collapsed = true;
                }
                break;
            } else {
                anchor += 1;
            }

            if path.len() > self.max_waypoints {
                warn!("Waypoint limit in optimization exceeded");
                report.changed = *path != original;
                return Err(PlanningError::WaypointLimitExceeded {
                    waypoints: path.len(),
                    limit: self.max_waypoints,
                });
            }
        }

        report.changed = *path != original;
        Ok(report)
    }

    fn visible(&self, a: &Point2D, b: &Point2D) -> bool {
        self.oracle.segment_is_free(a, b, self.step)
    }

    /// A splice must skip at least two waypoints and be longer than the
    /// coarse collision step.
    fn worth_splicing(&self, origin: &DenseSample, boundary: &DenseSample) -> bool {
        boundary.waypoint >= origin.waypoint + 2
            && origin.position.distance(&boundary.position) > self.min_splice_distance
    }
}

/// Replace the waypoints strictly between the anchor's and the boundary's
/// segments by the anchor and boundary positions. Returns the index of the
/// waypoint at the anchor position in the new path.
fn splice(path: &mut Path2D, origin: &DenseSample, boundary: &DenseSample) -> usize {
    let (ka, kb) = (origin.waypoint, boundary.waypoint);
    let mut points: Vec<Point2D> = path.points[..=ka].to_vec();
    if origin.position != points[ka] {
        points.push(origin.position);
    }
    let anchor_waypoint = points.len() - 1;
    if path.points.get(kb + 1) != Some(&boundary.position) {
        points.push(boundary.position);
    }
    points.extend_from_slice(&path.points[kb + 1..]);
    path.points = points;
    anchor_waypoint
}

/// Connect the anchor straight to the final waypoint. Returns whether the
/// path changed.
fn collapse(path: &mut Path2D, origin: &DenseSample) -> bool {
    let ka = origin.waypoint;
    let last = path.len() - 1;
    if ka + 1 >= last {
        return false;
    }
    let goal = path.points[last];
    path.points.truncate(ka + 1);
    if origin.position != path.points[ka] {
        path.points.push(origin.position);
    }
    path.points.push(goal);
    true
}
