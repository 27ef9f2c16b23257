//! Precision-aware projection onto lines.
//!
//! Dragging a line point produces an arbitrary cursor position. The raw
//! projection is rounded to the configured precision, but a rounded position
//! may land visibly away from the cursor (or on the wrong side of a segment
//! boundary), so the rounded value and its two grid neighbours are compared by
//! actual distance to the cursor and the nearest one wins.

use crate::content::{ContentSource, LinePosition};
use crate::error::CanvasResult;
use crate::geometry::{NOISE_DIGITS, NOISE_STEP, round_significant, round_to_step};
use crate::line::{LineProjection, TransformedLine};
use crate::resolve::Resolver;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Rounding configuration for line point positions and distances.
///
/// A missing field disables that rounding tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrecisionSettings {
    /// Step for line positions, e.g. `0.01`.
    pub line_point_pos_precision: Option<f64>,
    /// Step for perpendicular distances, e.g. `0.1`.
    pub line_point_distance_precision: Option<f64>,
}

impl PrecisionSettings {
    pub fn new(pos_precision: Option<f64>, distance_precision: Option<f64>) -> Self {
        Self {
            line_point_pos_precision: pos_precision,
            line_point_distance_precision: distance_precision,
        }
    }

    /// Read settings from JSON; missing keys stay unconfigured.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Round a distance to the configured distance precision.
    pub fn round_distance(&self, distance: f64) -> f64 {
        match self.line_point_distance_precision {
            Some(step) if step > 0.0 => round_to_step(distance, step),
            _ => distance,
        }
    }
}

/// Project `point` onto `line`, rounding the position as configured.
///
/// `has_segment` selects whether the segment-local position (`true`) or the
/// global position (`false`) is rounded. With `forced_distance` the candidate
/// nearest the cursor at that fixed distance wins; otherwise each candidate
/// gets the distance that best matches the cursor, and the winner's distance
/// is rounded to the distance precision.
///
/// Global rounding with no position precision configured returns the raw
/// projection unchanged, except that `forced_distance`, when given, replaces
/// its distance.
pub fn project_with_precision(
    point: Point,
    line: &TransformedLine,
    settings: &PrecisionSettings,
    has_segment: bool,
    forced_distance: Option<f64>,
) -> LineProjection {
    let raw = line.project_point(point);
    let precision = settings.line_point_pos_precision.filter(|step| *step > 0.0);

    if precision.is_none() && !has_segment {
        log::trace!("No position precision configured, keeping raw projection");
        return LineProjection {
            distance: forced_distance.unwrap_or(raw.distance),
            ..raw
        };
    }

    let value = if has_segment { raw.relative_pos } else { raw.pos };
    let (rounded, step) = match precision {
        Some(step) => (round_to_step(value, step), step),
        None => (round_significant(value, NOISE_DIGITS), NOISE_STEP),
    };
    let neighbours = match precision {
        Some(step) => [round_to_step(rounded - step, step), round_to_step(rounded + step, step)],
        None => [rounded - step, rounded + step],
    };
    let candidates = [rounded, neighbours[0], neighbours[1]].map(|c| c.clamp(0.0, 1.0));

    let mut best: Option<(LineProjection, f64)> = None;
    for candidate in candidates {
        let projection = rebuild_projection(line, &raw, candidate, has_segment);
        let on_line = line.segment_point(projection.segment, projection.relative_pos);
        let distance = match forced_distance {
            Some(distance) => distance,
            None => {
                let normal = line.segment_normal(projection.segment, projection.relative_pos);
                optimal_distance(point, on_line, normal)
            }
        };
        let world = line.segment_point_at_distance(projection.segment, projection.relative_pos, distance);
        let error = world.distance(point);
        log::trace!("Candidate {candidate} at distance {distance}: {error} from cursor");
        if best.is_none_or(|(_, best_error)| error < best_error) {
            best = Some((LineProjection { distance, ..projection }, error));
        }
    }

    let (mut winner, _) = best.unwrap_or((raw, 0.0));
    if forced_distance.is_none() {
        winner.distance = settings.round_distance(winner.distance);
    }
    log::debug!(
        "Projected ({}, {}) to segment {} at {} (distance {})",
        point.x,
        point.y,
        winner.segment,
        if has_segment { winner.relative_pos } else { winner.pos },
        winner.distance
    );
    winner
}

/// Projection at a rounded candidate.
///
/// Segment candidates keep the original segment. Global candidates are placed
/// on the segment they resolve to, so the scored point is the rendered one.
fn rebuild_projection(
    line: &TransformedLine,
    raw: &LineProjection,
    candidate: f64,
    has_segment: bool,
) -> LineProjection {
    if has_segment {
        LineProjection {
            pos: line.global_pos(raw.segment, candidate),
            segment: raw.segment,
            relative_pos: candidate,
            distance: raw.distance,
        }
    } else {
        let (segment, relative_pos) = LinePosition::Global(candidate).split(line.segment_count());
        LineProjection {
            pos: candidate,
            segment,
            relative_pos,
            distance: raw.distance,
        }
    }
}

/// Signed distance along `normal` that brings `on_line` closest to `point`.
pub fn optimal_distance(point: Point, on_line: Point, normal: kurbo::Vec2) -> f64 {
    let norm_sq = normal.dot(normal);
    if norm_sq < f64::EPSILON {
        return 0.0;
    }
    (point - on_line).dot(normal) / norm_sq
}

/// Project `point` onto the line of a shape or connector and return the
/// rounded projection.
pub fn project_onto_provider<G: ContentSource>(
    graph: &G,
    provider: &str,
    point: Point,
    settings: &PrecisionSettings,
    has_segment: bool,
    forced_distance: Option<f64>,
) -> CanvasResult<LineProjection> {
    let line = Resolver::new(graph).line(provider)?;
    Ok(project_with_precision(point, &line, settings, has_segment, forced_distance))
}

/// World point a projection describes.
pub fn projection_point(line: &TransformedLine, projection: &LineProjection, has_segment: bool) -> Point {
    let pos = projection.to_line_position(has_segment);
    match pos {
        LinePosition::Segment { segment, relative } => {
            line.segment_point_at_distance(segment, relative, projection.distance)
        }
        LinePosition::Global(_) => line.point_at(pos, projection.distance),
    }
}
