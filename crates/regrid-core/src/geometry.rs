//! Planar polygon primitives backing the swath path: Sutherland-Hodgman
//! clipping against an axis-aligned rectangle and the shoelace area formula.

/// An axis-aligned rectangle in planar meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Rect {
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x_min <= other.x_max
            && self.x_max >= other.x_min
            && self.y_min <= other.y_max
            && self.y_max >= other.y_min
    }
}

/// The planar bounding box of a point sequence.
pub fn bounding_box(points: &[(f64, f64)]) -> Rect {
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    Rect {
        x_min,
        x_max,
        y_min,
        y_max,
    }
}

/// Shoelace formula: signed area of a (possibly non-convex, simple) polygon.
/// Returns the unsigned area.
pub fn polygon_area(points: &[(f64, f64)]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % points.len()];
        sum += x0 * y1 - x1 * y0;
    }
    (sum * 0.5).abs()
}

/// Reorder four corners counter-clockwise around their centroid. Used to
/// normalize swath quadrilaterals whose corner order is unknown or crosses
/// the antimeridian once projected to planar coordinates.
pub fn reorder_counterclockwise(corners: &mut [(f64, f64); 4]) {
    let cx = corners.iter().map(|p| p.0).sum::<f64>() / 4.0;
    let cy = corners.iter().map(|p| p.1).sum::<f64>() / 4.0;
    corners.sort_by(|a, b| {
        let angle_a = (a.1 - cy).atan2(a.0 - cx);
        let angle_b = (b.1 - cy).atan2(b.0 - cx);
        angle_a
            .partial_cmp(&angle_b)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Sutherland-Hodgman clip of a simple polygon against an axis-aligned
/// rectangle. Returns the clipped polygon's vertices (empty if disjoint).
pub fn clip_to_rect(subject: &[(f64, f64)], rect: &Rect) -> Vec<(f64, f64)> {
    let mut output = subject.to_vec();

    output = clip_edge(
        &output,
        |p| p.0 >= rect.x_min,
        |a, b| intersect_x(a, b, rect.x_min),
    );
    output = clip_edge(
        &output,
        |p| p.0 <= rect.x_max,
        |a, b| intersect_x(a, b, rect.x_max),
    );
    output = clip_edge(
        &output,
        |p| p.1 >= rect.y_min,
        |a, b| intersect_y(a, b, rect.y_min),
    );
    output = clip_edge(
        &output,
        |p| p.1 <= rect.y_max,
        |a, b| intersect_y(a, b, rect.y_max),
    );

    output
}

fn intersect_x(a: (f64, f64), b: (f64, f64), x: f64) -> (f64, f64) {
    let t = (x - a.0) / (b.0 - a.0);
    (x, a.1 + t * (b.1 - a.1))
}

fn intersect_y(a: (f64, f64), b: (f64, f64), y: f64) -> (f64, f64) {
    let t = (y - a.1) / (b.1 - a.1);
    (a.0 + t * (b.0 - a.0), y)
}

/// One pass of Sutherland-Hodgman clipping against a single half-plane,
/// `inside` testing a vertex and `intersect` computing the edge/boundary
/// crossing.
fn clip_edge(
    subject: &[(f64, f64)],
    inside: impl Fn((f64, f64)) -> bool,
    intersect: impl Fn((f64, f64), (f64, f64)) -> (f64, f64),
) -> Vec<(f64, f64)> {
    if subject.is_empty() {
        return Vec::new();
    }
    let mut output = Vec::with_capacity(subject.len() + 1);
    for i in 0..subject.len() {
        let current = subject[i];
        let previous = subject[(i + subject.len() - 1) % subject.len()];
        let current_inside = inside(current);
        let previous_inside = inside(previous);
        if current_inside {
            if !previous_inside {
                output.push(intersect(previous, current));
            }
            output.push(current);
        } else if previous_inside {
            output.push(intersect(previous, current));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_of_unit_square_is_one() {
        let square = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        assert!((polygon_area(&square) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn clip_fully_contained_quad_is_unchanged_area() {
        let quad = [(2.0, 2.0), (3.0, 2.0), (3.0, 3.0), (2.0, 3.0)];
        let rect = Rect {
            x_min: 0.0,
            x_max: 10.0,
            y_min: 0.0,
            y_max: 10.0,
        };
        let clipped = clip_to_rect(&quad, &rect);
        assert!((polygon_area(&clipped) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn clip_half_overlap_quad_halves_the_area() {
        let quad = [(0.5, 0.0), (1.5, 0.0), (1.5, 1.0), (0.5, 1.0)];
        let rect = Rect {
            x_min: 0.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 1.0,
        };
        let clipped = clip_to_rect(&quad, &rect);
        assert!((polygon_area(&clipped) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn disjoint_quad_clips_to_empty() {
        let quad = [(5.0, 5.0), (6.0, 5.0), (6.0, 6.0), (5.0, 6.0)];
        let rect = Rect {
            x_min: 0.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 1.0,
        };
        let clipped = clip_to_rect(&quad, &rect);
        assert!(polygon_area(&clipped) < 1e-12);
    }

    #[test]
    fn reorder_sorts_corners_counterclockwise() {
        let mut corners = [(1.0, 1.0), (1.0, -1.0), (-1.0, -1.0), (-1.0, 1.0)];
        reorder_counterclockwise(&mut corners);
        assert!((polygon_area(&corners) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn bounding_box_covers_all_points() {
        let pts = [(-1.0, 2.0), (3.0, -4.0), (0.5, 0.5)];
        let bbox = bounding_box(&pts);
        assert_eq!(
            bbox,
            Rect {
                x_min: -1.0,
                x_max: 3.0,
                y_min: -4.0,
                y_max: 2.0
            }
        );
    }
}
