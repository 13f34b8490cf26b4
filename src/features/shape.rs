use crate::error::{Fallback, Outcome};
use crate::mask::CanonicalMask;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::point::Point;

/// Fixed-order silhouette descriptor:
/// `[centroid_x, centroid_y, area, perimeter, aspect_ratio]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShapeFeature {
    pub centroid_x: f64,
    pub centroid_y: f64,
    pub area: f64,
    pub perimeter: f64,
    pub aspect_ratio: f64,
}

impl ShapeFeature {
    pub const DIM: usize = 5;

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn as_array(&self) -> [f64; Self::DIM] {
        [
            self.centroid_x,
            self.centroid_y,
            self.area,
            self.perimeter,
            self.aspect_ratio,
        ]
    }

    pub fn distance(&self, other: &ShapeFeature) -> f64 {
        self.as_array()
            .iter()
            .zip(other.as_array().iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }
}

/// Reduces a canonical mask to the descriptor of its primary silhouette
#[derive(Debug, Default, Clone, Copy)]
pub struct ShapeFeatureExtractor;

impl ShapeFeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the shape feature of the largest external contour
    ///
    /// Contours come from a Suzuki-Abe border trace in raster order, so when two
    /// silhouettes enclose the same area the one met first wins.
    pub fn extract(&self, mask: &CanonicalMask) -> Outcome<ShapeFeature> {
        let _span = tracing::debug_span!("extract_shape").entered();

        let image = mask.to_gray_image();
        let contours: Vec<Contour<i64>> = find_contours(&image);

        let mut primary: Option<(&Contour<i64>, f64)> = None;
        for contour in contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        {
            let area = polygon_area(&contour.points);
            if primary.map_or(true, |(_, best)| area > best) {
                primary = Some((contour, area));
            }
        }

        let Some((contour, area)) = primary else {
            return Outcome::degraded(ShapeFeature::zero(), Fallback::NoContour);
        };

        let moments = PolygonMoments::of(&contour.points);
        if moments.m00.abs() < f64::EPSILON {
            return Outcome::degraded(ShapeFeature::zero(), Fallback::ZeroMoment);
        }

        let (box_width, box_height) = bounding_box_size(&contour.points);
        let aspect_ratio = if box_height == 0 {
            0.0
        } else {
            box_width as f64 / box_height as f64
        };

        Outcome::Success(ShapeFeature {
            centroid_x: moments.m10 / moments.m00,
            centroid_y: moments.m01 / moments.m00,
            area,
            perimeter: closed_arc_length(&contour.points),
            aspect_ratio,
        })
    }
}

/// Zeroth and first order moments of a closed polygon (Green's theorem)
struct PolygonMoments {
    m00: f64,
    m10: f64,
    m01: f64,
}

impl PolygonMoments {
    fn of(points: &[Point<i64>]) -> Self {
        let mut m00 = 0.0;
        let mut m10 = 0.0;
        let mut m01 = 0.0;
        for (a, b) in closed_edges(points) {
            let (xa, ya) = (a.x as f64, a.y as f64);
            let (xb, yb) = (b.x as f64, b.y as f64);
            let cross = xa * yb - xb * ya;
            m00 += cross;
            m10 += (xa + xb) * cross;
            m01 += (ya + yb) * cross;
        }
        Self {
            m00: m00 / 2.0,
            m10: m10 / 6.0,
            m01: m01 / 6.0,
        }
    }
}

fn closed_edges(points: &[Point<i64>]) -> impl Iterator<Item = (&Point<i64>, &Point<i64>)> {
    let next = points.iter().cycle().skip(1);
    points.iter().zip(next).take(points.len())
}

fn polygon_area(points: &[Point<i64>]) -> f64 {
    PolygonMoments::of(points).m00.abs()
}

fn closed_arc_length(points: &[Point<i64>]) -> f64 {
    closed_edges(points)
        .map(|(a, b)| {
            let dx = (b.x - a.x) as f64;
            let dy = (b.y - a.y) as f64;
            (dx * dx + dy * dy).sqrt()
        })
        .sum()
}

/// Pixel-inclusive bounding box width and height
fn bounding_box_size(points: &[Point<i64>]) -> (i64, i64) {
    let (mut min_x, mut min_y) = (i64::MAX, i64::MAX);
    let (mut max_x, mut max_y) = (i64::MIN, i64::MIN);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    if points.is_empty() {
        return (0, 0);
    }
    (max_x - min_x + 1, max_y - min_y + 1)
}
