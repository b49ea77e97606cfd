//! Triangle geometry used by the surface distance queries.

use crate::spatial::{BoundingBox, Point3, Vector3};

/// A triangle given by its three corner positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Point3,
    pub b: Point3,
    pub c: Point3,
}

impl Triangle {
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self { a, b, c }
    }

    /// Unnormalized normal (a→b × a→c). Zero for degenerate triangles.
    pub fn cross(&self) -> Vector3 {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    pub fn area(&self) -> f64 {
        0.5 * self.cross().norm()
    }

    pub fn centroid(&self) -> Point3 {
        Point3::from((self.a.coords + self.b.coords + self.c.coords) / 3.0)
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points([&self.a, &self.b, &self.c])
    }

    /// Closest point on the triangle (interior, edges or corners) to `p`.
    ///
    /// Voronoi-region walk after Ericson, "Real-Time Collision Detection" 5.1.5.
    /// Degenerate triangles collapse onto their edges or corners.
    pub fn closest_point(&self, p: &Point3) -> Point3 {
        let (a, b, c) = (self.a, self.b, self.c);
        let ab = b - a;
        let ac = c - a;
        let ap = p - a;

        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = p - b;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return a + ab * v;
        }

        let cp = p - c;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return a + ac * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        let denom = va + vb + vc;
        if denom.abs() < f64::EPSILON {
            // Collinear corners that slipped through the region tests.
            return closest_on_segments(p, &a, &b, &c);
        }
        let v = vb / denom;
        let w = vc / denom;
        a + ab * v + ac * w
    }

    /// Squared distance from `p` to the triangle.
    pub fn distance_squared(&self, p: &Point3) -> f64 {
        (self.closest_point(p) - p).norm_squared()
    }
}

fn closest_on_segment(p: &Point3, a: &Point3, b: &Point3) -> Point3 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return *a;
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

fn closest_on_segments(p: &Point3, a: &Point3, b: &Point3, c: &Point3) -> Point3 {
    [
        closest_on_segment(p, a, b),
        closest_on_segment(p, b, c),
        closest_on_segment(p, c, a),
    ]
    .into_iter()
    .min_by(|x, y| (x - p).norm_squared().total_cmp(&(y - p).norm_squared()))
    .unwrap_or(*a)
}
