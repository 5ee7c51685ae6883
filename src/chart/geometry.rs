use std::f64::consts::{FRAC_PI_2, TAU};

use super::entries::ChartEntry;

const INNER_FRACTION: f64 = 0.18;
const OUTER_FRACTION: f64 = 0.48;
const HOVER_FRACTION: f64 = 0.08;
const HOVER_MAX: f64 = 12.0;

/// Centre and radii of the ring for a surface of a given CSS size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub width: f64,
    pub height: f64,
    pub cx: f64,
    pub cy: f64,
    pub inner_radius: f64,
    pub max_radius: f64,
}

impl Geometry {
    pub fn new(width: f64, height: f64) -> Self {
        let side = width.min(height);
        Self {
            width,
            height,
            cx: width / 2.0,
            cy: height / 2.0,
            inner_radius: side * INNER_FRACTION,
            max_radius: side * OUTER_FRACTION,
        }
    }

    /// Outer radius for a correctness ratio in `0..=1`.
    pub fn outer_radius(&self, ratio: f64) -> f64 {
        self.inner_radius + (self.max_radius - self.inner_radius) * ratio.clamp(0.0, 1.0)
    }

    pub fn hover_bump(&self) -> f64 {
        ((self.max_radius - self.inner_radius) * HOVER_FRACTION).min(HOVER_MAX)
    }

    /// Polar position of a point relative to the centre: distance, and angle
    /// measured clockwise from 12 o'clock in `[0, TAU)`.
    pub fn polar(&self, x: f64, y: f64) -> (f64, f64) {
        let dx = x - self.cx;
        let dy = y - self.cy;
        (dx.hypot(dy), angle_from_top(dx, dy))
    }

    /// True when the point lies strictly outside the inner hole and no farther
    /// than the maximum radius.
    pub fn in_ring(&self, dist: f64) -> bool {
        dist > self.inner_radius && dist <= self.max_radius
    }
}

/// Clockwise angle from 12 o'clock for a y-down offset, in `[0, TAU)`.
pub fn angle_from_top(dx: f64, dy: f64) -> f64 {
    let mut ang = dy.atan2(dx) + FRAC_PI_2;
    if ang < 0.0 {
        ang += TAU;
    }
    if ang >= TAU {
        ang -= TAU;
    }
    ang
}

/// One laid-out sector. Angles are canvas angles (y-down, clockwise), starting
/// at `-PI/2` for the top of the ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sector {
    pub index: usize,
    pub start_angle: f64,
    pub end_angle: f64,
    pub outer_radius: f64,
}

impl Sector {
    /// Whether a point at `(dist, angle_from_top)` falls inside this sector's
    /// annulus between `inner` and the sector's outer radius.
    pub fn contains(&self, inner: f64, dist: f64, angle: f64) -> bool {
        let start = self.start_angle + FRAC_PI_2;
        let end = self.end_angle + FRAC_PI_2;
        dist > inner && dist <= self.outer_radius && angle >= start && angle < end
    }
}

/// Lay out sectors clockwise from the top; width follows weight share, outer
/// radius follows correctness.
pub fn layout(geometry: &Geometry, entries: &[ChartEntry], total_weight: f64) -> Vec<Sector> {
    if total_weight <= 0.0 {
        return Vec::new();
    }

    let mut angle = -FRAC_PI_2;
    entries
        .iter()
        .enumerate()
        .map(|(index, e)| {
            let sweep = (e.slice_weight / total_weight) * TAU;
            let sector = Sector {
                index,
                start_angle: angle,
                end_angle: angle + sweep,
                outer_radius: geometry.outer_radius(e.ratio()),
            };
            angle += sweep;
            sector
        })
        .collect()
}

/// Sector under a point. Distance is checked against the theoretical maximum
/// ring; the angle is bucketed by cumulative weight fractions using half-open
/// intervals so a shared edge belongs to the later sector.
pub fn hit_test(
    geometry: &Geometry,
    entries: &[ChartEntry],
    total_weight: f64,
    x: f64,
    y: f64,
) -> Option<usize> {
    if entries.is_empty() || total_weight <= 0.0 {
        return None;
    }

    let (dist, angle) = geometry.polar(x, y);
    if !geometry.in_ring(dist) {
        return None;
    }

    let target = (angle / TAU) * total_weight;
    let mut cumulative = 0.0;
    let mut last_nonempty = None;
    for (i, e) in entries.iter().enumerate() {
        if e.slice_weight <= 0.0 {
            continue;
        }
        cumulative += e.slice_weight;
        last_nonempty = Some(i);
        if target < cumulative {
            return Some(i);
        }
    }
    // Float drift right below 12 o'clock.
    last_nonempty
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(label: &str, correct: u64, total: u64, weight: f64) -> ChartEntry {
        ChartEntry {
            label: label.into(),
            correct_count: correct,
            total_count: total,
            slice_weight: weight,
        }
    }

    fn halves() -> Vec<ChartEntry> {
        vec![entry("A", 1, 1, 1.0), entry("B", 1, 2, 1.0)]
    }

    #[test]
    fn radii_follow_size() {
        let g = Geometry::new(400.0, 300.0);
        assert_eq!(g.cx, 200.0);
        assert_eq!(g.cy, 150.0);
        assert!((g.inner_radius - 54.0).abs() < 1e-9);
        assert!((g.max_radius - 144.0).abs() < 1e-9);
        assert!((g.outer_radius(0.5) - 99.0).abs() < 1e-9);
        assert!((g.hover_bump() - 7.2).abs() < 1e-9);
        assert_eq!(Geometry::new(1000.0, 1000.0).hover_bump(), 12.0);
    }

    #[test]
    fn angle_is_clockwise_from_top() {
        assert!((angle_from_top(0.0, -1.0) - 0.0).abs() < 1e-12);
        assert!((angle_from_top(1.0, 0.0) - FRAC_PI_2).abs() < 1e-12);
        assert!((angle_from_top(0.0, 1.0) - std::f64::consts::PI).abs() < 1e-12);
        assert!((angle_from_top(-1.0, 0.0) - 3.0 * FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn layout_starts_at_top_and_covers_circle() {
        let g = Geometry::new(200.0, 200.0);
        let entries = vec![entry("A", 3, 3, 3.0), entry("B", 0, 2, 1.0)];
        let sectors = layout(&g, &entries, 4.0);

        assert_eq!(sectors.len(), 2);
        assert!((sectors[0].start_angle + FRAC_PI_2).abs() < 1e-12);
        assert!((sectors[0].end_angle - (-FRAC_PI_2 + 0.75 * TAU)).abs() < 1e-12);
        assert!((sectors[1].end_angle - (-FRAC_PI_2 + TAU)).abs() < 1e-12);
        assert!((sectors[0].outer_radius - g.max_radius).abs() < 1e-12);
        assert!((sectors[1].outer_radius - g.inner_radius).abs() < 1e-12);
    }

    #[test]
    fn inner_edge_is_exclusive() {
        let g = Geometry::new(200.0, 200.0);
        let entries = halves();
        // straight right of centre at exactly the inner radius
        let x = g.cx + g.inner_radius;
        assert_eq!(hit_test(&g, &entries, 2.0, x, g.cy), None);
        assert_eq!(hit_test(&g, &entries, 2.0, x + 0.01, g.cy), Some(0));
    }

    #[test]
    fn beyond_max_and_centre_miss() {
        let g = Geometry::new(200.0, 200.0);
        let entries = halves();
        assert_eq!(hit_test(&g, &entries, 2.0, g.cx, g.cy), None);
        assert_eq!(hit_test(&g, &entries, 2.0, g.cx + g.max_radius + 0.5, g.cy), None);
        assert_eq!(hit_test(&g, &entries, 2.0, g.cx + g.max_radius, g.cy), Some(0));
    }

    #[test]
    fn shared_edge_resolves_to_one_sector() {
        let g = Geometry::new(200.0, 200.0);
        let entries = halves();
        let r = (g.inner_radius + g.max_radius) / 2.0;

        // 6 o'clock is the boundary between the two halves.
        assert_eq!(hit_test(&g, &entries, 2.0, g.cx, g.cy + r), Some(1));
        // 12 o'clock is the boundary between the last and first.
        assert_eq!(hit_test(&g, &entries, 2.0, g.cx, g.cy - r), Some(0));
        // 3 and 9 o'clock sit inside each half.
        assert_eq!(hit_test(&g, &entries, 2.0, g.cx + r, g.cy), Some(0));
        assert_eq!(hit_test(&g, &entries, 2.0, g.cx - r, g.cy), Some(1));
    }

    #[test]
    fn no_gap_anywhere_on_the_ring() {
        let g = Geometry::new(240.0, 240.0);
        let entries = vec![entry("A", 1, 3, 1.0), entry("B", 2, 3, 2.0), entry("C", 0, 1, 0.0), entry("D", 4, 4, 4.0)];
        let r = (g.inner_radius + g.max_radius) / 2.0;
        for step in 0..720 {
            let a = step as f64 / 720.0 * TAU;
            let x = g.cx + r * a.cos();
            let y = g.cy + r * a.sin();
            let hit = hit_test(&g, &entries, 7.0, x, y);
            assert!(hit.is_some(), "gap at step {step}");
            assert_ne!(hit, Some(2), "zero-width sector was hit");
        }
    }

    #[test]
    fn sector_contains_matches_layout() {
        let g = Geometry::new(200.0, 200.0);
        let entries = halves();
        let sectors = layout(&g, &entries, 2.0);
        // B is 50% correct so its radius is mid-way.
        let (dist, angle) = g.polar(g.cx - (g.inner_radius + 1.0), g.cy);
        assert!(sectors[1].contains(g.inner_radius, dist, angle));
        assert!(!sectors[0].contains(g.inner_radius, dist, angle));

        let (far, angle) = g.polar(g.cx - g.max_radius, g.cy);
        assert!(!sectors[1].contains(g.inner_radius, far, angle));
    }
}
