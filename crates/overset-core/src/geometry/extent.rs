/// Axis-aligned bounding box, real-valued regardless of the mesh's scalar
/// kind — extents are always used for pruning/traversal decisions, never for
/// differentiated output.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Extent {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Extent {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Extent { min, max }
    }

    pub fn from_points<I: IntoIterator<Item = [f64; 3]>>(points: I) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let mut ext = Extent::new(first, first);
        for p in it {
            ext.engulf_point(p);
        }
        Some(ext)
    }

    pub fn engulf_point(&mut self, p: [f64; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    pub fn engulf(&mut self, other: Extent) {
        self.engulf_point(other.min);
        self.engulf_point(other.max);
    }

    pub fn center(&self) -> [f64; 3] {
        std::array::from_fn(|i| 0.5 * (self.min[i] + self.max[i]))
    }

    pub fn half_extent(&self) -> [f64; 3] {
        std::array::from_fn(|i| 0.5 * (self.max[i] - self.min[i]))
    }

    pub fn diagonal(&self) -> f64 {
        let h = self.half_extent();
        2.0 * (h[0] * h[0] + h[1] * h[1] + h[2] * h[2]).sqrt()
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }

    pub fn contains_point(&self, p: [f64; 3]) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Point on the extent's boundary closest to `p` (equal to `p` itself if
    /// `p` is inside). Used by the octree's best-first nearest search as the
    /// optimistic per-voxel distance bound.
    pub fn clamp(&self, p: [f64; 3]) -> [f64; 3] {
        std::array::from_fn(|i| p[i].clamp(self.min[i], self.max[i]))
    }

    pub fn distance_squared_to(&self, p: [f64; 3]) -> f64 {
        let c = self.clamp(p);
        (0..3).map(|i| (c[i] - p[i]).powi(2)).sum()
    }

    /// Makes the box isotropic (cube) around its center and expands it by
    /// `fraction` on every side, as the octree root construction requires
    /// (spec.md §4.2: "isotropic and expanded by 0.1% to avoid edge
    /// coincidence").
    pub fn made_isotropic_and_expanded(&self, fraction: f64) -> Extent {
        let center = self.center();
        let half = self.half_extent();
        let max_half = half.into_iter().fold(0.0_f64, f64::max).max(1e-300);
        let half = max_half * (1.0 + fraction);
        Extent::new(
            std::array::from_fn(|i| center[i] - half),
            std::array::from_fn(|i| center[i] + half),
        )
    }

    /// Splits into the 8 octants around the center, in the canonical
    /// (x,y,z) bit order used by the octree (child index bit0=x, bit1=y,
    /// bit2=z).
    pub fn octant_children(&self) -> [Extent; 8] {
        let c = self.center();
        std::array::from_fn(|i| {
            let lo = |axis: usize| if i & (1 << axis) == 0 { self.min[axis] } else { c[axis] };
            let hi = |axis: usize| if i & (1 << axis) == 0 { c[axis] } else { self.max[axis] };
            Extent::new(
                [lo(0), lo(1), lo(2)],
                [hi(0), hi(1), hi(2)],
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isotropic_expansion_makes_a_cube() {
        let ext = Extent::new([0.0, 0.0, 0.0], [1.0, 2.0, 4.0]);
        let iso = ext.made_isotropic_and_expanded(0.001);
        let half = iso.half_extent();
        assert!((half[0] - half[1]).abs() < 1e-12);
        assert!((half[1] - half[2]).abs() < 1e-12);
        // Expanded slightly beyond the largest original half-extent (2.0).
        assert!(half[0] > 2.0);
    }

    #[test]
    fn clamp_returns_point_when_inside() {
        let ext = Extent::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        assert_eq!(ext.clamp([0.5, 0.5, 0.5]), [0.5, 0.5, 0.5]);
        assert_eq!(ext.distance_squared_to([0.5, 0.5, 0.5]), 0.0);
    }

    #[test]
    fn octant_children_cover_the_parent() {
        let ext = Extent::new([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        let kids = ext.octant_children();
        assert_eq!(kids.len(), 8);
        assert_eq!(kids[0].min, [0.0, 0.0, 0.0]);
        assert_eq!(kids[0].max, [1.0, 1.0, 1.0]);
        assert_eq!(kids[7].min, [1.0, 1.0, 1.0]);
        assert_eq!(kids[7].max, [2.0, 2.0, 2.0]);
    }
}
