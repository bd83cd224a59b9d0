//! Axis-aligned bounds and structured extents with their "empty" sentinels.

/// Axis-aligned bounding box `[xmin, xmax, ymin, ymax, zmin, zmax]`.
///
/// A box is valid when `min <= max` holds on every axis. The default value is the
/// inverted sentinel `[+inf, -inf] x 3`, which acts as the identity for
/// [`Bounds::union`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds(pub [f64; 6]);

impl Bounds {
    pub const EMPTY: Bounds = Bounds([
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
    ]);

    pub fn new(bounds: [f64; 6]) -> Bounds {
        Bounds(bounds)
    }

    pub fn is_valid(&self) -> bool {
        (0..3).all(|axis| self.0[2 * axis] <= self.0[2 * axis + 1])
    }

    /// Union of two boxes. An invalid operand is ignored; the union of two
    /// invalid boxes is the sentinel.
    pub fn union(&self, other: &Bounds) -> Bounds {
        match (self.is_valid(), other.is_valid()) {
            (true, true) => {
                let mut out = [0.0; 6];
                for axis in 0..3 {
                    out[2 * axis] = self.0[2 * axis].min(other.0[2 * axis]);
                    out[2 * axis + 1] = self.0[2 * axis + 1].max(other.0[2 * axis + 1]);
                }
                Bounds(out)
            }
            (true, false) => *self,
            (false, true) => *other,
            (false, false) => Bounds::EMPTY,
        }
    }

    pub fn add(&mut self, other: &Bounds) {
        *self = self.union(other);
    }

    /// Side lengths, zero on every axis for an invalid box.
    pub fn lengths(&self) -> [f64; 3] {
        if !self.is_valid() {
            return [0.0; 3];
        }
        [
            self.0[1] - self.0[0],
            self.0[3] - self.0[2],
            self.0[5] - self.0[4],
        ]
    }

    pub fn center(&self) -> Option<[f64; 3]> {
        self.is_valid().then(|| {
            [
                (self.0[0] + self.0[1]) / 2.0,
                (self.0[2] + self.0[3]) / 2.0,
                (self.0[4] + self.0[5]) / 2.0,
            ]
        })
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::EMPTY
    }
}

impl From<[f64; 6]> for Bounds {
    fn from(value: [f64; 6]) -> Self {
        Bounds(value)
    }
}

/// Structured index extent `[imin, imax, jmin, jmax, kmin, kmax]`.
///
/// Defaults to the inverted sentinel `[i32::MAX, -i32::MAX] x 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent(pub [i32; 6]);

impl Extent {
    pub const EMPTY: Extent = Extent([
        i32::MAX,
        -i32::MAX,
        i32::MAX,
        -i32::MAX,
        i32::MAX,
        -i32::MAX,
    ]);

    pub fn is_valid(&self) -> bool {
        (0..3).all(|axis| self.0[2 * axis] <= self.0[2 * axis + 1])
    }

    /// Merges another extent into this one: the low end of every axis takes the
    /// minimum, the high end the maximum.
    pub fn add(&mut self, other: &Extent) {
        for axis in 0..3 {
            self.0[2 * axis] = self.0[2 * axis].min(other.0[2 * axis]);
            self.0[2 * axis + 1] = self.0[2 * axis + 1].max(other.0[2 * axis + 1]);
        }
    }

    /// Point counts along each axis; zero for an inverted axis.
    pub fn dimensions(&self) -> [usize; 3] {
        let dim = |lo: i32, hi: i32| {
            if hi >= lo {
                (hi as i64 - lo as i64 + 1) as usize
            } else {
                0
            }
        };
        [
            dim(self.0[0], self.0[1]),
            dim(self.0[2], self.0[3]),
            dim(self.0[4], self.0[5]),
        ]
    }
}

impl Default for Extent {
    fn default() -> Self {
        Extent::EMPTY
    }
}

impl From<[i32; 6]> for Extent {
    fn from(value: [i32; 6]) -> Self {
        Extent(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_with_sentinel_is_identity() {
        let b = Bounds::new([0.0, 1.0, -2.0, 2.0, 5.0, 5.0]);
        assert_eq!(b.union(&Bounds::EMPTY), b);
        assert_eq!(Bounds::EMPTY.union(&b), b);
        assert_eq!(b.union(&b), b);
        assert_eq!(Bounds::EMPTY.union(&Bounds::EMPTY), Bounds::EMPTY);
    }

    #[test]
    fn test_union_grows() {
        let a = Bounds::new([0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        let b = Bounds::new([-1.0, 0.5, 0.5, 3.0, 0.0, 0.0]);
        assert_eq!(a.union(&b), Bounds::new([-1.0, 1.0, 0.0, 3.0, 0.0, 1.0]));
        assert_eq!(a.union(&b).lengths(), [2.0, 3.0, 1.0]);
        assert_eq!(Bounds::EMPTY.center(), None);
    }

    #[test]
    fn test_invalid_box_is_ignored() {
        let a = Bounds::new([0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        let partially_inverted = Bounds::new([0.0, 1.0, 3.0, -3.0, 0.0, 1.0]);
        assert!(!partially_inverted.is_valid());
        assert_eq!(a.union(&partially_inverted), a);
    }

    #[test]
    fn test_extent_merge() {
        let mut e = Extent::EMPTY;
        e.add(&Extent([0, 9, 0, 4, 0, 0]));
        assert_eq!(e, Extent([0, 9, 0, 4, 0, 0]));
        e.add(&Extent([5, 19, 0, 4, 0, 0]));
        assert_eq!(e.dimensions(), [20, 5, 1]);
        assert_eq!(Extent::EMPTY.dimensions(), [0, 0, 0]);
    }
}
