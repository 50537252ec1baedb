use tracing::warn;

use crate::options::IgnoreRegion;

/// Union of ignore rectangles, clipped to the image they apply to.
#[derive(Debug, Clone, Default)]
pub struct RegionFilter {
    regions: Vec<IgnoreRegion>,
}

impl RegionFilter {
    pub fn new(regions: &[IgnoreRegion], width: u32, height: u32) -> Self {
        let regions = regions
            .iter()
            .filter_map(|r| {
                let clipped = clip(r, width, height);
                if clipped != Some(*r) {
                    warn!(
                        region = ?r,
                        width,
                        height,
                        "ignore region extends past the image; clipping"
                    );
                }
                clipped
            })
            .collect();
        Self { regions }
    }

    pub fn regions(&self) -> &[IgnoreRegion] {
        &self.regions
    }

    pub fn is_ignored(&self, x: u32, y: u32) -> bool {
        self.regions.iter().any(|r| r.contains(x, y))
    }

    /// `true` when no region touches row `y`, so the row can skip per-pixel checks.
    pub fn row_is_clear(&self, y: u32) -> bool {
        !self
            .regions
            .iter()
            .any(|r| y >= r.y && y - r.y < r.height)
    }
}

/// Intersect `r` with the `width x height` image; `None` when nothing is left.
fn clip(r: &IgnoreRegion, width: u32, height: u32) -> Option<IgnoreRegion> {
    if r.is_empty() || r.x >= width || r.y >= height {
        return None;
    }
    let w = r.width.min(width - r.x);
    let h = r.height.min(height - r.y);
    Some(IgnoreRegion::new(r.x, r.y, w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_regions_form_a_union() {
        let f = RegionFilter::new(
            &[IgnoreRegion::new(0, 0, 3, 3), IgnoreRegion::new(2, 2, 3, 3)],
            10,
            10,
        );
        assert!(f.is_ignored(0, 0));
        assert!(f.is_ignored(2, 2));
        assert!(f.is_ignored(4, 4));
        assert!(!f.is_ignored(5, 5));
        assert!(!f.is_ignored(0, 4));
    }

    #[test]
    fn regions_are_clipped_to_the_image() {
        let f = RegionFilter::new(&[IgnoreRegion::new(8, 8, 100, 100)], 10, 10);
        assert!(f.is_ignored(9, 9));
        assert_eq!(f.regions, vec![IgnoreRegion::new(8, 8, 2, 2)]);
    }

    #[test]
    fn outside_or_empty_regions_are_dropped() {
        let f = RegionFilter::new(
            &[IgnoreRegion::new(20, 0, 5, 5), IgnoreRegion::new(1, 1, 0, 4)],
            10,
            10,
        );
        assert!(f.regions().is_empty());
        assert!(!f.is_ignored(1, 1));
    }

    #[test]
    fn row_clearance() {
        let f = RegionFilter::new(&[IgnoreRegion::new(0, 3, 2, 2)], 10, 10);
        assert!(f.row_is_clear(2));
        assert!(!f.row_is_clear(3));
        assert!(!f.row_is_clear(4));
        assert!(f.row_is_clear(5));
    }
}
