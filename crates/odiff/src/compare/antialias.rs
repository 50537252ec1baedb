use image::RgbaImage;

use super::pixel::brightness_delta;

/// Vysniauskas intensity-slope detector ("Anti-aliased Pixel and Intensity
/// Slope Detector", 2009).
///
/// The pixel is edge smoothing when, in one of the images, it has both darker
/// and brighter neighbors with few equal ones, and the darkest or brightest of
/// those neighbors lies in a flat area in *both* images. Checked in both
/// directions; either one is enough to suppress the pixel.
pub fn is_antialiased(base: &RgbaImage, comparison: &RgbaImage, x: u32, y: u32) -> bool {
    on_intensity_slope(base, comparison, x, y) || on_intensity_slope(comparison, base, x, y)
}

fn on_intensity_slope(img: &RgbaImage, other: &RgbaImage, x: u32, y: u32) -> bool {
    let (width, height) = img.dimensions();
    let center = img.get_pixel(x, y);

    // pixels on the image border count as having one equal neighbor
    let mut zeroes = u8::from(on_border(x, y, width, height));
    let mut min = 0.0;
    let mut max = 0.0;
    let mut min_at = None;
    let mut max_at = None;

    for (nx, ny) in neighbors(x, y, width, height) {
        let delta = brightness_delta(center, img.get_pixel(nx, ny));

        if delta == 0.0 {
            zeroes += 1;
            if zeroes > 2 {
                return false;
            }
        } else if delta < min {
            min = delta;
            min_at = Some((nx, ny));
        } else if delta > max {
            max = delta;
            max_at = Some((nx, ny));
        }
    }

    // no slope unless the center has neighbors on both sides of its brightness
    let (Some(min_at), Some(max_at)) = (min_at, max_at) else {
        return false;
    };

    let flat_in_both = |(px, py): (u32, u32)| {
        has_many_siblings(img, px, py) && has_many_siblings(other, px, py)
    };
    flat_in_both(min_at) || flat_in_both(max_at)
}

/// `true` when 3+ pixels of the clamped 3x3 neighborhood share the center color.
fn has_many_siblings(img: &RgbaImage, x: u32, y: u32) -> bool {
    let (width, height) = img.dimensions();
    let center = img.get_pixel(x, y);
    let mut zeroes = u8::from(on_border(x, y, width, height));

    for (nx, ny) in neighbors(x, y, width, height) {
        if img.get_pixel(nx, ny) == center {
            zeroes += 1;
            if zeroes > 2 {
                return true;
            }
        }
    }
    false
}

fn on_border(x: u32, y: u32, width: u32, height: u32) -> bool {
    x == 0 || y == 0 || x + 1 == width || y + 1 == height
}

/// 8-connected neighbors of `(x, y)`, clamped to the image, column-major.
fn neighbors(x: u32, y: u32, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let xs = x.saturating_sub(1)..=(x + 1).min(width - 1);
    let ys = y.saturating_sub(1)..=(y + 1).min(height - 1);
    xs.flat_map(move |nx| ys.clone().map(move |ny| (nx, ny)))
        .filter(move |&(nx, ny)| nx != x || ny != y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const GRAY: Rgba<u8> = Rgba([128, 128, 128, 255]);

    /// Black left half, white right half.
    fn hard_edge(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, _| if x < w / 2 { BLACK } else { WHITE })
    }

    #[test]
    fn neighbors_are_clamped_at_corners() {
        let corner: Vec<_> = neighbors(0, 0, 4, 4).collect();
        assert_eq!(corner, vec![(0, 1), (1, 0), (1, 1)]);
        let inner: Vec<_> = neighbors(1, 1, 4, 4).collect();
        assert_eq!(inner.len(), 8);
        assert!(!inner.contains(&(1, 1)));
    }

    #[test]
    fn single_pixel_image_has_no_neighbors() {
        assert_eq!(neighbors(0, 0, 1, 1).count(), 0);
        let img = RgbaImage::from_pixel(1, 1, WHITE);
        let other = RgbaImage::from_pixel(1, 1, BLACK);
        assert!(!is_antialiased(&img, &other, 0, 0));
    }

    #[test]
    fn softened_edge_pixel_is_antialiasing() {
        let base = hard_edge(6, 5);
        let mut comparison = base.clone();
        comparison.put_pixel(3, 2, GRAY);
        assert!(is_antialiased(&base, &comparison, 3, 2));
    }

    #[test]
    fn changed_block_is_not_antialiasing() {
        let base = RgbaImage::from_pixel(7, 7, WHITE);
        let mut comparison = base.clone();
        for y in 2..5 {
            for x in 2..5 {
                comparison.put_pixel(x, y, BLACK);
            }
        }
        // the center of a solid changed block has only equal neighbors
        assert!(!is_antialiased(&base, &comparison, 3, 3));
    }

    #[test]
    fn isolated_dot_on_flat_background_is_not_antialiasing() {
        let base = RgbaImage::from_pixel(5, 5, WHITE);
        let mut comparison = base.clone();
        comparison.put_pixel(2, 2, BLACK);
        // every neighbor is brighter than the dot, none darker
        assert!(!is_antialiased(&base, &comparison, 2, 2));
    }

    #[test]
    fn flat_sibling_check() {
        let img = RgbaImage::from_pixel(3, 3, WHITE);
        assert!(has_many_siblings(&img, 1, 1));

        let checker =
            RgbaImage::from_fn(3, 3, |x, y| if (x + y) % 2 == 0 { BLACK } else { WHITE });
        // center (black) has four black diagonal neighbors
        assert!(has_many_siblings(&checker, 1, 1));

        let mut dot = RgbaImage::from_pixel(5, 5, WHITE);
        dot.put_pixel(2, 2, BLACK);
        assert!(!has_many_siblings(&dot, 2, 2));
    }
}
