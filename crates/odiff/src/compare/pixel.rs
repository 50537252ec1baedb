use image::Rgba;

/// Maximum possible squared delta in YIQ color space.
pub const MAX_YIQ_POSSIBLE_DELTA: f64 = 35215.0;

/// Squared YIQ delta a pixel pair must exceed to count as different.
pub fn max_delta(threshold: f64) -> f64 {
    let t = threshold.clamp(0.0, 1.0);
    MAX_YIQ_POSSIBLE_DELTA * t * t
}

/// `true` iff the normalized distance between `a` and `b` exceeds the threshold
/// encoded in `max_delta`.
pub fn is_different(a: &Rgba<u8>, b: &Rgba<u8>, max_delta: f64) -> bool {
    a != b && color_delta(a, b) > max_delta
}

/// Squared perceptual delta between two pixels (0.0 ..= 35215.0).
///
/// Semi-transparent pixels are composited over white before conversion, so
/// two fully transparent pixels are always equal regardless of their RGB.
pub fn color_delta(a: &Rgba<u8>, b: &Rgba<u8>) -> f64 {
    if a == b || (a[3] == 0 && b[3] == 0) {
        return 0.0;
    }
    let (r1, g1, b1) = composite(a);
    let (r2, g2, b2) = composite(b);

    let y = rgb2y(r1, g1, b1) - rgb2y(r2, g2, b2);
    let i = rgb2i(r1, g1, b1) - rgb2i(r2, g2, b2);
    let q = rgb2q(r1, g1, b1) - rgb2q(r2, g2, b2);

    (0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q).min(MAX_YIQ_POSSIBLE_DELTA)
}

/// Signed brightness difference `y(a) - y(b)`, used by the antialiasing detector.
pub fn brightness_delta(a: &Rgba<u8>, b: &Rgba<u8>) -> f64 {
    if a == b {
        return 0.0;
    }
    let (r1, g1, b1) = composite(a);
    let (r2, g2, b2) = composite(b);
    rgb2y(r1, g1, b1) - rgb2y(r2, g2, b2)
}

fn composite(p: &Rgba<u8>) -> (f64, f64, f64) {
    let (r, g, b) = (p[0] as f64, p[1] as f64, p[2] as f64);
    if p[3] == 255 {
        return (r, g, b);
    }
    let a = p[3] as f64 / 255.0;
    (blend(r, a), blend(g, a), blend(b, a))
}

// blend with white
fn blend(c: f64, a: f64) -> f64 {
    255.0 + (c - 255.0) * a
}

fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.29889531 + g * 0.58662247 + b * 0.11448223
}

fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.59597799 - g * 0.27417610 - b * 0.32180189
}

fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.21147017 - g * 0.52261711 + b * 0.31114694
}
