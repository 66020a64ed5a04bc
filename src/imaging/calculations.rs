//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Dimensions of a downsized probe image.
///
/// Scales `original` so its width is at most `max_width`, preserving aspect
/// ratio. Images already narrower are kept as-is (never upscaled). Neither
/// side drops below 1px.
///
/// ```text
/// (1600, 900), max 64 → (64, 36)
/// (40, 30),    max 64 → (40, 30)
/// (5000, 10),  max 64 → (64, 1)
/// ```
pub fn probe_dimensions(original: (u32, u32), max_width: u32) -> (u32, u32) {
    let (w, h) = original;
    let max_width = max_width.max(1);
    if w <= max_width {
        return (w.max(1), h.max(1));
    }
    let ratio = max_width as f64 / w as f64;
    let height = (h as f64 * ratio).round() as u32;
    (max_width, height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_is_scaled_to_max_width() {
        assert_eq!(probe_dimensions((1600, 900), 64), (64, 36));
    }

    #[test]
    fn portrait_keeps_aspect() {
        assert_eq!(probe_dimensions((900, 1600), 64), (64, 114));
    }

    #[test]
    fn small_images_are_not_upscaled() {
        assert_eq!(probe_dimensions((40, 30), 64), (40, 30));
        assert_eq!(probe_dimensions((64, 64), 64), (64, 64));
    }

    #[test]
    fn extreme_aspect_never_reaches_zero() {
        assert_eq!(probe_dimensions((5000, 10), 64), (64, 1));
    }

    #[test]
    fn degenerate_inputs_are_clamped() {
        assert_eq!(probe_dimensions((0, 0), 64), (1, 1));
        assert_eq!(probe_dimensions((100, 50), 0), (1, 1));
    }
}
