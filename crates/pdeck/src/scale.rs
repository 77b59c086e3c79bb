//! Aspect-preserving placement of a bitmap inside the viewport.

/// Smallest viewport the fit math will accept. Window managers report
/// degenerate sizes before the first real layout; anything below this floor
/// is treated as the floor.
pub const MIN_VIEWPORT: (f32, f32) = (800.0, 600.0);

/// Where and how large a bitmap should be drawn inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Fit a `src_w` × `src_h` bitmap into a `view_w` × `view_h` viewport,
/// preserving aspect ratio and centering the result.
pub fn fit(src_w: f32, src_h: f32, view_w: f32, view_h: f32) -> Placement {
    let view_w = view_w.max(MIN_VIEWPORT.0);
    let view_h = view_h.max(MIN_VIEWPORT.1);
    let aspect = src_w / src_h;

    let (width, height) = if view_w / aspect <= view_h {
        // Width-constrained: the bitmap spans the full viewport width.
        (view_w, view_w / aspect)
    } else {
        (view_h * aspect, view_h)
    };

    Placement {
        width,
        height,
        offset_x: (view_w - width) / 2.0,
        offset_y: (view_h - height) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_aspect_fills_viewport() {
        let p = fit(1600.0, 1200.0, 800.0, 600.0);
        assert_eq!(p.width, 800.0);
        assert_eq!(p.height, 600.0);
        assert_eq!(p.offset_x, 0.0);
        assert_eq!(p.offset_y, 0.0);
    }

    #[test]
    fn test_wide_bitmap_letterboxed() {
        // 2:1 bitmap in a 4:3 viewport fits to width, centered vertically.
        let p = fit(2000.0, 1000.0, 800.0, 600.0);
        assert_eq!(p.width, 800.0);
        assert_eq!(p.height, 400.0);
        assert_eq!(p.offset_x, 0.0);
        assert_eq!(p.offset_y, 100.0);
    }

    #[test]
    fn test_tall_bitmap_pillarboxed() {
        // 1:2 bitmap fits to height, centered horizontally.
        let p = fit(500.0, 1000.0, 800.0, 600.0);
        assert_eq!(p.height, 600.0);
        assert_eq!(p.width, 300.0);
        assert_eq!(p.offset_x, 250.0);
        assert_eq!(p.offset_y, 0.0);
    }

    #[test]
    fn test_degenerate_viewport_clamped_to_floor() {
        // A 1x1 viewport report must behave as the 800x600 floor.
        let p = fit(800.0, 600.0, 1.0, 1.0);
        assert_eq!(p.width, 800.0);
        assert_eq!(p.height, 600.0);
    }

    #[test]
    fn test_never_exceeds_viewport() {
        for &(w, h) in &[(3840.0, 2160.0), (1000.0, 3000.0), (640.0, 480.0)] {
            let p = fit(w, h, 1280.0, 720.0);
            assert!(p.width <= 1280.0 + 0.01, "width {} overflows", p.width);
            assert!(p.height <= 720.0 + 0.01, "height {} overflows", p.height);
        }
    }
}
