//! Per-slide freehand ink.
//!
//! Strokes are keyed by the slide's page number, not its position in the
//! deck: a page appearing twice in the slide order shares its ink.

use eframe::egui::{Color32, Pos2};
use std::collections::HashMap;

/// One line segment of a continuous pen drag, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub from: Pos2,
    pub to: Pos2,
    pub width: f32,
    pub color: Color32,
}

/// Ordered ink segments per page. Entries are created lazily on the first
/// stroke and removed entirely on clear; absence and emptiness are
/// equivalent when redrawing.
#[derive(Debug, Default)]
pub struct InkStore {
    strokes: HashMap<u32, Vec<Stroke>>,
}

impl InkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, page: u32, stroke: Stroke) {
        self.strokes.entry(page).or_default().push(stroke);
    }

    /// Strokes for a page in insertion order. Empty for pages never drawn on.
    pub fn strokes(&self, page: u32) -> &[Stroke] {
        self.strokes.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop all ink for one page. Other pages keep theirs.
    pub fn clear(&mut self, page: u32) {
        self.strokes.remove(&page);
    }

    /// Remove strokes whose start point lies within `half_extent` of
    /// `center` on both axes. Returns how many were removed.
    pub fn erase_within(&mut self, page: u32, center: Pos2, half_extent: f32) -> usize {
        let Some(strokes) = self.strokes.get_mut(&page) else {
            return 0;
        };
        let before = strokes.len();
        strokes.retain(|s| {
            (s.from.x - center.x).abs() >= half_extent || (s.from.y - center.y).abs() >= half_extent
        });
        before - strokes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    fn stroke(x0: f32, y0: f32, x1: f32, y1: f32) -> Stroke {
        Stroke {
            from: pos2(x0, y0),
            to: pos2(x1, y1),
            width: 2.0,
            color: Color32::BLACK,
        }
    }

    #[test]
    fn test_unknown_page_is_empty() {
        let ink = InkStore::new();
        assert!(ink.strokes(7).is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut ink = InkStore::new();
        ink.append(1, stroke(0.0, 0.0, 1.0, 1.0));
        ink.append(1, stroke(1.0, 1.0, 2.0, 2.0));
        ink.append(1, stroke(2.0, 2.0, 3.0, 3.0));
        let strokes = ink.strokes(1);
        assert_eq!(strokes.len(), 3);
        assert_eq!(strokes[0].from, pos2(0.0, 0.0));
        assert_eq!(strokes[1].from, pos2(1.0, 1.0));
        assert_eq!(strokes[2].from, pos2(2.0, 2.0));
    }

    #[test]
    fn test_clear_is_per_page() {
        let mut ink = InkStore::new();
        ink.append(1, stroke(0.0, 0.0, 1.0, 1.0));
        ink.append(2, stroke(5.0, 5.0, 6.0, 6.0));
        ink.clear(1);
        assert!(ink.strokes(1).is_empty());
        assert_eq!(ink.strokes(2).len(), 1);
    }

    #[test]
    fn test_erase_box_hits_start_point_only() {
        let mut ink = InkStore::new();
        // Starts inside the box around (10, 10).
        ink.append(1, stroke(11.0, 9.0, 50.0, 50.0));
        // Ends near the point but starts far away: must survive.
        ink.append(1, stroke(100.0, 100.0, 10.0, 10.0));
        let removed = ink.erase_within(1, pos2(10.0, 10.0), 4.0);
        assert_eq!(removed, 1);
        let strokes = ink.strokes(1);
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].from, pos2(100.0, 100.0));
    }

    #[test]
    fn test_erase_box_is_chebyshev() {
        let mut ink = InkStore::new();
        // Within 4.0 on x but not on y: outside the box.
        ink.append(1, stroke(12.0, 20.0, 0.0, 0.0));
        assert_eq!(ink.erase_within(1, pos2(10.0, 10.0), 4.0), 0);
        assert_eq!(ink.strokes(1).len(), 1);
    }

    #[test]
    fn test_erase_on_blank_page_is_noop() {
        let mut ink = InkStore::new();
        assert_eq!(ink.erase_within(3, pos2(0.0, 0.0), 10.0), 0);
    }
}
