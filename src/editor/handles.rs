//! Resize handles of the selected field.
//!
//! ```text
//!   TopLeft ─── Top ─── TopRight
//!      │                   │
//!    Left               Right
//!      │                   │
//!   BottomLeft─ Bottom ─ BottomRight
//! ```

use crate::geometry::PixelRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl ResizeHandle {
    /// Corners first: they win when handles overlap on tiny fields.
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::TopLeft,
        ResizeHandle::TopRight,
        ResizeHandle::BottomRight,
        ResizeHandle::BottomLeft,
        ResizeHandle::Top,
        ResizeHandle::Right,
        ResizeHandle::Bottom,
        ResizeHandle::Left,
    ];

    /// Center of the handle on `rect`.
    pub fn position(self, rect: &PixelRect) -> (f64, f64) {
        let cx = rect.x + rect.width / 2.0;
        let cy = rect.y + rect.height / 2.0;
        match self {
            ResizeHandle::TopLeft => (rect.x, rect.y),
            ResizeHandle::Top => (cx, rect.y),
            ResizeHandle::TopRight => (rect.right(), rect.y),
            ResizeHandle::Right => (rect.right(), cy),
            ResizeHandle::BottomRight => (rect.right(), rect.bottom()),
            ResizeHandle::Bottom => (cx, rect.bottom()),
            ResizeHandle::BottomLeft => (rect.x, rect.bottom()),
            ResizeHandle::Left => (rect.x, cy),
        }
    }

    /// Handle within `radius` of the pointer, if any.
    pub fn hit(rect: &PixelRect, x: f64, y: f64, radius: f64) -> Option<ResizeHandle> {
        Self::ALL.into_iter().find(|h| {
            let (hx, hy) = h.position(rect);
            (hx - x).hypot(hy - y) <= radius
        })
    }

    fn moves_left(self) -> bool {
        matches!(
            self,
            ResizeHandle::TopLeft | ResizeHandle::Left | ResizeHandle::BottomLeft
        )
    }

    fn moves_right(self) -> bool {
        matches!(
            self,
            ResizeHandle::TopRight | ResizeHandle::Right | ResizeHandle::BottomRight
        )
    }

    fn moves_top(self) -> bool {
        matches!(
            self,
            ResizeHandle::TopLeft | ResizeHandle::Top | ResizeHandle::TopRight
        )
    }

    fn moves_bottom(self) -> bool {
        matches!(
            self,
            ResizeHandle::BottomLeft | ResizeHandle::Bottom | ResizeHandle::BottomRight
        )
    }

    /// Drag this handle of `original` to the pointer.
    ///
    /// The opposite edges stay put, the pointer is clamped to the container
    /// and neither side shrinks below `min_size`.
    pub fn resize(
        self,
        original: &PixelRect,
        x: f64,
        y: f64,
        min_size: f64,
        container: (f64, f64),
    ) -> PixelRect {
        let x = x.clamp(0.0, container.0);
        let y = y.clamp(0.0, container.1);

        let mut left = original.x;
        let mut top = original.y;
        let mut right = original.right();
        let mut bottom = original.bottom();

        if self.moves_left() {
            left = x.min(right - min_size).max(0.0);
        }
        if self.moves_right() {
            right = x.max(left + min_size);
        }
        if self.moves_top() {
            top = y.min(bottom - min_size).max(0.0);
        }
        if self.moves_bottom() {
            bottom = y.max(top + min_size);
        }

        PixelRect::new(left, top, right - left, bottom - top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> PixelRect {
        PixelRect::new(100.0, 100.0, 80.0, 40.0)
    }

    #[test]
    fn test_eight_distinct_handles() {
        let positions: Vec<(f64, f64)> = ResizeHandle::ALL.iter().map(|h| h.position(&rect())).collect();
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_hit_radius() {
        assert_eq!(ResizeHandle::hit(&rect(), 182.0, 141.0, 6.0), Some(ResizeHandle::BottomRight));
        assert_eq!(ResizeHandle::hit(&rect(), 140.0, 98.0, 6.0), Some(ResizeHandle::Top));
        assert_eq!(ResizeHandle::hit(&rect(), 140.0, 120.0, 6.0), None);
    }

    #[test]
    fn test_corner_resize_keeps_opposite_corner() {
        let r = ResizeHandle::TopLeft.resize(&rect(), 90.0, 80.0, 10.0, (800.0, 1000.0));
        assert_eq!(r, PixelRect::new(90.0, 80.0, 90.0, 60.0));
    }

    #[test]
    fn test_edge_resize_changes_one_axis() {
        let r = ResizeHandle::Right.resize(&rect(), 300.0, 5.0, 10.0, (800.0, 1000.0));
        assert_eq!(r, PixelRect::new(100.0, 100.0, 200.0, 40.0));
    }

    #[test]
    fn test_resize_respects_min_size_and_container() {
        let r = ResizeHandle::BottomRight.resize(&rect(), 0.0, 0.0, 10.0, (800.0, 1000.0));
        assert_eq!(r.width, 10.0);
        assert_eq!(r.height, 10.0);

        let r = ResizeHandle::BottomRight.resize(&rect(), 5000.0, 5000.0, 10.0, (800.0, 1000.0));
        assert_eq!(r.right(), 800.0);
        assert_eq!(r.bottom(), 1000.0);
    }
}
