//! # Pixel to Point Geometry
//!
//! Fields are authored over a PDF preview rendered in the browser at some
//! container width, with the origin at the top-left and Y growing downwards.
//! PDF drawing happens in points with the origin at the bottom-left and Y
//! growing upwards.
//!
//! ```text
//!   design space (px)                 PDF space (pt)
//!   (0,0) ───────────► x              y ▲
//!     │   ┌──────┐                        │   ┌──────┐  ← top = H - y·s
//!     │   │field │                        │   │field │
//!     ▼   └──────┘                        │   └──────┘  ← pdf_y = H - y·s - h·s
//!     y                             (0,0) └────────────► x
//! ```
//!
//! The scale factor is `page_width / container_width` and is applied
//! uniformly; aspect ratio is assumed to be preserved by the preview.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidocError};

/// Rectangle in design space: pixels, top-left anchored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// True if the point lies inside the rectangle (edges included).
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Build a normalized rectangle from two opposite corners.
    pub fn from_corners(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            x: ax.min(bx),
            y: ay.min(by),
            width: (ax - bx).abs(),
            height: (ay - by).abs(),
        }
    }
}

/// Rectangle in PDF space: points, bottom-left anchored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PdfRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PdfRect {
    /// Y coordinate of the top edge.
    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Largest square that fits, centered in this rectangle.
    pub fn centered_square(&self) -> PdfRect {
        let side = self.width.min(self.height);
        PdfRect {
            x: self.x + (self.width - side) / 2.0,
            y: self.y + (self.height - side) / 2.0,
            width: side,
            height: side,
        }
    }
}

/// Page box in points, as read from the PDF (`MediaBox`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageBox {
    /// Lower-left X of the box (usually 0).
    pub origin_x: f64,
    /// Lower-left Y of the box (usually 0).
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            width,
            height,
        }
    }
}

/// Uniform design-space to PDF-space transform for one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTransform {
    scale: f64,
    page: PageBox,
}

impl ScaleTransform {
    /// Build the transform for fields authored at `container_width` pixels.
    ///
    /// A zero, negative or non-finite container width is a caller error and
    /// is rejected instead of producing infinite coordinates.
    pub fn new(container_width: f64, page: PageBox) -> Result<Self> {
        if !container_width.is_finite() || container_width <= 0.0 {
            return Err(ValidocError::InvalidContainerWidth(container_width));
        }
        if !(page.width.is_finite() && page.height.is_finite())
            || page.width <= 0.0
            || page.height <= 0.0
        {
            return Err(ValidocError::InvalidPageSize(page.width, page.height));
        }
        Ok(Self {
            scale: page.width / container_width,
            page,
        })
    }

    /// Points per design pixel.
    pub fn scale_factor(&self) -> f64 {
        self.scale
    }

    pub fn page(&self) -> PageBox {
        self.page
    }

    /// Map a design-space rectangle to a bottom-left anchored PDF rectangle.
    pub fn to_pdf(&self, rect: &PixelRect) -> PdfRect {
        let width = rect.width * self.scale;
        let height = rect.height * self.scale;
        PdfRect {
            x: self.page.origin_x + rect.x * self.scale,
            y: self.page.origin_y + self.page.height - rect.y * self.scale - height,
            width,
            height,
        }
    }

    /// Inverse of [`ScaleTransform::to_pdf`].
    pub fn to_pixels(&self, rect: &PdfRect) -> PixelRect {
        let width = rect.width / self.scale;
        let height = rect.height / self.scale;
        let top_from_page_top = self.page.height - (rect.y - self.page.origin_y) - rect.height;
        PixelRect {
            x: (rect.x - self.page.origin_x) / self.scale,
            y: top_from_page_top / self.scale,
            width,
            height,
        }
    }
}
