// Core types shared by the capture, vision and drawing code.

use image::{GrayImage, RgbImage};

/// Packed pixels ready for a minifb window.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// Pack an RGB camera frame as 0x00RRGGBB.
    /// Visual: the plain live image, before any overlay.
    pub fn from_rgb(img: &RgbImage) -> Self {
        let (w, h) = img.dimensions();
        let pixels = img
            .pixels()
            .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
            .collect();
        Self { width: w as usize, height: h as usize, pixels }
    }

    /// Replicate one gray channel into R, G and B.
    /// Visual: the motion mask shows as white blobs on black.
    pub fn from_gray(img: &GrayImage) -> Self {
        let (w, h) = img.dimensions();
        let pixels = img
            .pixels()
            .map(|p| {
                let v = p[0] as u32;
                (v << 16) | (v << 8) | v
            })
            .collect();
        Self { width: w as usize, height: h as usize, pixels }
    }
}

/// Axis-aligned rectangle in frame pixels. Signed so that a window
/// computed around a point near the border can go negative before it is
/// clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// The whole frame.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// A `width`×`height` rectangle whose centroid is (cx, cy).
    pub fn centered_at(cx: i32, cy: i32, width: i32, height: i32) -> Self {
        Self::new(cx - width / 2, cy - height / 2, width, height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Integer centroid, truncating like the rest of the pixel maths.
    pub fn centroid(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// True if the rectangle lies completely inside a `width`×`height` frame.
    pub fn fits_in(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.width > 0
            && self.height > 0
            && self.right() <= width as i32
            && self.bottom() <= height as i32
    }

    /// True if `other` is inside `self` without touching any edge.
    pub fn strictly_contains_rect(&self, other: &Rect) -> bool {
        other.x > self.x
            && other.y > self.y
            && other.right() < self.right()
            && other.bottom() < self.bottom()
    }

    /// True if (px, py) is inside `self` and not on its border.
    pub fn strictly_contains_point(&self, px: i32, py: i32) -> bool {
        px > self.x && px < self.right() && py > self.y && py < self.bottom()
    }
}

/// One connected component of moved pixels, reduced to its bounding box.
/// Holes are the inner borders of ring-shaped components; they are counted
/// but never classified as eyes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blob {
    pub rect: Rect,
    pub hole: bool,
}
