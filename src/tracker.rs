// Follows one eye from frame to frame by template matching.
// Visual expectation: the red search window and the green eye box slide
// along with the eye; when the eye leaves the window the match score gets
// worse than TM_THRESHOLD and the tracker gives up.

use crate::config::{TM_THRESHOLD, TPL_HEIGHT, TPL_WIDTH, WIN_HEIGHT, WIN_WIDTH};
use crate::types::Rect;
use image::{GrayImage, imageops};
use imageproc::template_matching::{MatchTemplateMethod, find_extremes, match_template};
use log::debug;

/// Where the eye was found this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located {
    /// Search window the match was run in (inside the frame).
    pub window: Rect,
    /// New template-sized eye box.
    pub eye: Rect,
    /// Normalized squared difference at the best match; 0 is a perfect match.
    pub score: f32,
}

/// WIN_WIDTH×WIN_HEIGHT window centered on the eye's centroid, pushed back
/// inside a `width`×`height` frame. `None` if the frame is smaller than the
/// window.
pub fn search_window(eye: Rect, width: u32, height: u32) -> Option<Rect> {
    let (w, h) = (width as i32, height as i32);
    if w < WIN_WIDTH || h < WIN_HEIGHT {
        return None;
    }
    let (cx, cy) = eye.centroid();
    let mut win = Rect::centered_at(cx, cy, WIN_WIDTH, WIN_HEIGHT);
    win.x = win.x.clamp(0, w - WIN_WIDTH);
    win.y = win.y.clamp(0, h - WIN_HEIGHT);
    Some(win)
}

/// Find `template` near the last known `eye` position in `gray`.
///
/// Only matches with a score ≤ TM_THRESHOLD count; anything worse, or a
/// score that is not a number (flat image patches), means "not found".
pub fn locate_eye(gray: &GrayImage, template: &GrayImage, eye: Rect) -> Option<Located> {
    let window = search_window(eye, gray.width(), gray.height())?;
    if (template.width() as i32) > window.width || (template.height() as i32) > window.height {
        return None;
    }

    // The result image is (W - w + 1) x (H - h + 1); W >= w is checked above.
    let patch = imageops::crop_imm(
        gray,
        window.x as u32,
        window.y as u32,
        window.width as u32,
        window.height as u32,
    )
    .to_image();
    let scores = match_template(&patch, template, MatchTemplateMethod::SumOfSquaredErrorsNormalized);
    let extremes = find_extremes(&scores);

    let score = extremes.min_value;
    if score.is_nan() || score > TM_THRESHOLD {
        debug!("match rejected, score {score:.3}");
        return None;
    }

    let (mx, my) = extremes.min_value_location;
    Some(Located {
        window,
        eye: Rect::new(window.x + mx as i32, window.y + my as i32, TPL_WIDTH, TPL_HEIGHT),
        score,
    })
}
