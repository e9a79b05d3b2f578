// Motion blobs and the two blob-geometry heuristics.
// Visual expectation: the "diff" window shows white blobs wherever something
// moved inside the search window; two level blobs of the same size are read
// as an eye pair, one blob sitting on the tracked eye is read as a blink.

use crate::config::{
    MOTION_THRESHOLD, PAIR_MAX_RATIO, PAIR_MIN_RATIO, PAIR_TOLERANCE, TPL_HEIGHT, TPL_WIDTH,
};
use crate::types::{Blob, Rect};
use image::{GrayImage, Luma, imageops};
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use imageproc::point::Point;

/// Find the connected components of moved pixels inside `window`.
///
/// `mask` is the full-frame debug image: it is cleared, then the cleaned
/// motion mask of the window is written back at the window position.
/// Blob rectangles are in frame coordinates. `window` must already lie
/// inside the frame.
pub fn motion_blobs(
    gray: &GrayImage,
    prev: &GrayImage,
    window: Rect,
    mask: &mut GrayImage,
) -> Vec<Blob> {
    // 1) Start from an empty mask every frame.
    if mask.dimensions() != gray.dimensions() {
        *mask = GrayImage::new(gray.width(), gray.height());
    } else {
        mask.fill(0);
    }
    if !window.fits_in(gray.width(), gray.height()) || prev.dimensions() != gray.dimensions() {
        return Vec::new();
    }

    let (wx, wy) = (window.x as u32, window.y as u32);
    let (ww, wh) = (window.width as u32, window.height as u32);

    // 2) |current - previous| over the window, binarized: moved = 255.
    let moved = GrayImage::from_fn(ww, wh, |x, y| {
        let a = gray.get_pixel(wx + x, wy + y)[0];
        let b = prev.get_pixel(wx + x, wy + y)[0];
        if a.abs_diff(b) > MOTION_THRESHOLD { Luma([255]) } else { Luma([0]) }
    });

    // 3) Opening with a 3x3 cross (L1 ball of radius 1) wipes out speckle.
    let cleaned = morphology::open(&moved, Norm::L1, 1);
    imageops::replace(mask, &cleaned, wx as i64, wy as i64);

    // 4) Outer borders and hole borders both count as components.
    //    An outer border only starts after a 0 pixel, so a blob in column 0
    //    would come back as a hole: trace a copy with a 1 px zero margin.
    let mut padded = GrayImage::new(ww + 2, wh + 2);
    imageops::replace(&mut padded, &cleaned, 1, 1);
    find_contours::<i32>(&padded)
        .into_iter()
        .filter_map(|contour| {
            let rect = bounding_rect(&contour.points)?;
            Some(Blob {
                rect: Rect::new(
                    rect.x - 1 + window.x,
                    rect.y - 1 + window.y,
                    rect.width,
                    rect.height,
                ),
                hole: matches!(contour.border_type, BorderType::Hole),
            })
        })
        .collect()
}

/// Smallest rectangle holding every point (inclusive pixel extents).
fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    Some(Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}

/// Decide whether the blobs are a left/right eye pair.
///
/// Rules found by experiment: exactly two outer components, about the same
/// size, about the same height in the frame, and a horizontal gap of 2 to
/// 5 eye widths. The ratio is an integer division on purpose, so 5.9 eye
/// widths still passes as 5.
///
/// Returns a template-sized rectangle centered on the first blob.
pub fn eye_pair(blobs: &[Blob]) -> Option<Rect> {
    let [a, b] = blobs else {
        return None;
    };
    if a.hole || b.hole {
        return None;
    }
    let (r1, r2) = (a.rect, b.rect);

    if (r1.width - r2.width).abs() >= PAIR_TOLERANCE {
        return None;
    }
    if (r1.height - r2.height).abs() >= PAIR_TOLERANCE {
        return None;
    }
    if (r1.y - r2.y).abs() >= PAIR_TOLERANCE {
        return None;
    }

    let ratio = (r1.x - r2.x).abs().checked_div(r1.width)?;
    if !(PAIR_MIN_RATIO..=PAIR_MAX_RATIO).contains(&ratio) {
        return None;
    }

    let (cx, cy) = r1.centroid();
    Some(Rect::centered_at(cx, cy, TPL_WIDTH, TPL_HEIGHT))
}

/// Decide whether this frame's motion is a blink of the tracked eye.
///
/// A blink is a single component lying strictly inside the search window
/// with the eye's centroid strictly inside it.
pub fn is_blink(blobs: &[Blob], window: Rect, eye: Rect) -> bool {
    let [blob] = blobs else {
        return false;
    };
    if !window.strictly_contains_rect(&blob.rect) {
        return false;
    }
    let (cx, cy) = eye.centroid();
    blob.rect.strictly_contains_point(cx, cy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outer(x: i32, y: i32, w: i32, h: i32) -> Blob {
        Blob { rect: Rect::new(x, y, w, h), hole: false }
    }

    fn paint(img: &mut GrayImage, r: Rect, v: u8) {
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                img.put_pixel(x as u32, y as u32, Luma([v]));
            }
        }
    }

    /* ---------------- motion_blobs ---------------- */

    #[test]
    fn two_moving_squares_give_two_blobs() {
        let prev = GrayImage::new(128, 96);
        let mut cur = prev.clone();
        paint(&mut cur, Rect::new(40, 40, 8, 6), 200);
        paint(&mut cur, Rect::new(64, 40, 8, 6), 200);

        let mut mask = GrayImage::new(128, 96);
        let blobs = motion_blobs(&cur, &prev, Rect::full(128, 96), &mut mask);

        assert_eq!(blobs, vec![outer(40, 40, 8, 6), outer(64, 40, 8, 6)]);
        assert_eq!(mask.get_pixel(44, 43)[0], 255);
        assert_eq!(mask.get_pixel(10, 10)[0], 0);
    }

    #[test]
    fn small_differences_and_speckle_are_ignored() {
        let prev = GrayImage::from_pixel(64, 48, Luma([100]));
        let mut cur = GrayImage::from_pixel(64, 48, Luma([105]));
        // a lone pixel and a 2-pixel line do not survive the opening
        cur.put_pixel(10, 10, Luma([250]));
        cur.put_pixel(30, 30, Luma([250]));
        cur.put_pixel(31, 30, Luma([250]));

        let mut mask = GrayImage::new(64, 48);
        let blobs = motion_blobs(&cur, &prev, Rect::full(64, 48), &mut mask);

        assert!(blobs.is_empty());
        assert!(mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn motion_outside_the_window_is_ignored_and_coords_are_global() {
        let prev = GrayImage::new(96, 64);
        let mut cur = prev.clone();
        paint(&mut cur, Rect::new(5, 5, 6, 6), 255);
        paint(&mut cur, Rect::new(50, 30, 6, 6), 255);

        let mut mask = GrayImage::from_pixel(96, 64, Luma([255]));
        let window = Rect::new(40, 20, 32, 24);
        let blobs = motion_blobs(&cur, &prev, window, &mut mask);

        assert_eq!(blobs, vec![outer(50, 30, 6, 6)]);
        // stale mask content outside the window is cleared
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(7, 7)[0], 0);
    }

    #[test]
    fn pair_on_the_left_frame_edge_is_outer_and_accepted() {
        let prev = GrayImage::new(160, 120);
        let mut cur = prev.clone();
        paint(&mut cur, Rect::new(0, 10, 20, 30), 255);
        paint(&mut cur, Rect::new(60, 10, 20, 30), 255);

        let mut mask = GrayImage::new(160, 120);
        let blobs = motion_blobs(&cur, &prev, Rect::full(160, 120), &mut mask);

        assert_eq!(blobs, vec![outer(0, 10, 20, 30), outer(60, 10, 20, 30)]);
        assert_eq!(eye_pair(&blobs), Some(Rect::new(2, 19, 16, 12)));
    }

    #[test]
    fn corner_blob_is_an_outer_component() {
        let prev = GrayImage::new(32, 32);
        let mut cur = prev.clone();
        paint(&mut cur, Rect::new(0, 0, 3, 3), 255);

        let mut mask = GrayImage::new(32, 32);
        let blobs = motion_blobs(&cur, &prev, Rect::full(32, 32), &mut mask);

        assert_eq!(blobs.len(), 1);
        assert!(!blobs[0].hole);
        assert_eq!((blobs[0].rect.x, blobs[0].rect.y), (0, 0));
    }

    #[test]
    fn blob_on_the_window_left_column_is_outer_in_frame_coords() {
        let prev = GrayImage::new(96, 64);
        let mut cur = prev.clone();
        paint(&mut cur, Rect::new(40, 30, 6, 6), 255);

        let mut mask = GrayImage::new(96, 64);
        let window = Rect::new(40, 20, 32, 24);
        let blobs = motion_blobs(&cur, &prev, window, &mut mask);

        assert_eq!(blobs, vec![outer(40, 30, 6, 6)]);
        assert_eq!(mask.get_pixel(40, 30)[0], 255);
    }

    #[test]
    fn ring_reports_its_hole() {
        let prev = GrayImage::new(64, 64);
        let mut cur = prev.clone();
        paint(&mut cur, Rect::new(10, 10, 20, 20), 255);
        paint(&mut cur, Rect::new(16, 16, 8, 8), 0);

        let mut mask = GrayImage::new(64, 64);
        let blobs = motion_blobs(&cur, &prev, Rect::full(64, 64), &mut mask);

        assert_eq!(blobs.len(), 2);
        assert_eq!(blobs.iter().filter(|b| b.hole).count(), 1);
        assert!(blobs.iter().any(|b| !b.hole && b.rect == Rect::new(10, 10, 20, 20)));
        assert_eq!(eye_pair(&blobs), None);
    }

    #[test]
    fn mismatched_previous_frame_gives_no_blobs() {
        let prev = GrayImage::new(32, 32);
        let cur = GrayImage::from_pixel(64, 48, Luma([255]));
        let mut mask = GrayImage::new(1, 1);
        let blobs = motion_blobs(&cur, &prev, Rect::full(64, 48), &mut mask);
        assert!(blobs.is_empty());
        assert_eq!(mask.dimensions(), (64, 48));
    }

    /* ---------------- eye_pair ---------------- */

    #[test]
    fn reference_pair_is_accepted() {
        let blobs = [outer(10, 10, 20, 30), outer(70, 10, 20, 30)];
        assert_eq!(eye_pair(&blobs), Some(Rect::new(12, 19, 16, 12)));
    }

    #[test]
    fn ratios_two_to_five_accepted() {
        for dx in [40, 60, 80, 100, 119] {
            let blobs = [outer(10, 10, 20, 30), outer(10 + dx, 12, 22, 27)];
            assert_eq!(eye_pair(&blobs), Some(Rect::new(12, 19, 16, 12)), "dx = {dx}");
        }
        // order does not matter for the distance, the first blob is the eye
        let blobs = [outer(110, 10, 20, 30), outer(10, 10, 20, 30)];
        assert_eq!(eye_pair(&blobs), Some(Rect::new(112, 19, 16, 12)));
    }

    #[test]
    fn ratio_one_and_six_rejected() {
        for dx in [20, 39, 120, 130] {
            let blobs = [outer(10, 10, 20, 30), outer(10 + dx, 10, 20, 30)];
            assert_eq!(eye_pair(&blobs), None, "dx = {dx}");
        }
    }

    #[test]
    fn size_and_alignment_limits() {
        let base = outer(10, 10, 20, 30);
        assert!(eye_pair(&[base, outer(70, 10, 24, 30)]).is_some());
        assert!(eye_pair(&[base, outer(70, 10, 25, 30)]).is_none());
        assert!(eye_pair(&[base, outer(70, 10, 20, 34)]).is_some());
        assert!(eye_pair(&[base, outer(70, 10, 20, 35)]).is_none());
        assert!(eye_pair(&[base, outer(70, 14, 20, 30)]).is_some());
        assert!(eye_pair(&[base, outer(70, 5, 20, 30)]).is_none());
    }

    #[test]
    fn needs_exactly_two_blobs() {
        let a = outer(10, 10, 20, 30);
        let b = outer(70, 10, 20, 30);
        assert_eq!(eye_pair(&[]), None);
        assert_eq!(eye_pair(&[a]), None);
        assert_eq!(eye_pair(&[a, b, outer(130, 10, 20, 30)]), None);
    }

    /* ---------------- is_blink ---------------- */

    const WINDOW: Rect = Rect::new(10, 10, 32, 24);
    const EYE: Rect = Rect::new(18, 16, 16, 12); // centroid (26, 22)

    #[test]
    fn blob_on_the_eye_is_a_blink() {
        assert!(is_blink(&[outer(20, 18, 10, 8)], WINDOW, EYE));
    }

    #[test]
    fn blob_touching_or_leaving_the_window_is_not() {
        assert!(!is_blink(&[outer(10, 18, 20, 8)], WINDOW, EYE));
        assert!(!is_blink(&[outer(20, 10, 10, 20)], WINDOW, EYE));
        assert!(!is_blink(&[outer(20, 18, 22, 8)], WINDOW, EYE));
        assert!(!is_blink(&[outer(20, 18, 10, 16)], WINDOW, EYE));
        assert!(!is_blink(&[outer(5, 18, 30, 8)], WINDOW, EYE));
    }

    #[test]
    fn centroid_on_blob_edge_is_not() {
        assert!(!is_blink(&[outer(26, 18, 10, 8)], WINDOW, EYE));
        assert!(!is_blink(&[outer(16, 18, 10, 8)], WINDOW, EYE));
        assert!(!is_blink(&[outer(20, 22, 10, 8)], WINDOW, EYE));
        assert!(!is_blink(&[outer(20, 14, 10, 8)], WINDOW, EYE));
    }

    #[test]
    fn more_than_one_blob_is_not() {
        let b = outer(20, 18, 10, 8);
        assert!(!is_blink(&[], WINDOW, EYE));
        assert!(!is_blink(&[b, b], WINDOW, EYE));
    }
}
