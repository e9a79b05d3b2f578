// Window + software drawing utilities.
// Visual effects provided here:
// 1) The "video" and "diff" windows.
// 2) Rectangle outlines for the search window and the eye box.
// 3) A tiny 5x7 bitmap font for the "blink!" banner, intro messages and HUD.

use crate::error::Error;
use crate::types::{FrameBuffer, Rect};
use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};
use std::time::Duration;

pub const RED: u32 = 0x00_FF_00_00;
pub const GREEN: u32 = 0x00_00_FF_00;
pub const YELLOW: u32 = 0x00_FF_FF_00;
pub const WHITE: u32 = 0x00_FF_FF_FF;

/// Keys the main loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Restart,
}

pub struct Drawer {
    window: Window, // the on-screen window you see
}

impl Drawer {
    /// Create a window sized to the camera feed.
    /// Visual: a new empty window appears with your chosen title.
    pub fn new(title: &str, width: usize, height: usize, scale: Scale) -> Result<Self, Error> {
        let opts = WindowOptions { scale, ..WindowOptions::default() };
        let window =
            Window::new(title, width, height, opts).map_err(|e| Error::WindowInit(e.to_string()))?;
        Ok(Self { window })
    }

    /// Upper bound on how often `present` returns; this is the per-frame key wait.
    pub fn set_frame_wait(&mut self, wait: Duration) {
        let ms = wait.as_millis().max(1) as usize;
        self.window.set_target_fps(1000 / ms);
    }

    /// Push the pixels for this frame to the screen.
    /// Visual: the window immediately displays the new image (live video).
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Key pressed since the last `present`: 'q'/ESC quit, 'r' restarts, others are ignored.
    pub fn command(&self) -> Option<Command> {
        key_command(
            self.window.is_key_pressed(Key::Q, KeyRepeat::No) || self.window.is_key_down(Key::Escape),
            self.window.is_key_pressed(Key::R, KeyRepeat::No),
        )
    }
}

/// Quit wins over restart when both arrive in the same frame.
fn key_command(quit: bool, restart: bool) -> Option<Command> {
    if quit {
        Some(Command::Quit)
    } else if restart {
        Some(Command::Restart)
    } else {
        None
    }
}

/// First command from any of the windows; keys reach whichever one has focus.
pub fn poll_commands(windows: &[&Drawer]) -> Option<Command> {
    windows.iter().find_map(|w| w.command())
}

/* ---------- Software drawing: pixels, rectangles, tiny bitmap font ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
/// Visual: the exact pixel at (x,y) changes color.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Draw a 1-pixel outline from the rect's top-left to its bottom-right corner.
/// Visual: a thin box; the parts outside the frame are simply not drawn.
pub fn draw_rect(fb: &mut FrameBuffer, r: Rect, color: u32) {
    let (x0, y0, x1, y1) = (r.x, r.y, r.right(), r.bottom());
    for x in x0..=x1 {
        put_pixel(fb, x, y0, color);
        put_pixel(fb, x, y1, color);
    }
    for y in y0..=y1 {
        put_pixel(fb, x0, y, color);
        put_pixel(fb, x1, y, color);
    }
}

/// Fill a rectangle (clipped to the frame).
/// Visual: a solid block, used as the banner background.
pub fn fill_rect(fb: &mut FrameBuffer, r: Rect, color: u32) {
    let x0 = r.x.max(0);
    let y0 = r.y.max(0);
    let x1 = r.right().min(fb.width as i32);
    let y1 = r.bottom().min(fb.height as i32);
    for y in y0..y1 {
        for x in x0..x1 {
            fb.pixels[y as usize * fb.width + x as usize] = color;
        }
    }
}

/* ---------- 5x7 bitmap font (digits, A-Z, a little punctuation) ---------- */

/// Return a 5x7 glyph bitmap for a limited character set.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
/// Lowercase letters are drawn with the uppercase glyph.
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    // Helper macro to define a glyph quickly
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        // Digits 0..9
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        // Letters
        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b10001,0b01010,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        // Punctuation
        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        '!' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00000,0b00100),
        '\'' => g!(0b00100,0b00100,0b01000,0b00000,0b00000,0b00000,0b00000),
        '#' => g!(0b01010,0b01010,0b11111,0b01010,0b11111,0b01010,0b01010),

        _ => None,
    }
}

pub const GLYPH_ADVANCE: i32 = 6; // 5 pixels glyph width + 1 pixel spacing
pub const GLYPH_HEIGHT: i32 = 7;

/// Width in pixels of `text` drawn with `draw_text_5x7`.
pub fn text_width(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_ADVANCE
}

/// Draw a single 5x7 character at (x,y).
/// Visual: a tiny glyph appears with a 1-pixel black shadow for contrast.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32) {
    if let Some(rows) = glyph5x7(ch) {
        // Shadow pass: offset by (1,1) in black to improve readability
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    put_pixel(fb, x + rx as i32 + 1, y + ry as i32 + 1, 0x00000000);
                }
            }
        }

        // Foreground pass: actual glyph in chosen color
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    put_pixel(fb, x + rx as i32, y + ry as i32, color);
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs.
/// Visual: a compact string appears; each glyph is 5x7 with 1-pixel spacing.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color);
        x += GLYPH_ADVANCE;
    }
}

/// Text in the bottom-left corner, optionally on a red band.
/// Visual: the yellow "BLINK!" banner, or the plain intro messages.
pub fn draw_banner(fb: &mut FrameBuffer, text: &str, with_background: bool) {
    let h = fb.height as i32;
    if with_background {
        fill_rect(fb, Rect::new(0, h - GLYPH_HEIGHT * 2, text_width(text) + 5, GLYPH_HEIGHT * 2), RED);
    }
    draw_text_5x7(fb, 2, h - GLYPH_HEIGHT - GLYPH_HEIGHT / 2, text, YELLOW);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black(w: usize, h: usize) -> FrameBuffer {
        FrameBuffer { width: w, height: h, pixels: vec![0; w * h] }
    }

    fn at(fb: &FrameBuffer, x: usize, y: usize) -> u32 {
        fb.pixels[y * fb.width + x]
    }

    #[test]
    fn quit_beats_restart_and_other_keys_do_nothing() {
        assert_eq!(key_command(true, true), Some(Command::Quit));
        assert_eq!(key_command(true, false), Some(Command::Quit));
        assert_eq!(key_command(false, true), Some(Command::Restart));
        assert_eq!(key_command(false, false), None);
    }

    #[test]
    fn rect_outline_covers_both_corners() {
        let mut fb = black(40, 30);
        draw_rect(&mut fb, Rect::new(5, 5, 10, 8), GREEN);
        assert_eq!(at(&fb, 5, 5), GREEN);
        assert_eq!(at(&fb, 15, 13), GREEN);
        assert_eq!(at(&fb, 10, 5), GREEN);
        assert_eq!(at(&fb, 10, 9), 0);
    }

    #[test]
    fn drawing_outside_the_frame_is_clipped() {
        let mut fb = black(20, 20);
        draw_rect(&mut fb, Rect::new(-5, -5, 40, 40), RED);
        fill_rect(&mut fb, Rect::new(15, 15, 20, 20), WHITE);
        assert_eq!(at(&fb, 19, 19), WHITE);
        assert_eq!(at(&fb, 0, 0), 0);
    }

    #[test]
    fn banner_sits_on_a_red_band_at_the_bottom() {
        let mut fb = black(120, 90);
        draw_banner(&mut fb, "blink!", true);
        assert_eq!(at(&fb, 0, 89), RED);
        assert_eq!(at(&fb, 0, 90 - 14), RED);
        assert_eq!(at(&fb, 0, 90 - 15), 0);
        assert!(fb.pixels.iter().any(|&p| p == YELLOW));
        assert_eq!(at(&fb, 119, 89), 0);
    }

    #[test]
    fn every_intro_character_has_a_glyph() {
        for msg in crate::config::INTRO_MESSAGES {
            for ch in msg.chars() {
                assert!(glyph5x7(ch).is_some(), "no glyph for {ch:?} in {msg:?}");
            }
        }
        assert_eq!(text_width("blink!"), 36);
    }
}
