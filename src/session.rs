// The detection state machine: INIT looks for an eye pair in the whole
// frame, TRACKING follows one eye with its template and watches for blinks.
// The session owns every buffer the detector needs between frames; the main
// loop only feeds it grayscale frames and draws what it reports.

use crate::config::TEXT_FRAMES;
use crate::notify::BlinkNotifier;
use crate::tracker::locate_eye;
use crate::types::Rect;
use crate::vision::{eye_pair, is_blink, motion_blobs};
use image::{GrayImage, imageops};
use log::{debug, info};

/// Which half of the state machine is active.
enum Stage {
    /// Searching the full frame for an eye pair.
    Init,
    /// Following one eye.
    Tracking {
        /// Eye patch captured when the pair was found.
        template: GrayImage,
        /// Where motion is analysed this frame.
        window: Rect,
        /// Current eye box (template-sized).
        eye: Rect,
    },
}

/// Stage change caused by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// INIT -> TRACKING: an eye pair was found and its template captured.
    Acquired,
    /// TRACKING -> INIT: the template no longer matches.
    Lost,
}

/// Rectangles to draw while tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackView {
    pub window: Rect,
    pub eye: Rect,
}

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub transition: Transition,
    /// Set while tracking (including the frame that acquired the eye).
    pub tracking: Option<TrackView>,
    pub blink: bool,
}

pub struct Session<N: BlinkNotifier> {
    stage: Stage,
    prev: Option<GrayImage>,
    mask: GrayImage,
    text_countdown: u32,
    blinks: u64,
    notifier: N,
}

impl<N: BlinkNotifier> Session<N> {
    pub fn new(notifier: N) -> Self {
        Self {
            stage: Stage::Init,
            prev: None,
            mask: GrayImage::new(0, 0),
            text_countdown: 0,
            blinks: 0,
            notifier,
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.stage, Stage::Tracking { .. })
    }

    /// Blinks seen since start; restarts do not reset it.
    pub fn blinks(&self) -> u64 {
        self.blinks
    }

    /// Cleaned motion mask of the last frame (frame-sized, 0 outside the window).
    pub fn motion_mask(&self) -> &GrayImage {
        &self.mask
    }

    /// User asked to start over: drop the template and look for a pair again.
    pub fn restart(&mut self) {
        if self.is_tracking() {
            info!("restart requested, searching for eyes");
            self.stage = Stage::Init;
        }
    }

    /// Consume one frame of the "blink!" text. True while it should show.
    pub fn tick_text(&mut self) -> bool {
        if self.text_countdown == 0 {
            return false;
        }
        self.text_countdown -= 1;
        true
    }

    /// Run detection on one grayscale frame.
    pub fn step(&mut self, gray: &GrayImage) -> StepReport {
        let (w, h) = gray.dimensions();

        // 1) Motion inside the current search window (whole frame in INIT).
        let window = match &self.stage {
            Stage::Init => Rect::full(w, h),
            Stage::Tracking { window, .. } => *window,
        };
        let blobs = match &self.prev {
            Some(prev) => motion_blobs(gray, prev, window, &mut self.mask),
            None => {
                self.mask = GrayImage::new(w, h);
                Vec::new()
            }
        };

        // 2) INIT: two eye-like blobs start tracking on this very frame.
        let mut transition = Transition::None;
        if let Stage::Init = self.stage {
            if let Some(eye) = eye_pair(&blobs).filter(|eye| eye.fits_in(w, h)) {
                let template = imageops::crop_imm(
                    gray,
                    eye.x as u32,
                    eye.y as u32,
                    eye.width as u32,
                    eye.height as u32,
                )
                .to_image();
                info!("eye pair found at {eye:?}, tracking");
                self.stage = Stage::Tracking { template, window, eye };
                self.text_countdown = TEXT_FRAMES;
                transition = Transition::Acquired;
            }
        }

        // 3) TRACKING: follow the template, then look for a blink at the eye.
        let mut tracking = None;
        let mut blink = false;
        if let Stage::Tracking { template, window, eye } = &mut self.stage {
            match locate_eye(gray, template, *eye) {
                Some(found) => {
                    debug!("eye at {:?}, score {:.3}", found.eye, found.score);
                    *window = found.window;
                    *eye = found.eye;
                    tracking = Some(TrackView { window: found.window, eye: found.eye });
                    blink = is_blink(&blobs, found.window, found.eye);
                }
                None => {
                    info!("eye lost, searching again");
                    self.stage = Stage::Init;
                    transition = Transition::Lost;
                }
            }
        }

        if blink {
            self.blinks += 1;
            self.text_countdown = TEXT_FRAMES;
            info!("blink #{}", self.blinks);
            self.notifier.blinked(self.blinks);
        }

        // 4) This frame is the next one's reference.
        self.prev = Some(gray.clone());

        StepReport { transition, tracking, blink }
    }
}
