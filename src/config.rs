// Fixed tuning numbers plus the few things you can change from the command line.
// The numbers were found by experiment with a ~240x180 webcam image of a face
// at arm's length; changing the frame size usually means retuning them.

use argh::FromArgs;
use minifb::Scale;

/* --- Capture --- */
pub const FRAME_WIDTH: u32 = 240;
pub const FRAME_HEIGHT: u32 = 180;

/* --- Eye template and tracking window --- */
pub const TPL_WIDTH: i32 = 16;
pub const TPL_HEIGHT: i32 = 12;
pub const WIN_WIDTH: i32 = TPL_WIDTH * 2;
pub const WIN_HEIGHT: i32 = TPL_HEIGHT * 2;
/// Worst normalized squared difference still accepted as "same eye".
pub const TM_THRESHOLD: f32 = 0.4;

/* --- Motion mask --- */
/// A pixel moved if |current - previous| is above this.
pub const MOTION_THRESHOLD: u8 = 5;

/* --- Eye-pair heuristics --- */
/// Max difference (exclusive) in width, height and y between the two eyes.
pub const PAIR_TOLERANCE: i32 = 5;
/// Allowed |dx| / width, after integer division.
pub const PAIR_MIN_RATIO: i32 = 2;
pub const PAIR_MAX_RATIO: i32 = 5;

/* --- Timing (frames / milliseconds) --- */
pub const SETTLE_FRAMES: usize = 5;
pub const TEXT_FRAMES: u32 = 10;
pub const KEY_WAIT_MS: u64 = 15;
pub const SETTLE_WAIT_MS: u64 = 30;
pub const INTRO_FRAMES: u32 = 20;

pub const INTRO_MESSAGES: [&str; 4] = [
    "Blink Detection 1.0",
    "Press 'q' to quit...",
    "Press 'r' to restart...",
    "Have fun!",
];

pub const VIDEO_WINDOW: &str = "video";
pub const DEBUG_WINDOW: &str = "diff";

#[derive(FromArgs, Debug)]
/// Detect eye blinks from the webcam and run a script on every blink
#[argh(note = "Keys: q or Escape quits, r forgets the eye and searches again.
Closing either window also quits. Every other key is ignored.")]
pub struct Args {
    /// camera index (default: 0)
    #[argh(option, short = 'd', default = "0")]
    pub device: u32,

    /// requested frame width (default: 240)
    #[argh(option, default = "FRAME_WIDTH")]
    pub width: u32,

    /// requested frame height (default: 180)
    #[argh(option, default = "FRAME_HEIGHT")]
    pub height: u32,

    /// script run through /bin/bash on every blink (default: ./blinked.sh)
    #[argh(option, short = 'n', default = "String::from(\"./blinked.sh\")")]
    pub notify: String,

    /// do not run any script on blink
    #[argh(switch)]
    pub no_notify: bool,

    /// skip the start-up messages
    #[argh(switch)]
    pub skip_intro: bool,

    /// window scale factor: 1, 2 or 4 (default: 2)
    #[argh(option, default = "2")]
    pub scale: u32,
}

/// Everything `main` needs, already validated.
pub struct Config {
    pub device: u32,
    pub width: u32,
    pub height: u32,
    /// `None` means blinks are only logged.
    pub notify_script: Option<String>,
    pub skip_intro: bool,
    pub scale: Scale,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let scale = match args.scale {
            1 => Scale::X1,
            4 => Scale::X4,
            _ => Scale::X2,
        };
        Self {
            device: args.device,
            width: args.width,
            height: args.height,
            notify_script: (!args.no_notify).then_some(args.notify),
            skip_intro: args.skip_intro,
            scale,
        }
    }
}
