// What you SEE now:
// • "video": the live camera. Once your eyes are found, a red box (search
//   window) and a green box (eye) follow your eye, and "BLINK!" flashes on
//   every blink.
// • "diff": the motion mask, white where something moved.
// • Q or ESC quits from either window, and so does closing one. R forgets
//   the eye and searches again. Other keys do nothing.
// Blink your eyes once or twice while looking at the camera to get picked up.

mod camera;
mod config;
mod draw;
mod error;
mod notify;
mod session;
mod tracker;
mod types;
mod vision;

use camera::CameraCapture;
use config::{
    Args, Config, DEBUG_WINDOW, INTRO_FRAMES, INTRO_MESSAGES, KEY_WAIT_MS, SETTLE_FRAMES,
    SETTLE_WAIT_MS, VIDEO_WINDOW,
};
use draw::{
    Command, Drawer, GREEN, RED, WHITE, draw_banner, draw_rect, draw_text_5x7, poll_commands,
};
use error::Error;
use image::imageops;
use log::{debug, info};
use notify::{BlinkNotifier, ScriptNotifier, SilentNotifier};
use session::{Session, Transition};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use types::FrameBuffer;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();
    let cfg = Config::from(args);

    // Camera and windows are dropped by the time we get here, on both paths.
    match run(cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Open everything, then pick the notifier once so the loop is monomorphic.
fn run(cfg: Config) -> Result<(), Error> {
    /* --- Camera + main window ---
       Visual: window opens with live camera feed. */
    let mut cam = CameraCapture::new(cfg.device, cfg.width, cfg.height)?;
    let (w, h) = cam.resolution();
    let mut video = Drawer::new(VIDEO_WINDOW, w as usize, h as usize, cfg.scale)?;

    if !cfg.skip_intro {
        play_intro(&mut cam, &mut video)?;
    }

    /* --- Debug window (motion mask) --- */
    let mut debug_view = Drawer::new(DEBUG_WINDOW, w as usize, h as usize, cfg.scale)?;
    video.set_frame_wait(Duration::from_millis(KEY_WAIT_MS));

    match cfg.notify_script {
        Some(script) => {
            info!("running {script} on every blink");
            detect_loop(&mut cam, &mut video, &mut debug_view, Session::new(ScriptNotifier::new(script)))
        }
        None => detect_loop(&mut cam, &mut video, &mut debug_view, Session::new(SilentNotifier)),
    }
}

fn detect_loop<N: BlinkNotifier>(
    cam: &mut CameraCapture,
    video: &mut Drawer,
    debug_view: &mut Drawer,
    mut session: Session<N>,
) -> Result<(), Error> {
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;

    /* ------------------------------ Main loop ------------------------------ */
    while video.is_open() && debug_view.is_open() {
        /* 1) Grab a fresh live frame and its grayscale copy. */
        let frame = cam.next_frame()?;
        let gray = imageops::grayscale(&frame);

        /* 2) Detect / track / classify. */
        let report = session.step(&gray);

        /* 3) Just found the eyes: give the user a moment before tracking for real. */
        if report.transition == Transition::Acquired {
            settle(cam, video, debug_view, &FrameBuffer::from_gray(session.motion_mask()))?;
        }

        /* 4) Overlays: boxes on both windows, banner while the countdown runs. */
        let mut screen = FrameBuffer::from_rgb(&frame);
        let mut mask = FrameBuffer::from_gray(session.motion_mask());
        if let Some(view) = report.tracking {
            draw_rect(&mut screen, view.window, RED);
            draw_rect(&mut screen, view.eye, GREEN);
            draw_rect(&mut mask, view.window, WHITE);
            draw_rect(&mut mask, view.eye, WHITE);
            if session.tick_text() {
                draw_banner(&mut screen, "blink!", true);
            }
        }
        let stage = if session.is_tracking() { "TRACKING" } else { "INIT" };
        let hud = format!("{stage} | BLINKS: {}", session.blinks());
        draw_text_5x7(&mut screen, 4, 4, &hud, WHITE);

        /* 5) Present (this is also where we wait for keys). */
        video.present(&screen)?;
        debug_view.present(&mask)?;

        match poll_commands(&[&*video, &*debug_view]) {
            Some(Command::Quit) => break,
            Some(Command::Restart) => session.restart(),
            None => {}
        }

        /* 6) Frame rate, once per second. */
        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            debug!("FPS: {:.1}", frames_this_second as f32 / secs);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    info!("quit after {} blinks", session.blinks());
    Ok(())
}

/// Show a few raw frames without analysing them.
/// Visual: the feed keeps moving, the debug window holds the last mask.
fn settle(
    cam: &mut CameraCapture,
    video: &mut Drawer,
    debug_view: &mut Drawer,
    mask: &FrameBuffer,
) -> Result<(), Error> {
    video.set_frame_wait(Duration::from_millis(SETTLE_WAIT_MS));
    for _ in 0..SETTLE_FRAMES {
        let frame = cam.next_frame()?;
        video.present(&FrameBuffer::from_rgb(&frame))?;
        debug_view.present(mask)?;
    }
    video.set_frame_wait(Duration::from_millis(KEY_WAIT_MS));
    Ok(())
}

/// Start-up messages, each over a short stretch of live video.
fn play_intro(cam: &mut CameraCapture, video: &mut Drawer) -> Result<(), Error> {
    video.set_frame_wait(Duration::from_millis(SETTLE_WAIT_MS));
    for msg in INTRO_MESSAGES {
        for _ in 0..INTRO_FRAMES {
            if !video.is_open() {
                return Ok(());
            }
            let frame = cam.next_frame()?;
            let mut screen = FrameBuffer::from_rgb(&frame);
            draw_banner(&mut screen, msg, false);
            video.present(&screen)?;
        }
    }
    Ok(())
}
