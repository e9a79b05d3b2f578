// The only errors this program has are acquisition failures.
// Every variant states *where* things went wrong; all of them are fatal.
// Recognition misses (no eye pair, weak match, no blink) are plain
// `Option`/`bool` results and never show up here.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Creating a window failed.
    #[error("Window init error: {0}")]
    WindowInit(String),

    /// Pushing a buffer to a window failed.
    #[error("Window update error: {0}")]
    WindowUpdate(String),

    /// Opening/starting the camera failed.
    #[error("Cannot initialize camera: {0}")]
    CameraInit(String),

    /// Grabbing/decoding a frame failed (disconnect, end of stream).
    #[error("Cannot query frame: {0}")]
    CameraFrame(String),
}
