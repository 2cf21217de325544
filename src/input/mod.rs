//! Input injection and screen capture
//!
//! The VM only ever talks to an [`InputDevice`]. The desktop backend drives
//! the real pointer and keyboard; the recording backend captures what would
//! have happened, for dry runs and tests.

#[cfg(feature = "desktop")]
pub mod desktop;
pub mod keys;
pub mod recording;

use std::time::{Duration, Instant};

use image::RgbaImage;

#[cfg(feature = "desktop")]
pub use desktop::DesktopDevice;
pub use keys::{held_keys, release_held_keys, Key, KeyHold};
pub use recording::{InputEvent, RecordingDevice, ACTION_TICK};

/// Mouse buttons the bot can click
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

impl MouseButton {
    /// Parse a script button name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// The capabilities the bot needs from the operating system
///
/// Every suspension goes through [`InputDevice::wait`] so that test devices
/// can observe timing without actually sleeping.
pub trait InputDevice {
    /// Current pointer position in screen pixels
    fn pointer_position(&mut self) -> Result<(i32, i32), InputError>;

    /// Move the pointer to (x, y), taking `duration` to get there
    fn move_pointer(&mut self, x: i32, y: i32, duration: Duration) -> Result<(), InputError>;

    /// Press and release a mouse button
    fn click(&mut self, button: MouseButton) -> Result<(), InputError>;

    /// Press a key down
    fn press_key(&mut self, key: Key) -> Result<(), InputError>;

    /// Release a previously pressed key
    fn release_key(&mut self, key: Key) -> Result<(), InputError>;

    /// Grab the full screen as RGBA pixels
    fn capture_screen(&mut self) -> Result<RgbaImage, InputError>;

    /// Block for `duration`
    fn wait(&mut self, duration: Duration) -> Result<(), InputError> {
        std::thread::sleep(duration);
        Ok(())
    }

    /// Current time as seen by this device
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Input backend errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Input backend failed: {0}")]
    Backend(String),
    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),
}
