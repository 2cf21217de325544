//! Desktop input backend
//!
//! Pointer and keyboard injection through `enigo`, primary-display capture
//! through `scrap`.

use std::io::ErrorKind;
use std::time::Duration;

use enigo::{Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
use image::{ImageBuffer, RgbaImage};
use scrap::{Capturer, Display};

use super::{InputDevice, InputError, Key, MouseButton};

/// How long to back off when the capturer has no fresh frame yet
const FRAME_RETRY_DELAY: Duration = Duration::from_millis(5);

/// Give up on a capture after this many empty polls
const MAX_FRAME_RETRIES: u32 = 400;

/// The real desktop
pub struct DesktopDevice {
    enigo: Enigo,
}

impl DesktopDevice {
    /// Connect to the windowing system
    pub fn new() -> Result<Self, InputError> {
        let enigo = Enigo::new(&Settings::default()).map_err(backend)?;
        Ok(Self { enigo })
    }
}

fn backend<E: std::fmt::Display>(e: E) -> InputError {
    InputError::Backend(e.to_string())
}

fn capture<E: std::fmt::Display>(e: E) -> InputError {
    InputError::CaptureFailed(e.to_string())
}

fn enigo_key(key: Key) -> Result<enigo::Key, InputError> {
    let key = match key {
        Key::Char(c) => enigo::Key::Unicode(c),
        Key::Space => enigo::Key::Space,
        Key::Enter => enigo::Key::Return,
        Key::Tab => enigo::Key::Tab,
        Key::Escape => enigo::Key::Escape,
        Key::Backspace => enigo::Key::Backspace,
        Key::Shift => enigo::Key::Shift,
        Key::Control => enigo::Key::Control,
        Key::Alt => enigo::Key::Alt,
        Key::Up => enigo::Key::UpArrow,
        Key::Down => enigo::Key::DownArrow,
        Key::Left => enigo::Key::LeftArrow,
        Key::Right => enigo::Key::RightArrow,
        Key::F(1) => enigo::Key::F1,
        Key::F(2) => enigo::Key::F2,
        Key::F(3) => enigo::Key::F3,
        Key::F(4) => enigo::Key::F4,
        Key::F(5) => enigo::Key::F5,
        Key::F(6) => enigo::Key::F6,
        Key::F(7) => enigo::Key::F7,
        Key::F(8) => enigo::Key::F8,
        Key::F(9) => enigo::Key::F9,
        Key::F(10) => enigo::Key::F10,
        Key::F(11) => enigo::Key::F11,
        Key::F(12) => enigo::Key::F12,
        Key::F(n) => return Err(InputError::Backend(format!("no such key f{n}"))),
    };
    Ok(key)
}

impl InputDevice for DesktopDevice {
    fn pointer_position(&mut self) -> Result<(i32, i32), InputError> {
        self.enigo.location().map_err(backend)
    }

    fn move_pointer(&mut self, x: i32, y: i32, duration: Duration) -> Result<(), InputError> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(backend)?;
        self.wait(duration)
    }

    fn click(&mut self, button: MouseButton) -> Result<(), InputError> {
        let button = match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
        };
        self.enigo
            .button(button, Direction::Click)
            .map_err(backend)
    }

    fn press_key(&mut self, key: Key) -> Result<(), InputError> {
        self.enigo
            .key(enigo_key(key)?, Direction::Press)
            .map_err(backend)
    }

    fn release_key(&mut self, key: Key) -> Result<(), InputError> {
        self.enigo
            .key(enigo_key(key)?, Direction::Release)
            .map_err(backend)
    }

    fn capture_screen(&mut self) -> Result<RgbaImage, InputError> {
        let display = Display::primary().map_err(capture)?;
        let mut capturer = Capturer::new(display).map_err(capture)?;
        let (width, height) = (capturer.width(), capturer.height());

        for _ in 0..MAX_FRAME_RETRIES {
            let frame = match capturer.frame() {
                Ok(frame) => frame,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(FRAME_RETRY_DELAY);
                    continue;
                }
                Err(e) => return Err(capture(e)),
            };

            // Rows may be padded past width * 4 bytes
            let stride = frame.len() / height;
            let mut rgba = Vec::with_capacity(width * height * 4);
            for row in frame.chunks(stride).take(height) {
                for bgra in row[..width * 4].chunks_exact(4) {
                    rgba.extend_from_slice(&[bgra[2], bgra[1], bgra[0], 255]);
                }
            }

            return ImageBuffer::from_raw(width as u32, height as u32, rgba)
                .ok_or_else(|| InputError::CaptureFailed("frame size mismatch".into()));
        }

        Err(InputError::CaptureFailed("no frame available".into()))
    }
}
