//! Recording input backend
//!
//! Pretends to be a desktop: keeps a virtual pointer, serves a fixed screen
//! image and logs every call instead of touching the OS.

use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};

use super::{InputDevice, InputError, Key, MouseButton};

/// Virtual time charged for a click, key edge or capture
pub const ACTION_TICK: Duration = Duration::from_millis(1);

/// A call made against a [`RecordingDevice`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Move { x: i32, y: i32, duration: Duration },
    Click(MouseButton),
    Press(Key),
    Release(Key),
    Capture,
    Wait(Duration),
}

/// In-memory device for dry runs and tests
#[derive(Debug, Clone)]
pub struct RecordingDevice {
    /// Virtual pointer position
    position: (i32, i32),
    /// Image returned by every capture
    screen: RgbaImage,
    /// Everything that happened, in order
    events: Vec<InputEvent>,
    /// Virtual clock origin
    origin: Instant,
}

impl RecordingDevice {
    /// Create a device with a black screen of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_screen(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])))
    }

    /// Create a device that captures `screen`
    pub fn with_screen(screen: RgbaImage) -> Self {
        Self {
            position: (0, 0),
            screen,
            events: Vec::new(),
            origin: Instant::now(),
        }
    }

    /// Replace the captured screen
    pub fn set_screen(&mut self, screen: RgbaImage) {
        self.screen = screen;
    }

    /// Recorded events
    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    /// Forget recorded events, keeping the virtual clock where it is
    pub fn clear(&mut self) {
        self.origin += self.elapsed();
        self.events.clear();
    }

    /// Current virtual pointer position
    pub fn position(&self) -> (i32, i32) {
        self.position
    }

    /// Number of clicks recorded
    pub fn click_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, InputEvent::Click(_)))
            .count()
    }

    /// Sum of all simulated time
    ///
    /// Waits and moves take their stated duration; every other action
    /// costs [`ACTION_TICK`].
    pub fn elapsed(&self) -> Duration {
        self.events
            .iter()
            .map(|e| match e {
                InputEvent::Wait(d) | InputEvent::Move { duration: d, .. } => *d,
                _ => ACTION_TICK,
            })
            .sum()
    }
}

impl InputDevice for RecordingDevice {
    fn pointer_position(&mut self) -> Result<(i32, i32), InputError> {
        Ok(self.position)
    }

    fn move_pointer(&mut self, x: i32, y: i32, duration: Duration) -> Result<(), InputError> {
        self.position = (x, y);
        self.events.push(InputEvent::Move { x, y, duration });
        Ok(())
    }

    fn click(&mut self, button: MouseButton) -> Result<(), InputError> {
        log::trace!("click {:?} at {:?}", button, self.position);
        self.events.push(InputEvent::Click(button));
        Ok(())
    }

    fn press_key(&mut self, key: Key) -> Result<(), InputError> {
        self.events.push(InputEvent::Press(key));
        Ok(())
    }

    fn release_key(&mut self, key: Key) -> Result<(), InputError> {
        self.events.push(InputEvent::Release(key));
        Ok(())
    }

    fn capture_screen(&mut self) -> Result<RgbaImage, InputError> {
        self.events.push(InputEvent::Capture);
        Ok(self.screen.clone())
    }

    fn wait(&mut self, duration: Duration) -> Result<(), InputError> {
        self.events.push(InputEvent::Wait(duration));
        Ok(())
    }

    /// Virtual time: the clock only advances by simulated waits and moves
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls() {
        let mut device = RecordingDevice::new(4, 4);

        device.move_pointer(3, 2, Duration::from_millis(20)).unwrap();
        device.click(MouseButton::Right).unwrap();
        device.wait(Duration::from_millis(30)).unwrap();

        assert_eq!(device.pointer_position().unwrap(), (3, 2));
        assert_eq!(device.click_count(), 1);
        assert_eq!(device.elapsed(), Duration::from_millis(50) + ACTION_TICK);
        assert_eq!(device.events().len(), 3);

        let before = device.now();
        device.wait(Duration::from_secs(2)).unwrap();
        assert_eq!(device.now() - before, Duration::from_secs(2));

        device.clear();
        assert!(device.events().is_empty());
    }

    #[test]
    fn test_instant_actions_advance_clock() {
        let mut device = RecordingDevice::new(4, 4);
        let before = device.now();

        device.click(MouseButton::Left).unwrap();
        device.press_key(Key::Char('e')).unwrap();
        device.release_key(Key::Char('e')).unwrap();
        device.capture_screen().unwrap();

        assert_eq!(device.now() - before, ACTION_TICK * 4);
    }

    #[test]
    fn test_capture_returns_screen() {
        let mut device = RecordingDevice::new(2, 3);
        device.set_screen(RgbaImage::from_pixel(5, 6, Rgba([1, 2, 3, 255])));

        let img = device.capture_screen().unwrap();
        assert_eq!(img.dimensions(), (5, 6));
        assert_eq!(device.events(), &[InputEvent::Capture]);
    }
}
