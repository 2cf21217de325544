//! Keyboard vocabulary and the held-key safeguard
//!
//! A key held by `pkey` must never stay pressed at the OS level if the bot
//! dies mid-hold. Pressed keys are tracked in a process-wide registry that
//! an interrupt handler can drain, and [`KeyHold`] releases on drop.

use std::sync::Mutex;
use std::time::Duration;

use once_cell::sync::Lazy;

use super::{InputDevice, InputError};

/// Keys pressed and not yet released
static HELD_KEYS: Lazy<Mutex<Vec<Key>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Keys a script can press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character
    Char(char),
    Space,
    Enter,
    Tab,
    Escape,
    Backspace,
    Shift,
    Control,
    Alt,
    Up,
    Down,
    Left,
    Right,
    /// Function key F1-F12
    F(u8),
}

impl Key {
    /// Parse a script key name
    ///
    /// Single characters map to themselves; everything else must be one of
    /// the named keys.
    pub fn from_name(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(Self::Char(c));
        }

        let key = match name {
            "space" => Self::Space,
            "enter" | "return" => Self::Enter,
            "tab" => Self::Tab,
            "escape" | "esc" => Self::Escape,
            "backspace" => Self::Backspace,
            "shift" => Self::Shift,
            "ctrl" | "control" => Self::Control,
            "alt" => Self::Alt,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            _ => {
                let n: u8 = name.strip_prefix('f')?.parse().ok()?;
                if !(1..=12).contains(&n) {
                    return None;
                }
                Self::F(n)
            }
        };

        Some(key)
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{c}"),
            Self::F(n) => write!(f, "f{n}"),
            other => write!(f, "{}", format!("{other:?}").to_lowercase()),
        }
    }
}

fn registry() -> std::sync::MutexGuard<'static, Vec<Key>> {
    // A poisoned registry still holds a valid key list
    HELD_KEYS.lock().unwrap_or_else(|e| e.into_inner())
}

fn unregister(key: Key) {
    let mut held = registry();
    if let Some(pos) = held.iter().position(|&k| k == key) {
        held.swap_remove(pos);
    }
}

/// Snapshot of the keys currently held down by the bot
pub fn held_keys() -> Vec<Key> {
    registry().clone()
}

/// Release every key the bot is still holding
///
/// Meant for interrupt handlers. All keys are attempted; the first failure
/// is reported.
pub fn release_held_keys<D: InputDevice + ?Sized>(device: &mut D) -> Result<(), InputError> {
    let keys: Vec<Key> = registry().drain(..).collect();
    let mut result = Ok(());

    for key in keys {
        log::info!("releasing held key '{}'", key);
        if let Err(e) = device.release_key(key) {
            log::error!("failed to release key '{}': {}", key, e);
            if result.is_ok() {
                result = Err(e);
            }
        }
    }

    result
}

/// A key held down on a device
///
/// Dropping the hold without calling [`KeyHold::release`] still releases
/// the key.
pub struct KeyHold<'a, D: InputDevice + ?Sized> {
    device: &'a mut D,
    key: Key,
    released: bool,
}

impl<'a, D: InputDevice + ?Sized> KeyHold<'a, D> {
    /// Press `key` and start tracking it
    pub fn press(device: &'a mut D, key: Key) -> Result<Self, InputError> {
        device.press_key(key)?;
        registry().push(key);

        Ok(Self {
            device,
            key,
            released: false,
        })
    }

    /// Keep the key down for `duration`
    pub fn hold(&mut self, duration: Duration) -> Result<(), InputError> {
        self.device.wait(duration)
    }

    /// Release the key
    pub fn release(mut self) -> Result<(), InputError> {
        self.released = true;
        unregister(self.key);
        self.device.release_key(self.key)
    }
}

impl<D: InputDevice + ?Sized> Drop for KeyHold<'_, D> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        unregister(self.key);
        if let Err(e) = self.device.release_key(self.key) {
            log::warn!("failed to release key '{}' on drop: {}", self.key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, RecordingDevice};

    // The registry is process-wide; keep these tests from draining each other
    static SERIAL: Mutex<()> = Mutex::new(());

    fn serial() -> std::sync::MutexGuard<'static, ()> {
        SERIAL.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_key_names() {
        assert_eq!(Key::from_name("a"), Some(Key::Char('a')));
        assert_eq!(Key::from_name("1"), Some(Key::Char('1')));
        assert_eq!(Key::from_name("space"), Some(Key::Space));
        assert_eq!(Key::from_name("return"), Some(Key::Enter));
        assert_eq!(Key::from_name("f12"), Some(Key::F(12)));
        assert_eq!(Key::from_name("f13"), None);
        assert_eq!(Key::from_name("f0"), None);
        assert_eq!(Key::from_name("hyper"), None);
        assert_eq!(Key::from_name("Space"), None);
        assert_eq!(Key::from_name(""), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Key::Char('q').to_string(), "q");
        assert_eq!(Key::Space.to_string(), "space");
        assert_eq!(Key::F(4).to_string(), "f4");
    }

    #[test]
    fn test_hold_release() {
        let _guard = serial();
        let mut device = RecordingDevice::new(8, 8);
        let key = Key::F(9);

        let mut hold = KeyHold::press(&mut device, key).unwrap();
        assert!(held_keys().contains(&key));
        hold.hold(Duration::from_millis(250)).unwrap();
        hold.release().unwrap();

        assert!(!held_keys().contains(&key));
        assert_eq!(
            device.events(),
            &[
                InputEvent::Press(key),
                InputEvent::Wait(Duration::from_millis(250)),
                InputEvent::Release(key),
            ]
        );
    }

    #[test]
    fn test_drop_releases() {
        let _guard = serial();
        let mut device = RecordingDevice::new(8, 8);
        let key = Key::F(10);

        {
            let _hold = KeyHold::press(&mut device, key).unwrap();
        }

        assert!(!held_keys().contains(&key));
        assert_eq!(device.events().last(), Some(&InputEvent::Release(key)));
    }

    #[test]
    fn test_release_held_keys() {
        let _guard = serial();
        let mut device = RecordingDevice::new(8, 8);
        let key = Key::F(11);

        let hold = KeyHold::press(&mut device, key).unwrap();
        std::mem::forget(hold);
        assert!(held_keys().contains(&key));

        let mut cleanup = RecordingDevice::new(8, 8);
        release_held_keys(&mut cleanup).unwrap();

        assert!(!held_keys().contains(&key));
        assert!(cleanup.events().contains(&InputEvent::Release(key)));
    }
}
