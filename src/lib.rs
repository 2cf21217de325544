//! rsbot - scripted, humanized desktop input automation
//!
//! This library provides a small script language for driving the mouse and
//! keyboard, a virtual machine that executes it, and the geometry behind
//! randomized click points, curved pointer strokes and on-screen color
//! target detection.
//!
//! ## Anti-Detection
//!
//! The `stealth` module provides humanization features to make automation
//! less detectable by adding realistic variance to timing and positions.
//!
//! ## Example
//!
//! ```
//! use rsbot::input::RecordingDevice;
//! use rsbot::stealth::{Humanizer, MotionConfig};
//! use rsbot::vm::{Program, Vm};
//!
//! let program = Program::parse("store R0 2\nloop:\nmsclk left\nsub R0 1\njne loop").unwrap();
//! let mut device = RecordingDevice::new(640, 480);
//! let mut humanizer = Humanizer::seeded(7);
//!
//! let stats = Vm::new(&mut device, &mut humanizer, MotionConfig::default())
//!     .run(&program)
//!     .unwrap();
//! assert_eq!(device.click_count(), 2);
//! assert_eq!(stats.jumps, 1);
//! ```

pub mod config;
pub mod geometry;
pub mod input;
pub mod runner;
pub mod stealth;
pub mod vm;

pub use config::{ConfigError, RunConfig};
pub use geometry::{ClickBox, ColorTarget, GeometryError, Point2D};
pub use input::{InputDevice, InputError, RecordingDevice};
pub use runner::{RunSummary, Runner};
pub use stealth::{Humanizer, MotionConfig};
pub use vm::{Program, RunStats, ScriptError, Vm, VmError};
