//! Script virtual machine
//!
//! Fetches the statement at the program counter, executes it against the
//! input device and repeats until the counter leaves the program. Any
//! error stops the run on the spot.

pub mod context;
pub mod instruction;
pub mod program;

use std::path::PathBuf;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;

use crate::geometry::{locate_cluster, ClickBox, ColorTarget, GeometryError, Point2D};
use crate::input::{InputDevice, InputError, Key, KeyHold, MouseButton};
use crate::stealth::{Humanizer, MotionConfig};

pub use context::ExecutionContext;
pub use instruction::{Instruction, Opcode};
pub use program::{Program, Statement};

/// Counters for one completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Statements executed, label declarations included
    pub steps: usize,
    /// Jumps taken
    pub jumps: usize,
}

/// What the VM does after a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    Jump(usize),
}

/// The interpreter
pub struct Vm<'a, D: InputDevice + ?Sized, R: Rng = StdRng> {
    device: &'a mut D,
    humanizer: &'a mut Humanizer<R>,
    motion: MotionConfig,
}

impl<'a, D: InputDevice + ?Sized, R: Rng> Vm<'a, D, R> {
    /// Create a VM driving `device`
    pub fn new(device: &'a mut D, humanizer: &'a mut Humanizer<R>, motion: MotionConfig) -> Self {
        Self {
            device,
            humanizer,
            motion,
        }
    }

    /// Run `program` from the top until the pc runs off the end
    pub fn run(&mut self, program: &Program) -> Result<RunStats, VmError> {
        let mut ctx = ExecutionContext::new(program.labels().clone());
        let mut stats = RunStats::default();

        while let Some(stmt) = program.get(ctx.pc) {
            log::debug!("[{:>3}] line {}: {}", ctx.pc, stmt.line, stmt.text);

            match self.execute(&mut ctx, stmt)? {
                Flow::Next => ctx.pc += 1,
                Flow::Jump(target) => {
                    stats.jumps += 1;
                    ctx.pc = target;
                }
            }
            stats.steps += 1;
        }

        Ok(stats)
    }

    fn execute(&mut self, ctx: &mut ExecutionContext, stmt: &Statement) -> Result<Flow, VmError> {
        let line = stmt.line;

        match &stmt.instruction {
            Instruction::Delay { min_secs, max_secs } => {
                let delay = self.humanizer.delay(*min_secs, *max_secs);
                log::debug!("sleeping for {:.3}s", delay.as_secs_f64());
                self.device.wait(delay)?;
            }
            Instruction::MouseClick { button } => {
                let button = MouseButton::from_name(button).ok_or_else(|| {
                    VmError::UnsupportedButton {
                        line,
                        button: button.clone(),
                    }
                })?;
                self.device.click(button)?;
            }
            Instruction::MouseMove { x, y, duration } => {
                self.stroke_to(line, Point2D::from((*x, *y)), *duration)?;
            }
            Instruction::MouseMoveClickBox { vertices, duration } => {
                let click_box = ClickBox::new(vertices)
                    .map_err(|source| VmError::Geometry { line, source })?;
                let point = self.humanizer.click_point(&click_box);
                log::debug!("click box {} picked {}", click_box, point);
                self.stroke_to(line, point, *duration)?;
            }
            Instruction::MouseMoveColor { target, duration } => {
                let point = self.find_color(line, target)?;
                self.stroke_to(line, point, *duration)?;
            }
            Instruction::PressKey { key, duration } => {
                let key = Key::from_name(key).ok_or_else(|| VmError::UnsupportedKey {
                    line,
                    key: key.clone(),
                })?;
                let mut hold = KeyHold::press(&mut *self.device, key)?;
                hold.hold(*duration)?;
                hold.release()?;
            }
            Instruction::Store { register, value } => {
                *register_mut(ctx, line, register)? = *value;
            }
            Instruction::Subtract { register, value } => {
                let slot = register_mut(ctx, line, register)?;
                *slot = slot.checked_sub(*value).ok_or_else(|| VmError::Overflow {
                    line,
                    register: register.clone(),
                })?;
            }
            Instruction::JumpNotEqual { label } => {
                if ctx.condition() {
                    let target = ctx.label(label).ok_or_else(|| ScriptError::UnknownLabel {
                        line,
                        label: label.clone(),
                    })?;
                    return Ok(Flow::Jump(target));
                }
            }
            Instruction::Label { .. } => {}
        }

        Ok(Flow::Next)
    }

    /// Move the pointer along a humanized path to `target`
    fn stroke_to(&mut self, line: usize, target: Point2D, duration: Duration) -> Result<(), VmError> {
        let from = Point2D::from(self.device.pointer_position()?);
        let stroke = self
            .humanizer
            .stroke(from, target, duration, &self.motion)
            .map_err(|source| VmError::Geometry { line, source })?;

        log::debug!(
            "moving {} -> {} in {} steps",
            from,
            target,
            stroke.points.len()
        );
        for &(x, y) in &stroke.points {
            self.device.move_pointer(x, y, stroke.step)?;
        }

        Ok(())
    }

    fn find_color(&mut self, line: usize, target: &ColorTarget) -> Result<Point2D, VmError> {
        let screen = self.device.capture_screen()?;
        let point = locate_cluster(&screen, target).ok_or(VmError::TargetNotFound {
            line,
            target: *target,
        })?;

        log::debug!("found {} at {}", target, point);
        Ok(point)
    }
}

fn register_mut<'c>(
    ctx: &'c mut ExecutionContext,
    line: usize,
    register: &str,
) -> Result<&'c mut i64, VmError> {
    ctx.register_mut(register)
        .ok_or_else(|| VmError::UnknownRegister {
            line,
            register: register.to_string(),
        })
}

/// Errors found while loading a script
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("line {line}: unknown instruction '{opcode}'")]
    UnknownOpcode { line: usize, opcode: String },
    #[error("line {line}: {opcode} requires {expected} args but received {found}")]
    ArgCount {
        line: usize,
        opcode: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: invalid {what} '{value}' for {opcode}")]
    InvalidArgument {
        line: usize,
        opcode: &'static str,
        what: &'static str,
        value: String,
    },
    #[error("line {line}: duplicate label '{label}'")]
    DuplicateLabel { line: usize, label: String },
    #[error("line {line}: unknown label referenced '{label}'")]
    UnknownLabel { line: usize, label: String },
}

/// Errors that stop a script run
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("line {line}: attempted to access unknown register '{register}'")]
    UnknownRegister { line: usize, register: String },
    #[error("line {line}: unknown button type '{button}'")]
    UnsupportedButton { line: usize, button: String },
    #[error("line {line}: unsupported key '{key}'")]
    UnsupportedKey { line: usize, key: String },
    #[error("line {line}: unable to find color cluster with {target}")]
    TargetNotFound { line: usize, target: ColorTarget },
    #[error("line {line}: register '{register}' overflowed")]
    Overflow { line: usize, register: String },
    #[error("line {line}: {source}")]
    Geometry { line: usize, source: GeometryError },
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("failed to read script {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl VmError {
    /// Whether this is a missed color target rather than a broken script
    pub fn is_target_not_found(&self) -> bool {
        matches!(self, VmError::TargetNotFound { .. })
    }
}
