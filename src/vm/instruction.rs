//! Instruction set
//!
//! Decodes one script line into a typed [`Instruction`]. Decoding checks
//! arity and argument syntax only; button names, key names and registers
//! are resolved when the instruction executes.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::Lazy;

use super::ScriptError;
use crate::geometry::{ColorTarget, Point2D};

/// Opcode name to opcode
static OPCODES: Lazy<HashMap<&'static str, Opcode>> =
    Lazy::new(|| Opcode::ALL.iter().map(|&op| (op.name(), op)).collect());

/// Script opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Delay,
    MouseClick,
    MouseMove,
    MouseMoveClickBox,
    MouseMoveColor,
    PressKey,
    Store,
    Subtract,
    JumpNotEqual,
}

impl Opcode {
    /// Every opcode
    pub const ALL: [Opcode; 9] = [
        Opcode::Delay,
        Opcode::MouseClick,
        Opcode::MouseMove,
        Opcode::MouseMoveClickBox,
        Opcode::MouseMoveColor,
        Opcode::PressKey,
        Opcode::Store,
        Opcode::Subtract,
        Opcode::JumpNotEqual,
    ];

    /// Look up an opcode by its script name (case-sensitive)
    pub fn lookup(name: &str) -> Option<Self> {
        OPCODES.get(name).copied()
    }

    /// Script name
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Delay => "delay",
            Opcode::MouseClick => "msclk",
            Opcode::MouseMove => "msmv",
            Opcode::MouseMoveClickBox => "msmvcb",
            Opcode::MouseMoveColor => "msmvcolor",
            Opcode::PressKey => "pkey",
            Opcode::Store => "store",
            Opcode::Subtract => "sub",
            Opcode::JumpNotEqual => "jne",
        }
    }

    /// Exact number of arguments
    pub fn arity(self) -> usize {
        match self {
            Opcode::Delay => 2,
            Opcode::MouseClick => 1,
            Opcode::MouseMove => 3,
            Opcode::MouseMoveClickBox => 9,
            Opcode::MouseMoveColor => 6,
            Opcode::PressKey => 2,
            Opcode::Store => 2,
            Opcode::Subtract => 2,
            Opcode::JumpNotEqual => 1,
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded script line
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Sleep a random time in `[min_secs, max_secs]`
    Delay { min_secs: f64, max_secs: f64 },
    /// Click a mouse button
    MouseClick { button: String },
    /// Stroke the pointer to a fixed position
    MouseMove { x: i32, y: i32, duration: Duration },
    /// Stroke the pointer to a random point inside a click box
    MouseMoveClickBox {
        vertices: Vec<Point2D>,
        duration: Duration,
    },
    /// Stroke the pointer to the largest cluster of a color
    MouseMoveColor {
        target: ColorTarget,
        duration: Duration,
    },
    /// Hold a key down
    PressKey { key: String, duration: Duration },
    /// Set a register
    Store { register: String, value: i64 },
    /// Subtract from a register
    Subtract { register: String, value: i64 },
    /// Jump when R0 is not zero
    JumpNotEqual { label: String },
    /// Label declaration
    Label { name: String },
}

impl Instruction {
    /// Decode a trimmed, non-comment script line
    pub fn decode(line: usize, text: &str) -> Result<Self, ScriptError> {
        let mut tokens = text.split_whitespace();
        let head = tokens.next().unwrap_or_default();
        let args: Vec<&str> = tokens.collect();

        if let Some(name) = head.strip_suffix(':') {
            return decode_label(line, name, &args);
        }

        let opcode = Opcode::lookup(head).ok_or_else(|| ScriptError::UnknownOpcode {
            line,
            opcode: head.to_string(),
        })?;

        if args.len() != opcode.arity() {
            return Err(ScriptError::ArgCount {
                line,
                opcode: opcode.name(),
                expected: opcode.arity(),
                found: args.len(),
            });
        }

        let p = ArgParser { line, opcode };
        let instruction = match opcode {
            Opcode::Delay => {
                let min_secs = p.seconds("min delay", args[0])?;
                let max_secs = p.seconds("max delay", args[1])?;
                if min_secs > max_secs {
                    return Err(p.invalid("delay range", text));
                }
                Instruction::Delay { min_secs, max_secs }
            }
            Opcode::MouseClick => Instruction::MouseClick {
                button: args[0].to_string(),
            },
            Opcode::MouseMove => Instruction::MouseMove {
                x: p.number("x coordinate", args[0])?,
                y: p.number("y coordinate", args[1])?,
                duration: p.duration(args[2])?,
            },
            Opcode::MouseMoveClickBox => {
                let vertices = args[..8]
                    .chunks(2)
                    .map(|xy| {
                        let x: i32 = p.number("x coordinate", xy[0])?;
                        let y: i32 = p.number("y coordinate", xy[1])?;
                        Ok(Point2D::from((x, y)))
                    })
                    .collect::<Result<Vec<_>, ScriptError>>()?;
                Instruction::MouseMoveClickBox {
                    vertices,
                    duration: p.duration(args[8])?,
                }
            }
            Opcode::MouseMoveColor => Instruction::MouseMoveColor {
                target: ColorTarget::new(
                    [
                        p.number("red", args[0])?,
                        p.number("green", args[1])?,
                        p.number("blue", args[2])?,
                    ],
                    p.tolerance(args[3])?,
                    p.number("min cluster size", args[4])?,
                ),
                duration: p.duration(args[5])?,
            },
            Opcode::PressKey => Instruction::PressKey {
                key: args[0].to_string(),
                duration: p.duration(args[1])?,
            },
            Opcode::Store => Instruction::Store {
                register: args[0].to_string(),
                value: p.number("immediate", args[1])?,
            },
            Opcode::Subtract => Instruction::Subtract {
                register: args[0].to_string(),
                value: p.number("immediate", args[1])?,
            },
            Opcode::JumpNotEqual => Instruction::JumpNotEqual {
                label: args[0].to_string(),
            },
        };

        Ok(instruction)
    }

    /// The opcode, or `None` for label declarations
    pub fn opcode(&self) -> Option<Opcode> {
        let op = match self {
            Instruction::Delay { .. } => Opcode::Delay,
            Instruction::MouseClick { .. } => Opcode::MouseClick,
            Instruction::MouseMove { .. } => Opcode::MouseMove,
            Instruction::MouseMoveClickBox { .. } => Opcode::MouseMoveClickBox,
            Instruction::MouseMoveColor { .. } => Opcode::MouseMoveColor,
            Instruction::PressKey { .. } => Opcode::PressKey,
            Instruction::Store { .. } => Opcode::Store,
            Instruction::Subtract { .. } => Opcode::Subtract,
            Instruction::JumpNotEqual { .. } => Opcode::JumpNotEqual,
            Instruction::Label { .. } => return None,
        };
        Some(op)
    }
}

fn decode_label(line: usize, name: &str, args: &[&str]) -> Result<Instruction, ScriptError> {
    if name.is_empty() || name.contains(':') {
        return Err(ScriptError::InvalidArgument {
            line,
            opcode: "label",
            what: "label name",
            value: format!("{name}:"),
        });
    }
    if !args.is_empty() {
        return Err(ScriptError::ArgCount {
            line,
            opcode: "label",
            expected: 0,
            found: args.len(),
        });
    }

    Ok(Instruction::Label {
        name: name.to_string(),
    })
}

/// Typed argument parsing with error context
struct ArgParser {
    line: usize,
    opcode: Opcode,
}

impl ArgParser {
    fn invalid(&self, what: &'static str, value: &str) -> ScriptError {
        ScriptError::InvalidArgument {
            line: self.line,
            opcode: self.opcode.name(),
            what,
            value: value.to_string(),
        }
    }

    fn number<T: FromStr>(&self, what: &'static str, value: &str) -> Result<T, ScriptError> {
        value.parse().map_err(|_| self.invalid(what, value))
    }

    /// Non-negative seconds that fit in a `Duration`
    fn seconds(&self, what: &'static str, value: &str) -> Result<f64, ScriptError> {
        let secs: f64 = self.number(what, value)?;
        if Duration::try_from_secs_f64(secs).is_err() {
            return Err(self.invalid(what, value));
        }
        Ok(secs)
    }

    fn duration(&self, value: &str) -> Result<Duration, ScriptError> {
        let secs = self.seconds("duration", value)?;
        Ok(Duration::from_secs_f64(secs))
    }

    /// Any non-negative integer, saturated to the widest channel difference
    fn tolerance(&self, value: &str) -> Result<u8, ScriptError> {
        let tolerance: u64 = self.number("tolerance", value)?;
        Ok(u8::try_from(tolerance).unwrap_or(u8::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_table() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::lookup(op.name()), Some(op));
        }
        assert_eq!(Opcode::lookup("MSCLK"), None);
        assert_eq!(Opcode::lookup("msmvtext"), None);
    }

    #[test]
    fn test_decode_delay() {
        assert_eq!(
            Instruction::decode(1, "delay 1 2.5").unwrap(),
            Instruction::Delay {
                min_secs: 1.0,
                max_secs: 2.5
            }
        );
        assert!(matches!(
            Instruction::decode(1, "delay 3 1"),
            Err(ScriptError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Instruction::decode(1, "delay -1 1"),
            Err(ScriptError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_decode_oversized_seconds() {
        assert_eq!(
            Instruction::decode(5, "delay 1e20 1e20"),
            Err(ScriptError::InvalidArgument {
                line: 5,
                opcode: "delay",
                what: "min delay",
                value: "1e20".to_string()
            })
        );
        assert!(matches!(
            Instruction::decode(5, "delay 1 inf"),
            Err(ScriptError::InvalidArgument { what: "max delay", .. })
        ));
        assert!(matches!(
            Instruction::decode(5, "pkey a 1e20"),
            Err(ScriptError::InvalidArgument { what: "duration", .. })
        ));
    }

    #[test]
    fn test_decode_click_box() {
        let inst = Instruction::decode(4, "msmvcb 925 308 1001 319 1001 507 926 512 0.5").unwrap();
        match inst {
            Instruction::MouseMoveClickBox { vertices, duration } => {
                assert_eq!(vertices.len(), 4);
                assert_eq!(vertices[3], Point2D::new(926.0, 512.0));
                assert_eq!(duration, Duration::from_millis(500));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_color() {
        let inst = Instruction::decode(2, "msmvcolor 255 0 12 10 4 1").unwrap();
        assert_eq!(
            inst,
            Instruction::MouseMoveColor {
                target: ColorTarget::new([255, 0, 12], 10, 4),
                duration: Duration::from_secs(1),
            }
        );
        assert!(matches!(
            Instruction::decode(2, "msmvcolor 256 0 12 10 4 1"),
            Err(ScriptError::InvalidArgument { what: "red", .. })
        ));
    }

    #[test]
    fn test_wide_tolerance_saturates() {
        // Anything at or past 255 matches every pixel
        let inst = Instruction::decode(2, "msmvcolor 0 0 0 300 4 1").unwrap();
        assert_eq!(
            inst,
            Instruction::MouseMoveColor {
                target: ColorTarget::new([0, 0, 0], u8::MAX, 4),
                duration: Duration::from_secs(1),
            }
        );
        assert!(matches!(
            Instruction::decode(2, "msmvcolor 0 0 0 -1 4 1"),
            Err(ScriptError::InvalidArgument { what: "tolerance", .. })
        ));
    }

    #[test]
    fn test_arg_count_mismatch() {
        assert_eq!(
            Instruction::decode(7, "msclk"),
            Err(ScriptError::ArgCount {
                line: 7,
                opcode: "msclk",
                expected: 1,
                found: 0
            })
        );
        assert!(matches!(
            Instruction::decode(7, "msmv 1 2"),
            Err(ScriptError::ArgCount { expected: 3, found: 2, .. })
        ));
        assert!(matches!(
            Instruction::decode(7, "done: extra"),
            Err(ScriptError::ArgCount { .. })
        ));
    }

    #[test]
    fn test_unknown_opcode() {
        assert_eq!(
            Instruction::decode(3, "jump loop"),
            Err(ScriptError::UnknownOpcode {
                line: 3,
                opcode: "jump".to_string()
            })
        );
    }

    #[test]
    fn test_names_resolved_later() {
        // Bad buttons and keys are execute-time errors
        assert!(Instruction::decode(1, "msclk middle").is_ok());
        assert!(Instruction::decode(1, "pkey hyper 1").is_ok());
        assert!(Instruction::decode(1, "store R9 1").is_ok());
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            Instruction::decode(1, "loop:").unwrap(),
            Instruction::Label {
                name: "loop".to_string()
            }
        );
        assert!(Instruction::decode(1, ":").is_err());
        assert_eq!(Instruction::decode(1, "loop:").unwrap().opcode(), None);
    }

    #[test]
    fn test_whitespace_tolerant() {
        assert_eq!(
            Instruction::decode(1, "store\tR0   -4").unwrap(),
            Instruction::Store {
                register: "R0".to_string(),
                value: -4
            }
        );
    }
}
