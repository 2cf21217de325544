//! Execution context
//!
//! The mutable state of one script run: program counter, registers and the
//! label table. A fresh context is built for every run.

use std::collections::HashMap;

/// Register tested by `jne`
pub const CONDITION_REGISTER: &str = "R0";

/// Per-run VM state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Index of the next instruction
    pub pc: usize,
    registers: HashMap<String, i64>,
    labels: HashMap<String, usize>,
}

impl ExecutionContext {
    /// Create a context at pc 0 with `R0 = 0` and the given labels
    pub fn new(labels: HashMap<String, usize>) -> Self {
        Self {
            pc: 0,
            registers: HashMap::from([(CONDITION_REGISTER.to_string(), 0)]),
            labels,
        }
    }

    /// Read a register
    pub fn register(&self, name: &str) -> Option<i64> {
        self.registers.get(name).copied()
    }

    /// Mutable access to a declared register
    pub fn register_mut(&mut self, name: &str) -> Option<&mut i64> {
        self.registers.get_mut(name)
    }

    /// Address a label points at
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Whether the condition register is non-zero
    pub fn condition(&self) -> bool {
        self.register(CONDITION_REGISTER).unwrap_or(0) != 0
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context() {
        let ctx = ExecutionContext::default();
        assert_eq!(ctx.pc, 0);
        assert_eq!(ctx.register("R0"), Some(0));
        assert_eq!(ctx.register("R1"), None);
        assert!(!ctx.condition());
    }

    #[test]
    fn test_registers() {
        let mut ctx = ExecutionContext::default();
        *ctx.register_mut("R0").unwrap() = 3;
        assert!(ctx.condition());
        assert!(ctx.register_mut("r0").is_none());
    }

    #[test]
    fn test_labels() {
        let ctx = ExecutionContext::new(HashMap::from([("loop".to_string(), 2)]));
        assert_eq!(ctx.label("loop"), Some(2));
        assert_eq!(ctx.label("done"), None);
    }
}
