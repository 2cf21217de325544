//! Script loading
//!
//! Turns script text into a list of decoded statements and a label table.
//! Blank lines and `#` comments are dropped and do not occupy a pc slot.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use super::instruction::Instruction;
use super::{ScriptError, VmError};

/// One executable line of a script
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// 1-based line number in the source text
    pub line: usize,
    /// Trimmed source text
    pub text: String,
    /// Decoded form
    pub instruction: Instruction,
}

/// A loaded script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    statements: Vec<Statement>,
    labels: HashMap<String, usize>,
}

impl Program {
    /// Parse script text
    ///
    /// Labels are collected in a pre-pass so jumps may go forwards or
    /// backwards. Duplicate labels and jumps to undeclared labels are
    /// rejected here, before anything runs.
    pub fn parse(source: &str) -> Result<Self, ScriptError> {
        let mut statements = Vec::new();
        let mut labels = HashMap::new();

        for (idx, raw) in source.lines().enumerate() {
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let line = idx + 1;
            let instruction = Instruction::decode(line, text)?;
            if let Instruction::Label { name } = &instruction {
                // A label points at the statement after its declaration
                if labels.insert(name.clone(), statements.len() + 1).is_some() {
                    return Err(ScriptError::DuplicateLabel {
                        line,
                        label: name.clone(),
                    });
                }
            }

            statements.push(Statement {
                line,
                text: text.to_string(),
                instruction,
            });
        }

        for stmt in &statements {
            if let Instruction::JumpNotEqual { label } = &stmt.instruction {
                if !labels.contains_key(label) {
                    return Err(ScriptError::UnknownLabel {
                        line: stmt.line,
                        label: label.clone(),
                    });
                }
            }
        }

        Ok(Self { statements, labels })
    }

    /// Read and parse a script file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VmError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| VmError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("loaded script {}", path.display());
        Ok(Self::parse(&source)?)
    }

    /// Statement at `pc`, if any
    pub fn get(&self, pc: usize) -> Option<&Statement> {
        self.statements.get(pc)
    }

    /// All statements in order
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Label table
    pub fn labels(&self) -> &HashMap<String, usize> {
        &self.labels
    }

    /// Number of statements
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether the script has no statements
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl FromStr for Program {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "\
# bank loop
store R0 3

loop:
  msmvcb 925 308 1001 319 1001 507 926 512 0.4
  msclk left
  delay 1 2
  sub R0 1
  jne loop
";

    #[test]
    fn test_comments_and_blanks_skipped() {
        let program = Program::parse(SCRIPT).unwrap();
        assert_eq!(program.len(), 7);
        assert_eq!(program.get(0).unwrap().line, 2);
        assert_eq!(program.get(2).unwrap().text, "msmvcb 925 308 1001 319 1001 507 926 512 0.4");
        assert!(program.get(7).is_none());
    }

    #[test]
    fn test_label_addresses() {
        let program = Program::parse(SCRIPT).unwrap();
        assert_eq!(program.labels().get("loop"), Some(&2));
    }

    #[test]
    fn test_forward_label() {
        let program: Program = "jne end\nmsclk left\nend:".parse().unwrap();
        assert_eq!(program.labels().get("end"), Some(&3));
    }

    #[test]
    fn test_duplicate_label() {
        let err = Program::parse("a:\nmsclk left\na:").unwrap_err();
        assert_eq!(
            err,
            ScriptError::DuplicateLabel {
                line: 3,
                label: "a".to_string()
            }
        );
    }

    #[test]
    fn test_undeclared_label() {
        let err = Program::parse("store R0 1\njne nowhere").unwrap_err();
        assert_eq!(
            err,
            ScriptError::UnknownLabel {
                line: 2,
                label: "nowhere".to_string()
            }
        );
    }

    #[test]
    fn test_parse_error_reports_source_line() {
        let err = Program::parse("# header\n\nmsclk\n").unwrap_err();
        assert!(matches!(err, ScriptError::ArgCount { line: 3, .. }));
        assert_eq!(err.to_string(), "line 3: msclk requires 1 args but received 0");
    }

    #[test]
    fn test_empty_script() {
        let program = Program::parse("# nothing\n\n").unwrap();
        assert!(program.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Program::load("/nonexistent/rsbot/script.rsbot").unwrap_err();
        assert!(matches!(err, VmError::Io { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let path = std::env::temp_dir().join(format!("rsbot-{}.rsbot", std::process::id()));
        std::fs::write(&path, SCRIPT).unwrap();

        let program = Program::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(program, Program::parse(SCRIPT).unwrap());
    }
}
