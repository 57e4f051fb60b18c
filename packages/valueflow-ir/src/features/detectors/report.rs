//! Violation report sink
//!
//! Detected bugs are the product of the analysis, not errors: they
//! accumulate here and analysis continues. The textual rendering references
//! the offending statement and its source string; it is a reporting sink,
//! not a machine-parseable wire format.

use serde::Serialize;
use std::fmt;

use crate::shared::ir::StmtId;

/// Kind of a detected violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViolationKind {
    BufferOverflow,
    NullDeref,
    UseAfterFree,
    /// A self-test checkpoint whose expected outcome did not hold
    CheckpointFailed,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::BufferOverflow => "buffer overflow",
            ViolationKind::NullDeref => "null dereference",
            ViolationKind::UseAfterFree => "use after free",
            ViolationKind::CheckpointFailed => "checkpoint failed",
        }
    }
}

/// One detected violation
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub stmt: StmtId,
    pub source: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} (stmt s{}", self.kind.as_str(), self.message, self.stmt)?;
        if !self.source.is_empty() {
            write!(f, ", {}", self.source)?;
        }
        write!(f, ")")
    }
}

/// Accumulating report
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    violations: Vec<Violation>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations of one kind
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return writeln!(f, "no violations detected");
        }
        for v in &self.violations {
            writeln!(f, "{v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulation() {
        let mut report = Report::new();
        assert!(report.is_empty());

        report.add(Violation {
            kind: ViolationKind::BufferOverflow,
            stmt: 3,
            source: "demo.c:10".into(),
            message: "access of 12 bytes into 10-byte object".into(),
        });

        assert_eq!(report.len(), 1);
        assert_eq!(report.of_kind(ViolationKind::BufferOverflow).count(), 1);
        assert_eq!(report.of_kind(ViolationKind::NullDeref).count(), 0);

        let text = report.to_string();
        assert!(text.contains("buffer overflow"));
        assert!(text.contains("demo.c:10"));
    }

    #[test]
    fn test_json_output() {
        let mut report = Report::new();
        report.add(Violation {
            kind: ViolationKind::NullDeref,
            stmt: 1,
            source: String::new(),
            message: "p may be null".into(),
        });
        let json = report.to_json().unwrap();
        assert!(json.contains("NullDeref"));
    }
}
