//! Report primitives shared by every layer that emits diagnostics.
//!
//! A [`Report`] is a template with positional `{0}`, `{1}`, ... placeholders
//! plus typed arguments. Arguments stay in index form until a listener asks
//! for them, so the translation layer can convert them lazily.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combination::Combination;
use crate::input::{NamedCombination, ParameterValue};
use crate::types::TupleListId;

/// Severity of a report, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ReportLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

impl ReportLevel {
    pub fn is_worse_than_or_equal_to(self, other: ReportLevel) -> bool {
        self >= other
    }
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportLevel::Trace => "TRACE",
            ReportLevel::Debug => "DEBUG",
            ReportLevel::Info => "INFO",
            ReportLevel::Warn => "WARN",
            ReportLevel::Error => "ERROR",
            ReportLevel::Fatal => "FATAL",
        };
        write!(f, "{name}")
    }
}

/// A single report argument, either in index form or already translated.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportArgument {
    Combination(Combination),
    Parameter(usize),
    Value { parameter: usize, value: u32 },
    TupleList(TupleListId),
    ConstraintTuple {
        list: TupleListId,
        involved: Vec<usize>,
        values: Vec<u32>,
    },
    Count(usize),
    Text(String),
    /// A translated parameter or constraint name.
    Name(String),
    NamedCombination(NamedCombination),
    NamedValue {
        parameter: String,
        value: ParameterValue,
    },
}

impl fmt::Display for ReportArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportArgument::Combination(c) => write!(f, "{c}"),
            ReportArgument::Parameter(p) => write!(f, "parameter {p}"),
            ReportArgument::Value { parameter, value } => write!(f, "{parameter}={value}"),
            ReportArgument::TupleList(id) => write!(f, "tuple list {id}"),
            ReportArgument::ConstraintTuple {
                list,
                involved,
                values,
            } => write!(f, "{values:?} at {involved:?} of tuple list {list}"),
            ReportArgument::Count(n) => write!(f, "{n}"),
            ReportArgument::Text(s) | ReportArgument::Name(s) => write!(f, "{s}"),
            ReportArgument::NamedCombination(c) => write!(f, "{c}"),
            ReportArgument::NamedValue { parameter, value } => write!(f, "{parameter}={value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub template: String,
    pub arguments: Vec<ReportArgument>,
}

impl Report {
    pub fn new(template: impl Into<String>, arguments: Vec<ReportArgument>) -> Self {
        Self {
            template: template.into(),
            arguments,
        }
    }

    pub fn text(template: impl Into<String>) -> Self {
        Self::new(template, Vec::new())
    }

    /// Same template, arguments passed through `convert`.
    pub fn map_arguments(&self, convert: impl Fn(&ReportArgument) -> ReportArgument) -> Report {
        Report {
            template: self.template.clone(),
            arguments: self.arguments.iter().map(convert).collect(),
        }
    }

    /// Substitute `{i}` placeholders. Out-of-range placeholders stay verbatim.
    pub fn resolve(&self) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                return out;
            };
            match after[..close].parse::<usize>() {
                Ok(index) if index < self.arguments.len() => {
                    out.push_str(&self.arguments[index].to_string());
                }
                _ => out.push_str(&rest[open..open + close + 2]),
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resolve())
    }
}

/// Sink for diagnostic reports.
pub trait Reporter: Send + Sync {
    fn report(&self, level: ReportLevel, report: Report);

    /// Lazy variant: implementations that filter by level skip `supplier`
    /// entirely below their threshold.
    fn report_with(&self, level: ReportLevel, supplier: &dyn Fn() -> Report) {
        self.report(level, supplier());
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _level: ReportLevel, _report: Report) {}

    fn report_with(&self, _level: ReportLevel, _supplier: &dyn Fn() -> Report) {}
}
