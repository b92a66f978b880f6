//! Entry-point resolution strategies
//!
//! A submission exposes the function under test in one of a few conventional
//! shapes. The strategies are tried in the order of [`ENTRY_POINT_STRATEGIES`];
//! the first one that yields a callable wins.

use serde::Serialize;

/// Top-level names checked for a callable, highest priority first
pub const CONVENTIONAL_NAMES: [&str; 4] = ["solve", "solution", "main", "answer"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPointStrategy {
    /// A function bound at top level under a conventional name
    NamedBinding(&'static str),
    /// `module.exports` is itself a function
    ModuleExport,
    /// `module.exports.solve` (equivalently `exports.solve`)
    ExportedSolve,
}

/// Fixed resolution order
pub const ENTRY_POINT_STRATEGIES: [EntryPointStrategy; 6] = [
    EntryPointStrategy::NamedBinding(CONVENTIONAL_NAMES[0]),
    EntryPointStrategy::NamedBinding(CONVENTIONAL_NAMES[1]),
    EntryPointStrategy::NamedBinding(CONVENTIONAL_NAMES[2]),
    EntryPointStrategy::NamedBinding(CONVENTIONAL_NAMES[3]),
    EntryPointStrategy::ModuleExport,
    EntryPointStrategy::ExportedSolve,
];

impl EntryPointStrategy {
    /// Human-readable name, also reported back by the harness on a match
    pub fn label(&self) -> String {
        match self {
            EntryPointStrategy::NamedBinding(name) => (*name).to_string(),
            EntryPointStrategy::ModuleExport => "module.exports".to_string(),
            EntryPointStrategy::ExportedSolve => "module.exports.solve".to_string(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            EntryPointStrategy::NamedBinding(_) => "namedBinding",
            EntryPointStrategy::ModuleExport => "moduleExport",
            EntryPointStrategy::ExportedSolve => "exportedSolve",
        }
    }
}

/// Wire form of a strategy as the harness expects it
#[derive(Debug, Serialize)]
pub struct StrategySpec {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'static str>,
    pub label: String,
}

impl From<&EntryPointStrategy> for StrategySpec {
    fn from(strategy: &EntryPointStrategy) -> Self {
        let name = match strategy {
            EntryPointStrategy::NamedBinding(name) => Some(*name),
            _ => None,
        };
        Self {
            kind: strategy.kind(),
            name,
            label: strategy.label(),
        }
    }
}

/// Comma-separated labels of every strategy, for diagnostics
pub fn describe_strategies(strategies: &[EntryPointStrategy]) -> String {
    strategies
        .iter()
        .map(EntryPointStrategy::label)
        .collect::<Vec<_>>()
        .join(", ")
}
