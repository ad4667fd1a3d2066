pub mod filter;
pub mod rules;

pub use filter::{EvaluationRecord, RuleEngine, Verdict};
pub use rules::{FirewallAction, PortMatch, PortRange, PortSpec, Rule, RuleBuilder, RuleSpec};
