pub mod fixtures;
pub mod loader;
pub mod runner;

pub use fixtures::Scenario;
pub use loader::{load_packets, load_rules, RuleSet};
pub use runner::ScenarioRunner;
