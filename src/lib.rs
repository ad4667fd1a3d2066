//! ファイアウォールルールシミュレータ。
//!
//! パケット記述子を順序付きルールリストに対して評価し、最初に一致したルールの
//! アクション (一致なしならデフォルトアクション) を決定する。

pub mod core;
pub mod network;
pub mod report;
pub mod scenario;
pub mod security;
pub mod setup_logger;

pub use crate::core::error::{PacketError, RuleError, SimulatorError, SimulatorResult};
pub use crate::network::packet::{Packet, Protocol};
pub use crate::security::firewall::{EvaluationRecord, FirewallAction, PortMatch, Rule, RuleEngine, Verdict};
