use crate::core::error::{SimulatorError, SimulatorResult};
use crate::network::packet::{Packet, PacketSpec};
use crate::security::firewall::{FirewallAction, Rule, RuleSpec};
use log::debug;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RuleSetFile {
    #[serde(default)]
    default_action: Option<FirewallAction>,
    rules: Vec<RuleSpec>,
}

/// ファイルから読み込んだ検証済みのルールセット
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub default_action: Option<FirewallAction>,
    pub rules: Vec<Rule>,
}

/// ルールファイル (JSON) を読み込む。
///
/// ```json
/// {
///   "default_action": "DENY",
///   "rules": [
///     { "id": "R1", "action": "DENY", "dst_ports": 80, "proto": "TCP" },
///     { "id": "R2", "action": "ALLOW", "src_net": "10.0.0.0/24" },
///     { "id": "R3", "action": "DENY", "dst_ports": [1000, 2000], "proto": "UDP" }
///   ]
/// }
/// ```
pub fn load_rules(path: impl AsRef<Path>) -> SimulatorResult<RuleSet> {
    let content = fs::read_to_string(path.as_ref())?;
    let rule_set = parse_rules(&content)?;
    debug!("ルールを読み込みました: {} ({}件)", path.as_ref().display(), rule_set.rules.len());
    Ok(rule_set)
}

pub fn parse_rules(json: &str) -> SimulatorResult<RuleSet> {
    let file: RuleSetFile = serde_json::from_str(json)?;

    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(file.rules.len());
    for spec in file.rules {
        let id = spec.id.clone();
        if !seen.insert(id.clone()) {
            return Err(SimulatorError::DuplicateRuleId(id));
        }
        let rule = Rule::try_from(spec).map_err(|source| SimulatorError::InvalidRule { id, source })?;
        rules.push(rule);
    }

    Ok(RuleSet {
        default_action: file.default_action,
        rules,
    })
}

/// パケットファイル (JSON配列) を読み込む
pub fn load_packets(path: impl AsRef<Path>) -> SimulatorResult<Vec<Packet>> {
    let content = fs::read_to_string(path.as_ref())?;
    let packets = parse_packets(&content)?;
    debug!("パケットを読み込みました: {} ({}件)", path.as_ref().display(), packets.len());
    Ok(packets)
}

pub fn parse_packets(json: &str) -> SimulatorResult<Vec<Packet>> {
    let specs: Vec<PacketSpec> = serde_json::from_str(json)?;
    let packets = specs
        .into_iter()
        .map(Packet::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(packets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{PacketError, RuleError};
    use crate::security::firewall::{PortMatch, RuleEngine};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DEMO_RULES: &str = r#"{
        "default_action": "deny",
        "rules": [
            { "id": "R1", "action": "DENY", "dst_ports": 80, "proto": "TCP", "description": "Block HTTP" },
            { "id": "R2", "action": "ALLOW", "src_net": "10.0.0.0/24" },
            { "id": "R3", "action": "DENY", "dst_ports": [1000, 2000], "proto": "udp" }
        ]
    }"#;

    #[test]
    fn test_parse_rules() {
        let rule_set = parse_rules(DEMO_RULES).unwrap();
        assert_eq!(rule_set.default_action, Some(FirewallAction::Deny));
        assert_eq!(rule_set.rules.len(), 3);
        assert_eq!(rule_set.rules[0].dst_ports(), PortMatch::Exact(80));
        assert_eq!(rule_set.rules[0].description(), Some("Block HTTP"));
        assert_eq!(rule_set.rules[2].dst_ports(), PortMatch::range(1000, 2000).unwrap());
    }

    #[test]
    fn test_default_action_is_optional() {
        let rule_set = parse_rules(r#"{ "rules": [] }"#).unwrap();
        assert_eq!(rule_set.default_action, None);
        assert!(rule_set.rules.is_empty());
    }

    #[test]
    fn test_parse_rules_reports_invalid_rule() {
        let err = parse_rules(r#"{ "rules": [ { "id": "BAD", "action": "DENY", "dst_ports": [2000, 1000] } ] }"#)
            .unwrap_err();
        match err {
            SimulatorError::InvalidRule { id, source } => {
                assert_eq!(id, "BAD");
                assert_eq!(source, RuleError::InvalidPortRange { lo: 2000, hi: 1000 });
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rules_rejects_duplicate_id() {
        let err = parse_rules(
            r#"{ "rules": [ { "id": "R1", "action": "DENY" }, { "id": "R1", "action": "ALLOW" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SimulatorError::DuplicateRuleId(id) if id == "R1"));
    }

    #[test]
    fn test_parse_rules_rejects_unknown_action() {
        let err = parse_rules(r#"{ "rules": [ { "id": "R1", "action": "REJECT" } ] }"#).unwrap_err();
        assert!(matches!(err, SimulatorError::Json(_)));
    }

    #[test]
    fn test_parse_packets() {
        let packets = parse_packets(
            r#"[
                { "src_ip": "10.0.0.5", "dst_ip": "8.8.8.8", "src_port": 12345, "dst_port": 80, "proto": "tcp" },
                { "src_ip": "::1", "dst_ip": "::2", "src_port": 1, "dst_port": 2, "proto": "UDP" }
            ]"#,
        )
        .unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].dst_port(), 80);
        assert!(packets[1].src_ip().is_ipv6());
    }

    #[test]
    fn test_parse_packets_rejects_invalid_entry() {
        let err = parse_packets(
            r#"[ { "src_ip": "10.0.0.5", "dst_ip": "8.8.8.8", "src_port": 1, "dst_port": 99999, "proto": "TCP" } ]"#,
        );
        assert!(matches!(
            err,
            Err(SimulatorError::Packet(PacketError::PortOutOfRange(99999)))
        ));
    }

    #[test]
    fn test_parse_packets_rejects_unknown_protocol() {
        let err = parse_packets(
            r#"[ { "src_ip": "10.0.0.5", "dst_ip": "8.8.8.8", "src_port": 1, "dst_port": 2, "proto": "SCTP" } ]"#,
        );
        assert!(matches!(
            err,
            Err(SimulatorError::Packet(PacketError::UnknownProtocol(p))) if p == "SCTP"
        ));
    }

    #[test]
    fn test_parse_packets_rejects_malformed_json() {
        assert!(matches!(parse_packets(r#"[ { "src_ip": "10.0.0.5" } ]"#), Err(SimulatorError::Json(_))));
    }

    #[test]
    fn test_load_files_and_evaluate() {
        let mut rules_file = NamedTempFile::new().unwrap();
        rules_file.write_all(DEMO_RULES.as_bytes()).unwrap();
        let mut packets_file = NamedTempFile::new().unwrap();
        packets_file
            .write_all(br#"[ { "src_ip": "9.9.9.9", "dst_ip": "1.1.1.1", "src_port": 1500, "dst_port": 1500, "proto": "UDP" } ]"#)
            .unwrap();

        let rule_set = load_rules(rules_file.path()).unwrap();
        let packets = load_packets(packets_file.path()).unwrap();
        let engine = RuleEngine::new(rule_set.rules, FirewallAction::Allow);
        let verdict = engine.evaluate(&packets[0]);

        assert_eq!(verdict.action, FirewallAction::Deny);
        assert_eq!(verdict.matched_rule_id.as_deref(), Some("R3"));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(load_rules("/nonexistent/rules.json"), Err(SimulatorError::Io(_))));
    }
}
