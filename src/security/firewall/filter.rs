use super::rules::{FirewallAction, Rule};
use crate::network::packet::Packet;
use log::{debug, trace};
use serde::Serialize;
use std::sync::Arc;

/// 1パケットの評価結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub action: FirewallAction,
    pub matched_rule_id: Option<String>,
}

impl Verdict {
    /// どのルールにも一致せず、デフォルトアクションが適用されたかどうか
    pub fn is_default(&self) -> bool {
        self.matched_rule_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationRecord {
    pub index: usize,
    #[serde(flatten)]
    pub packet: Packet,
    pub action: FirewallAction,
    pub matched_rule_id: Option<String>,
}

/// 順序付きルールリストとデフォルトアクションを保持する評価エンジン。
///
/// ルールは構築時に共有の不変スライスへ移され、以後変更されない。
/// `clone` はルールリストを共有するだけなので、複数スレッドから同時に
/// `evaluate` を呼んでもロックは不要。
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Arc<[Rule]>,
    default_action: FirewallAction,
}

impl RuleEngine {
    pub fn new(rules: Vec<Rule>, default_action: FirewallAction) -> Self {
        Self {
            rules: Arc::from(rules),
            default_action,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn default_action(&self) -> FirewallAction {
        self.default_action
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 先頭から順にルールを調べ、最初に一致したルールのアクションを返す (first-match-wins)。
    /// 一致するルールがなければデフォルトアクションを返す。
    pub fn evaluate(&self, packet: &Packet) -> Verdict {
        match self.rules.iter().find(|rule| rule.matches(packet)) {
            Some(rule) => {
                debug!("ルール {} に一致しました: {} => {}", rule.id(), packet, rule.action());
                Verdict {
                    action: rule.action(),
                    matched_rule_id: Some(rule.id().to_string()),
                }
            }
            None => {
                trace!("一致するルールがありません。デフォルトポリシーを適用: {} => {}", packet, self.default_action);
                Verdict {
                    action: self.default_action,
                    matched_rule_id: None,
                }
            }
        }
    }

    /// 入力順にパケットを評価する。インデックスは1から始まる。
    pub fn evaluate_batch(&self, packets: &[Packet]) -> Vec<EvaluationRecord> {
        packets
            .iter()
            .enumerate()
            .map(|(i, packet)| {
                let verdict = self.evaluate(packet);
                EvaluationRecord {
                    index: i + 1,
                    packet: packet.clone(),
                    action: verdict.action,
                    matched_rule_id: verdict.matched_rule_id,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(src: &str, dst: &str, sport: u16, dport: u16, proto: &str) -> Packet {
        Packet::parse(src, dst, sport, dport, proto).unwrap()
    }

    fn demo_rules() -> Vec<Rule> {
        vec![
            Rule::builder("R1", FirewallAction::Deny)
                .dst_port(80)
                .proto("TCP")
                .build()
                .unwrap(),
            Rule::builder("R2", FirewallAction::Allow)
                .src_net("10.0.0.0/24")
                .build()
                .unwrap(),
            Rule::builder("R3", FirewallAction::Deny)
                .dst_port_range(1000, 2000)
                .proto("UDP")
                .build()
                .unwrap(),
        ]
    }

    fn verdict(action: FirewallAction, rule: Option<&str>) -> Verdict {
        Verdict {
            action,
            matched_rule_id: rule.map(str::to_string),
        }
    }

    #[test]
    fn test_end_to_end_demo() {
        let engine = RuleEngine::new(demo_rules(), FirewallAction::Allow);

        assert_eq!(
            engine.evaluate(&packet("10.0.0.5", "8.8.8.8", 12345, 80, "TCP")),
            verdict(FirewallAction::Deny, Some("R1"))
        );
        assert_eq!(
            engine.evaluate(&packet("192.168.1.10", "10.0.0.20", 40000, 22, "TCP")),
            verdict(FirewallAction::Allow, None)
        );
        assert_eq!(
            engine.evaluate(&packet("9.9.9.9", "1.1.1.1", 1500, 1500, "UDP")),
            verdict(FirewallAction::Deny, Some("R3"))
        );
        assert_eq!(
            engine.evaluate(&packet("10.0.0.8", "8.8.4.4", 33333, 443, "TCP")),
            verdict(FirewallAction::Allow, Some("R2"))
        );
    }

    #[test]
    fn test_order_sensitivity() {
        let allow_all = Rule::builder("ALLOW_ALL", FirewallAction::Allow).build().unwrap();
        let deny_ssh = Rule::builder("DENY_SSH", FirewallAction::Deny).dst_port(22).build().unwrap();
        let ssh = packet("8.8.8.8", "1.2.3.4", 55555, 22, "TCP");

        let engine = RuleEngine::new(vec![allow_all.clone(), deny_ssh.clone()], FirewallAction::Deny);
        assert_eq!(engine.evaluate(&ssh), verdict(FirewallAction::Allow, Some("ALLOW_ALL")));

        let reversed = RuleEngine::new(vec![deny_ssh, allow_all], FirewallAction::Deny);
        assert_eq!(reversed.evaluate(&ssh), verdict(FirewallAction::Deny, Some("DENY_SSH")));
    }

    #[test]
    fn test_default_fallback() {
        let p = packet("1.2.3.4", "5.6.7.8", 1, 2, "UDP");
        for action in [FirewallAction::Allow, FirewallAction::Deny] {
            let engine = RuleEngine::new(Vec::new(), action);
            let result = engine.evaluate(&p);
            assert_eq!(result, verdict(action, None));
            assert!(result.is_default());
        }
    }

    #[test]
    fn test_no_match_uses_default() {
        let engine = RuleEngine::new(demo_rules(), FirewallAction::Deny);
        let result = engine.evaluate(&packet("172.16.0.1", "8.8.8.8", 5000, 443, "TCP"));
        assert_eq!(result, verdict(FirewallAction::Deny, None));
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let engine = RuleEngine::new(demo_rules(), FirewallAction::Allow);
        let p = packet("9.9.9.9", "1.1.1.1", 1500, 1500, "UDP");
        assert_eq!(engine.evaluate(&p), engine.evaluate(&p));
    }

    #[test]
    fn test_evaluate_batch_preserves_order() {
        let engine = RuleEngine::new(demo_rules(), FirewallAction::Allow);
        let packets = vec![
            packet("10.0.0.5", "8.8.8.8", 12345, 80, "TCP"),
            packet("172.16.0.1", "8.8.8.8", 5000, 443, "TCP"),
            packet("9.9.9.9", "1.1.1.1", 1500, 1500, "UDP"),
        ];
        let records = engine.evaluate_batch(&packets);

        assert_eq!(records.len(), 3);
        assert_eq!(records.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(records[0].matched_rule_id.as_deref(), Some("R1"));
        assert_eq!(records[1].matched_rule_id, None);
        assert_eq!(records[1].action, FirewallAction::Allow);
        assert_eq!(records[2].packet, packets[2]);
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleEngine>();

        let engine = RuleEngine::new(demo_rules(), FirewallAction::Allow);
        let p = packet("10.0.0.8", "8.8.4.4", 33333, 443, "TCP");
        let expected = engine.evaluate(&p);

        let (engine, p) = (&engine, &p);
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4).map(|_| s.spawn(move || engine.evaluate(p))).collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_record_serialization() {
        let engine = RuleEngine::new(demo_rules(), FirewallAction::Allow);
        let records = engine.evaluate_batch(&[packet("172.16.0.1", "8.8.8.8", 5000, 443, "TCP")]);
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["index"], 1);
        assert_eq!(json["src_ip"], "172.16.0.1");
        assert_eq!(json["action"], "ALLOW");
        assert!(json["matched_rule_id"].is_null());
    }
}
