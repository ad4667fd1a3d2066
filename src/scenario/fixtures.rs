use crate::core::error::{RuleError, SimulatorError};
use crate::network::packet::{Packet, Protocol};
use crate::security::firewall::{FirewallAction, Rule};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

/// 組み込みのデモシナリオ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// ポート遮断とサブネット許可
    Demo1,
    /// 広い許可ルールが狭い拒否ルールを覆い隠す例
    OrderTest,
}

impl Scenario {
    pub const ALL: [Scenario; 2] = [Scenario::Demo1, Scenario::OrderTest];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Demo1 => "demo1",
            Scenario::OrderTest => "order_test",
        }
    }

    pub fn rules(&self) -> Result<Vec<Rule>, RuleError> {
        match self {
            Scenario::Demo1 => Ok(vec![
                Rule::builder("R1", FirewallAction::Deny)
                    .dst_port(80)
                    .proto("TCP")
                    .description("Block HTTP")
                    .build()?,
                Rule::builder("R2", FirewallAction::Allow)
                    .src_net("10.0.0.0/24")
                    .description("Allow local subnet")
                    .build()?,
                Rule::builder("R3", FirewallAction::Deny)
                    .dst_port_range(1000, 2000)
                    .proto("UDP")
                    .description("Block UDP high ports")
                    .build()?,
            ]),
            Scenario::OrderTest => Ok(vec![
                Rule::builder("R1", FirewallAction::Allow)
                    .src_net("0.0.0.0/0")
                    .description("Allow all (bad order)")
                    .build()?,
                Rule::builder("R2", FirewallAction::Deny)
                    .dst_port(22)
                    .description("Deny SSH")
                    .build()?,
            ]),
        }
    }

    pub fn packets(&self) -> Vec<Packet> {
        match self {
            Scenario::Demo1 => vec![
                // ローカルサブネットからHTTP: R1が先に一致
                v4([10, 0, 0, 5], [8, 8, 8, 8], 12345, 80, Protocol::Tcp),
                // 送信元が 10.0.0.0/24 の外なのでどのルールにも一致しない
                v4([192, 168, 1, 10], [10, 0, 0, 20], 40000, 22, Protocol::Tcp),
                v4([9, 9, 9, 9], [1, 1, 1, 1], 1500, 1500, Protocol::Udp),
                v4([10, 0, 0, 8], [8, 8, 4, 4], 33333, 443, Protocol::Tcp),
            ],
            Scenario::OrderTest => vec![v4([8, 8, 8, 8], [1, 2, 3, 4], 55555, 22, Protocol::Tcp)],
        }
    }
}

fn v4(src: [u8; 4], dst: [u8; 4], src_port: u16, dst_port: u16, proto: Protocol) -> Packet {
    Packet::new(
        IpAddr::V4(Ipv4Addr::from(src)),
        IpAddr::V4(Ipv4Addr::from(dst)),
        src_port,
        dst_port,
        proto,
    )
}

impl FromStr for Scenario {
    type Err = SimulatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SimulatorError::UnknownScenario(s.to_string()))
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
