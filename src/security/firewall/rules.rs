use crate::core::error::RuleError;
use crate::network::packet::{Packet, Protocol};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FirewallAction {
    Allow,
    Deny,
}

impl FirewallAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FirewallAction::Allow => "ALLOW",
            FirewallAction::Deny => "DENY",
        }
    }
}

impl FromStr for FirewallAction {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALLOW" => Ok(FirewallAction::Allow),
            "DENY" => Ok(FirewallAction::Deny),
            _ => Err(RuleError::InvalidAction(s.to_string())),
        }
    }
}

impl TryFrom<String> for FirewallAction {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FirewallAction> for String {
    fn from(action: FirewallAction) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for FirewallAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 両端を含むポート範囲。`lo <= hi` は構築時に保証される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRange {
    lo: u16,
    hi: u16,
}

impl PortRange {
    pub fn new(lo: u16, hi: u16) -> Result<Self, RuleError> {
        if lo > hi {
            return Err(RuleError::InvalidPortRange {
                lo: lo.into(),
                hi: hi.into(),
            });
        }
        Ok(Self { lo, hi })
    }

    pub fn lo(&self) -> u16 {
        self.lo
    }

    pub fn hi(&self) -> u16 {
        self.hi
    }

    pub fn contains(&self, port: u16) -> bool {
        self.lo <= port && port <= self.hi
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PortMatch {
    #[default]
    Any,
    Exact(u16),
    Range(PortRange),
}

impl PortMatch {
    pub fn range(lo: u16, hi: u16) -> Result<Self, RuleError> {
        PortRange::new(lo, hi).map(PortMatch::Range)
    }

    pub fn matches(&self, port: u16) -> bool {
        match self {
            PortMatch::Any => true,
            PortMatch::Exact(expected) => *expected == port,
            PortMatch::Range(range) => range.contains(port),
        }
    }
}

impl fmt::Display for PortMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortMatch::Any => f.write_str("*"),
            PortMatch::Exact(port) => write!(f, "{}", port),
            PortMatch::Range(range) => write!(f, "{}-{}", range.lo, range.hi),
        }
    }
}

/// 未検証のポート指定。JSONでは数値または `[lo, hi]` で表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    Single(i64),
    Range(i64, i64),
}

impl TryFrom<PortSpec> for PortMatch {
    type Error = RuleError;

    fn try_from(spec: PortSpec) -> Result<Self, Self::Error> {
        match spec {
            PortSpec::Single(port) => Ok(PortMatch::Exact(to_port(port)?)),
            PortSpec::Range(lo, hi) => {
                if lo > hi {
                    return Err(RuleError::InvalidPortRange { lo, hi });
                }
                PortMatch::range(to_port(lo)?, to_port(hi)?)
            }
        }
    }
}

fn to_port(value: i64) -> Result<u16, RuleError> {
    u16::try_from(value).map_err(|_| RuleError::PortOutOfRange(value))
}

/// ファイアウォールルール。構築は [`RuleBuilder`] を通してのみ行われ、
/// 不正なCIDR・ポート範囲・プロトコルはその時点でエラーになる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    id: String,
    action: FirewallAction,
    src_net: Option<IpNetwork>,
    dst_net: Option<IpNetwork>,
    src_ports: PortMatch,
    dst_ports: PortMatch,
    proto: Option<Protocol>,
    description: Option<String>,
}

impl Rule {
    pub fn builder(id: impl Into<String>, action: FirewallAction) -> RuleBuilder {
        RuleBuilder::new(id, action)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn action(&self) -> FirewallAction {
        self.action
    }

    pub fn src_net(&self) -> Option<&IpNetwork> {
        self.src_net.as_ref()
    }

    pub fn dst_net(&self) -> Option<&IpNetwork> {
        self.dst_net.as_ref()
    }

    pub fn src_ports(&self) -> PortMatch {
        self.src_ports
    }

    pub fn dst_ports(&self) -> PortMatch {
        self.dst_ports
    }

    pub fn proto(&self) -> Option<Protocol> {
        self.proto
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// すべての条件を満たす場合に `true`。指定のない条件は常に一致する。
    pub fn matches(&self, packet: &Packet) -> bool {
        if !network_contains(self.src_net.as_ref(), packet.src_ip()) {
            return false;
        }
        if !network_contains(self.dst_net.as_ref(), packet.dst_ip()) {
            return false;
        }
        if let Some(proto) = self.proto {
            if proto != packet.proto() {
                return false;
            }
        }
        self.src_ports.matches(packet.src_port()) && self.dst_ports.matches(packet.dst_port())
    }
}

fn network_contains(network: Option<&IpNetwork>, addr: IpAddr) -> bool {
    match (network, addr) {
        (None, _) => true,
        (Some(IpNetwork::V4(net)), IpAddr::V4(ip)) => net.contains(ip),
        (Some(IpNetwork::V6(net)), IpAddr::V6(ip)) => net.contains(ip),
        // アドレスファミリーが異なる場合は常に不一致
        (Some(_), _) => false,
    }
}

#[derive(Debug, Clone)]
pub struct RuleBuilder {
    id: String,
    action: FirewallAction,
    src_net: Option<String>,
    dst_net: Option<String>,
    src_ports: Option<PortSpec>,
    dst_ports: Option<PortSpec>,
    proto: Option<String>,
    description: Option<String>,
}

impl RuleBuilder {
    pub fn new(id: impl Into<String>, action: FirewallAction) -> Self {
        Self {
            id: id.into(),
            action,
            src_net: None,
            dst_net: None,
            src_ports: None,
            dst_ports: None,
            proto: None,
            description: None,
        }
    }

    pub fn src_net(mut self, cidr: impl Into<String>) -> Self {
        self.src_net = Some(cidr.into());
        self
    }

    pub fn dst_net(mut self, cidr: impl Into<String>) -> Self {
        self.dst_net = Some(cidr.into());
        self
    }

    pub fn src_port(mut self, port: u16) -> Self {
        self.src_ports = Some(PortSpec::Single(port.into()));
        self
    }

    pub fn src_port_range(mut self, lo: u16, hi: u16) -> Self {
        self.src_ports = Some(PortSpec::Range(lo.into(), hi.into()));
        self
    }

    pub fn dst_port(mut self, port: u16) -> Self {
        self.dst_ports = Some(PortSpec::Single(port.into()));
        self
    }

    pub fn dst_port_range(mut self, lo: u16, hi: u16) -> Self {
        self.dst_ports = Some(PortSpec::Range(lo.into(), hi.into()));
        self
    }

    pub fn proto(mut self, proto: impl Into<String>) -> Self {
        self.proto = Some(proto.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn build(self) -> Result<Rule, RuleError> {
        if self.id.trim().is_empty() {
            return Err(RuleError::EmptyRuleId);
        }

        let src_net = self.src_net.as_deref().map(parse_network).transpose()?;
        let dst_net = self.dst_net.as_deref().map(parse_network).transpose()?;
        let src_ports = self.src_ports.map(PortMatch::try_from).transpose()?.unwrap_or_default();
        let dst_ports = self.dst_ports.map(PortMatch::try_from).transpose()?.unwrap_or_default();
        let proto = self
            .proto
            .as_deref()
            .map(|value| {
                value
                    .parse::<Protocol>()
                    .map_err(|_| RuleError::UnknownProtocol(value.to_string()))
            })
            .transpose()?;

        Ok(Rule {
            id: self.id,
            action: self.action,
            src_net,
            dst_net,
            src_ports,
            dst_ports,
            proto,
            description: self.description,
        })
    }
}

/// ホスト部にビットが立っているネットワーク (例: 10.0.0.5/24) は受け付けない
fn parse_network(value: &str) -> Result<IpNetwork, RuleError> {
    let network: IpNetwork = value.trim().parse().map_err(|e: ipnetwork::IpNetworkError| RuleError::InvalidCidr {
        value: value.to_string(),
        reason: e.to_string(),
    })?;

    if network.ip() != network.network() {
        return Err(RuleError::InvalidCidr {
            value: value.to_string(),
            reason: "ホスト部にビットが設定されています".to_string(),
        });
    }

    Ok(network)
}

/// 外部入力から読み込んだ未検証のルール
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    pub id: String,
    pub action: FirewallAction,
    #[serde(default)]
    pub src_net: Option<String>,
    #[serde(default)]
    pub dst_net: Option<String>,
    #[serde(default)]
    pub src_ports: Option<PortSpec>,
    #[serde(default)]
    pub dst_ports: Option<PortSpec>,
    #[serde(default)]
    pub proto: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TryFrom<RuleSpec> for Rule {
    type Error = RuleError;

    fn try_from(spec: RuleSpec) -> Result<Self, Self::Error> {
        RuleBuilder {
            id: spec.id,
            action: spec.action,
            src_net: spec.src_net,
            dst_net: spec.dst_net,
            src_ports: spec.src_ports,
            dst_ports: spec.dst_ports,
            proto: spec.proto,
            description: spec.description,
        }
        .build()
    }
}
