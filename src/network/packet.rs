use crate::core::error::PacketError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// 既知のトランスポートプロトコル。文字列からは大文字小文字を区別せずに変換する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Icmp => "ICMP",
        }
    }
}

impl FromStr for Protocol {
    type Err = PacketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TCP" => Ok(Protocol::Tcp),
            "UDP" => Ok(Protocol::Udp),
            "ICMP" => Ok(Protocol::Icmp),
            _ => Err(PacketError::UnknownProtocol(s.to_string())),
        }
    }
}

impl TryFrom<String> for Protocol {
    type Error = PacketError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Protocol> for String {
    fn from(proto: Protocol) -> Self {
        proto.as_str().to_string()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1つのフローを表すパケット記述子。構築後は変更できない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PacketSpec")]
pub struct Packet {
    src_ip: IpAddr,
    dst_ip: IpAddr,
    src_port: u16,
    dst_port: u16,
    proto: Protocol,
}

impl Packet {
    pub fn new(src_ip: IpAddr, dst_ip: IpAddr, src_port: u16, dst_port: u16, proto: Protocol) -> Packet {
        Packet {
            src_ip,
            dst_ip,
            src_port,
            dst_port,
            proto,
        }
    }

    /// 文字列形式のアドレスとプロトコルからパケットを作成する
    pub fn parse(src_ip: &str, dst_ip: &str, src_port: u16, dst_port: u16, proto: &str) -> Result<Packet, PacketError> {
        Ok(Packet {
            src_ip: parse_addr(src_ip)?,
            dst_ip: parse_addr(dst_ip)?,
            src_port,
            dst_port,
            proto: proto.parse()?,
        })
    }

    pub fn src_ip(&self) -> IpAddr {
        self.src_ip
    }

    pub fn dst_ip(&self) -> IpAddr {
        self.dst_ip
    }

    pub fn src_port(&self) -> u16 {
        self.src_port
    }

    pub fn dst_port(&self) -> u16 {
        self.dst_port
    }

    pub fn proto(&self) -> Protocol {
        self.proto
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{} {}",
            self.src_ip, self.src_port, self.dst_ip, self.dst_port, self.proto
        )
    }
}

/// 外部入力 (JSON等) から読み込んだ未検証のパケット
#[derive(Debug, Clone, Deserialize)]
pub struct PacketSpec {
    pub src_ip: String,
    pub dst_ip: String,
    pub src_port: i64,
    pub dst_port: i64,
    pub proto: String,
}

impl TryFrom<PacketSpec> for Packet {
    type Error = PacketError;

    fn try_from(spec: PacketSpec) -> Result<Self, Self::Error> {
        Packet::parse(
            &spec.src_ip,
            &spec.dst_ip,
            parse_port(spec.src_port)?,
            parse_port(spec.dst_port)?,
            &spec.proto,
        )
    }
}

fn parse_addr(value: &str) -> Result<IpAddr, PacketError> {
    value
        .trim()
        .parse()
        .map_err(|_| PacketError::InvalidAddress(value.to_string()))
}

fn parse_port(value: i64) -> Result<u16, PacketError> {
    u16::try_from(value).map_err(|_| PacketError::PortOutOfRange(value))
}
