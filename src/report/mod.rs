pub mod writer;

use crate::network::packet::Packet;
use crate::security::firewall::{EvaluationRecord, FirewallAction};
use serde::Serialize;
use std::borrow::Cow;
use std::path::Path;

pub use writer::{write_csv, write_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    /// 拡張子が `.json` ならJSON、それ以外はCSV
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            _ => ReportFormat::Csv,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "CSV",
            ReportFormat::Json => "JSON",
        }
    }
}

/// レポート出力用の1行。評価結果に実行時刻を付加したもの。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub index: usize,
    pub timestamp_utc: String,
    #[serde(flatten)]
    pub packet: Packet,
    pub action: FirewallAction,
    pub matched_rule_id: Option<String>,
}

impl ReportRow {
    pub fn from_record(record: EvaluationRecord, timestamp_utc: &str) -> Self {
        Self {
            index: record.index,
            timestamp_utc: timestamp_utc.to_string(),
            packet: record.packet,
            action: record.action,
            matched_rule_id: record.matched_rule_id,
        }
    }

    pub fn csv_header() -> &'static str {
        "index,timestamp_utc,src_ip,dst_ip,src_port,dst_port,proto,action,matched_rule_id"
    }

    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            self.index,
            csv_field(&self.timestamp_utc),
            self.packet.src_ip(),
            self.packet.dst_ip(),
            self.packet.src_port(),
            self.packet.dst_port(),
            self.packet.proto(),
            self.action,
            csv_field(self.matched_rule_id.as_deref().unwrap_or("")),
        )
    }
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(rule: Option<&str>) -> ReportRow {
        ReportRow {
            index: 2,
            timestamp_utc: "2024-05-01T12:00:00.000000".to_string(),
            packet: Packet::parse("192.168.1.10", "10.0.0.20", 40000, 22, "tcp").unwrap(),
            action: FirewallAction::Allow,
            matched_rule_id: rule.map(str::to_string),
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ReportFormat::from_path(Path::new("out.json")), ReportFormat::Json);
        assert_eq!(ReportFormat::from_path(Path::new("OUT.JSON")), ReportFormat::Json);
        assert_eq!(ReportFormat::from_path(Path::new("out.csv")), ReportFormat::Csv);
        assert_eq!(ReportFormat::from_path(Path::new("report")), ReportFormat::Csv);
    }

    #[test]
    fn test_csv_line() {
        assert_eq!(
            row(Some("R2")).to_csv_line(),
            "2,2024-05-01T12:00:00.000000,192.168.1.10,10.0.0.20,40000,22,TCP,ALLOW,R2"
        );
        assert!(row(None).to_csv_line().ends_with(",ALLOW,"));
    }

    #[test]
    fn test_csv_quotes_special_characters() {
        assert_eq!(row(Some("a,\"b\"")).to_csv_line().rsplit_once("ALLOW,").unwrap().1, "\"a,\"\"b\"\"\"");
    }
}
