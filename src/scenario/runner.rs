use crate::core::error::{SimulatorError, SimulatorResult};
use crate::network::packet::Packet;
use crate::report::{write_csv, write_json, ReportFormat, ReportRow};
use crate::security::firewall::{FirewallAction, Rule, RuleEngine};
use chrono::Utc;
use log::info;
use std::fs::File;
use std::path::Path;

/// パケット群をエンジンに通し、結果を保持してレポートに書き出す
pub struct ScenarioRunner {
    engine: RuleEngine,
    packets: Vec<Packet>,
    results: Vec<ReportRow>,
}

impl ScenarioRunner {
    pub fn new(rules: Vec<Rule>, packets: Vec<Packet>, default_action: FirewallAction) -> Self {
        Self::with_engine(RuleEngine::new(rules, default_action), packets)
    }

    pub fn with_engine(engine: RuleEngine, packets: Vec<Packet>) -> Self {
        Self {
            engine,
            packets,
            results: Vec::new(),
        }
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn results(&self) -> &[ReportRow] {
        &self.results
    }

    /// 全パケットを評価する。同じ実行の行はすべて同じタイムスタンプを持つ。
    pub fn run(&mut self) -> &[ReportRow] {
        let now = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();

        self.results = self
            .engine
            .evaluate_batch(&self.packets)
            .into_iter()
            .map(|record| ReportRow::from_record(record, &now))
            .collect();

        let denied = self
            .results
            .iter()
            .filter(|row| row.action == FirewallAction::Deny)
            .count();
        info!(
            "シナリオを実行しました: ルール数={} パケット数={} 拒否={}",
            self.engine.len(),
            self.results.len(),
            denied
        );

        &self.results
    }

    pub fn save_csv(&self, path: impl AsRef<Path>) -> SimulatorResult<()> {
        let rows = self.ensure_results()?;
        write_csv(File::create(path.as_ref())?, rows)?;
        info!("CSVを保存しました: {}", path.as_ref().display());
        Ok(())
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> SimulatorResult<()> {
        let rows = self.ensure_results()?;
        write_json(File::create(path.as_ref())?, rows)?;
        info!("JSONを保存しました: {}", path.as_ref().display());
        Ok(())
    }

    /// 拡張子から形式を決めて保存する
    pub fn save(&self, path: impl AsRef<Path>) -> SimulatorResult<ReportFormat> {
        let format = ReportFormat::from_path(path.as_ref());
        match format {
            ReportFormat::Json => self.save_json(path)?,
            ReportFormat::Csv => self.save_csv(path)?,
        }
        Ok(format)
    }

    fn ensure_results(&self) -> SimulatorResult<&[ReportRow]> {
        if self.results.is_empty() {
            return Err(SimulatorError::NoResults);
        }
        Ok(&self.results)
    }
}
