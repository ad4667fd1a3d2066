use crate::core::error::SimulatorError;
use crate::security::firewall::FirewallAction;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub simulation: SimulationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub scenario: String,
    pub default_action: FirewallAction,
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig {
                scenario: "demo1".to_string(),
                default_action: FirewallAction::Allow,
                report_path: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
            },
        }
    }
}

impl Configuration {
    /// `.env` とプロセスの環境変数から設定を読み込む。未設定の項目はデフォルト値。
    pub fn from_env() -> Result<Self, SimulatorError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, SimulatorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let default_action = match lookup("FWSIM_DEFAULT_ACTION") {
            Some(value) => value
                .parse()
                .map_err(|e| SimulatorError::Config(format!("無効なFWSIM_DEFAULT_ACTION: {}", e)))?,
            None => defaults.simulation.default_action,
        };

        Ok(Configuration {
            simulation: SimulationConfig {
                scenario: lookup("FWSIM_SCENARIO").unwrap_or(defaults.simulation.scenario),
                default_action,
                report_path: lookup("FWSIM_REPORT_PATH").map(PathBuf::from),
            },
            logging: LoggingConfig {
                level: lookup("FWSIM_LOG_LEVEL").unwrap_or(defaults.logging.level),
                file: lookup("FWSIM_LOG_FILE").map(PathBuf::from),
            },
        })
    }

    /// 優先順位: コマンドライン > ルールファイル > 環境変数 (既定値 ALLOW)
    pub fn resolve_default_action(
        &self,
        cli: Option<FirewallAction>,
        rule_file: Option<FirewallAction>,
    ) -> FirewallAction {
        cli.or(rule_file).unwrap_or(self.simulation.default_action)
    }

    /// `--out` が指定されていれば FWSIM_REPORT_PATH より優先する
    pub fn resolve_report_path(&self, cli: Option<PathBuf>) -> Option<PathBuf> {
        cli.or_else(|| self.simulation.report_path.clone())
    }

    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            simulation: SimulationConfig {
                scenario: "order_test".to_string(),
                default_action: FirewallAction::Deny,
                report_path: None,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                file: None,
            },
        }
    }
}
