use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("無効なIPアドレス: {0}")]
    InvalidAddress(String),

    #[error("ポート番号が範囲外です (0-65535): {0}")]
    PortOutOfRange(i64),

    #[error("未知のプロトコル: {0}")]
    UnknownProtocol(String),
}

/// ルール構築時のエラー。構築に失敗したルールはエンジンに渡らない。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("ルールIDが空です")]
    EmptyRuleId,

    #[error("無効なアクション: {0} (ALLOW または DENY)")]
    InvalidAction(String),

    #[error("無効なCIDR '{value}': {reason}")]
    InvalidCidr { value: String, reason: String },

    #[error("無効なポート範囲: {lo}-{hi}")]
    InvalidPortRange { lo: i64, hi: i64 },

    #[error("ポート番号が範囲外です (0-65535): {0}")]
    PortOutOfRange(i64),

    #[error("未知のプロトコル: {0}")]
    UnknownProtocol(String),
}

#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ロガーのセットアップに失敗しました: {0}")]
    Logger(String),

    #[error("パケットエラー: {0}")]
    Packet(#[from] PacketError),

    #[error("ルールエラー: {0}")]
    Rule(#[from] RuleError),

    #[error("ルール {id} の構築に失敗しました: {source}")]
    InvalidRule {
        id: String,
        #[source]
        source: RuleError,
    },

    #[error("ルールIDが重複しています: {0}")]
    DuplicateRuleId(String),

    #[error("未知のシナリオ: {0}")]
    UnknownScenario(String),

    #[error("保存する結果がありません。先にシナリオを実行してください")]
    NoResults,

    #[error("入出力エラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSONエラー: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SimulatorResult<T> = Result<T, SimulatorError>;
