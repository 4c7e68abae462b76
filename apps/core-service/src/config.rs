//! # Core Service 設定
//!
//! 環境変数から Core Service サーバーの設定を読み込む。

use std::{env, str::FromStr, time::Duration};

use shoninflow_domain::value_objects::ApproverId;
use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 値の形式が不正
    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Core Service サーバーの設定
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// インスタンスロック取得の最大待ち時間
    pub lock_timeout: Duration,
    /// ワークフローテンプレート JSON のパス（未設定でテンプレートなし）
    pub templates_path: Option<String>,
    /// 操作を許可するアクター（未設定で全員許可）
    pub permitted_actors: Option<Vec<ApproverId>>,
    /// イベント配信バックエンド
    pub event_sink: EventSinkBackend,
}

/// イベント配信バックエンド
///
/// `EVENT_SINK_BACKEND` 環境変数で切り替える:
/// - `noop`: 配信しない（ログ出力のみ）
/// - `channel`: プロセス内チャネル経由でディスパッチャーへ渡す
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventSinkBackend {
    #[default]
    Noop,
    Channel,
}

impl FromStr for EventSinkBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "noop" => Ok(Self::Noop),
            "channel" => Ok(Self::Channel),
            other => Err(ConfigError::Invalid {
                name:  "EVENT_SINK_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

impl CoreConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("CORE_PORT") {
            Some(value) => parse_or_invalid("CORE_PORT", &value)?,
            None => 3001,
        };
        let lock_timeout_ms: u64 = match lookup("LOCK_TIMEOUT_MS") {
            Some(value) => parse_or_invalid("LOCK_TIMEOUT_MS", &value)?,
            None => 2000,
        };
        let event_sink = match lookup("EVENT_SINK_BACKEND") {
            Some(value) => value.parse()?,
            None => EventSinkBackend::default(),
        };
        let permitted_actors = lookup("PERMITTED_ACTORS")
            .map(|value| parse_actor_list(&value))
            .transpose()?;

        Ok(Self {
            host: lookup("CORE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
            templates_path: lookup("WORKFLOW_TEMPLATES_PATH").filter(|p| !p.is_empty()),
            permitted_actors,
            event_sink,
        })
    }
}

fn parse_or_invalid<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn parse_actor_list(value: &str) -> Result<Vec<ApproverId>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            ApproverId::new(s).map_err(|_| ConfigError::Invalid {
                name:  "PERMITTED_ACTORS",
                value: s.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<CoreConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CoreConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_未設定ならデフォルト値になる() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert_eq!(config.lock_timeout, Duration::from_millis(2000));
        assert_eq!(config.templates_path, None);
        assert_eq!(config.permitted_actors, None);
        assert_eq!(config.event_sink, EventSinkBackend::Noop);
    }

    #[test]
    fn test_環境変数の値が反映される() {
        let config = config_from(&[
            ("CORE_HOST", "127.0.0.1"),
            ("CORE_PORT", "4000"),
            ("LOCK_TIMEOUT_MS", "150"),
            ("WORKFLOW_TEMPLATES_PATH", "/etc/shoninflow/templates.json"),
            ("PERMITTED_ACTORS", "pm-1, dir-1,,"),
            ("EVENT_SINK_BACKEND", "channel"),
        ])
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 4000);
        assert_eq!(config.lock_timeout, Duration::from_millis(150));
        assert_eq!(
            config.templates_path.as_deref(),
            Some("/etc/shoninflow/templates.json")
        );
        assert_eq!(
            config.permitted_actors,
            Some(vec![
                ApproverId::new("pm-1").unwrap(),
                ApproverId::new("dir-1").unwrap()
            ])
        );
        assert_eq!(config.event_sink, EventSinkBackend::Channel);
    }

    #[test]
    fn test_不正なポートはエラーになる() {
        let result = config_from(&[("CORE_PORT", "not-a-port")]);

        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "CORE_PORT",
                ..
            })
        ));
    }

    #[test]
    fn test_未知のイベント配信バックエンドはエラーになる() {
        let result = config_from(&[("EVENT_SINK_BACKEND", "kafka")]);

        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "EVENT_SINK_BACKEND",
                ..
            })
        ));
    }
}
