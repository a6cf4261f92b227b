//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON 格式。

use contracts::{ContractError, RssSensorBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

fn parse_error<E>(format: &str, e: E) -> ContractError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ContractError::ConfigParse {
        message: format!("{format} parse error: {e}"),
        source: Some(Box::new(e)),
    }
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<RssSensorBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_error("TOML", e)),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| parse_error("JSON", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{SinkType, SkipPolicy};

    #[test]
    fn test_parse_toml_applies_defaults() {
        let content = r#"
[sensor]
id = "rss"
parent_actor = 1

[world]
map = "Town04"

[[actors]]
id = 1
type_id = "vehicle.tesla.model3"
"#;
        let bp = parse(content, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.sensor.parent_actor, Some(1));
        assert_eq!(bp.sensor.actor_filter, "vehicle.*");
        assert_eq!(bp.sensor.skip_policy, SkipPolicy::EmitDefault);
        assert_eq!(bp.world.tick_interval_ms, 50);
        assert_eq!(bp.dynamics.ego.response_time, 0.2);
        assert_eq!(bp.dynamics.other.response_time, 1.0);
        assert!(bp.sinks.is_empty());
    }

    #[test]
    fn test_parse_json() {
        let content = r#"{
            "sensor": { "id": "rss", "skip_policy": "suppress" },
            "world": { "map": "Town04", "tick_interval_ms": 100 },
            "sinks": [{ "name": "log", "sink_type": "log" }]
        }"#;
        let bp = parse(content, ConfigFormat::Json).unwrap();
        assert_eq!(bp.sensor.skip_policy, SkipPolicy::Suppress);
        assert_eq!(bp.sensor.parent_actor, None);
        assert_eq!(bp.sinks[0].sink_type, SinkType::Log);
        assert_eq!(bp.sinks[0].queue_capacity, 100);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse("invalid toml [[[", ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_skip_policy_rejected() {
        let content = r#"
[sensor]
id = "rss"
skip_policy = "block"

[world]
map = "Town04"
"#;
        assert!(parse(content, ConfigFormat::Toml).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
