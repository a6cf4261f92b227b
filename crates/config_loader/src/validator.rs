//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则 (validator derive)：非空 id / map / actor_filter，tick_interval_ms >= 1，
//!   动力学参数为正
//! - 动力学制动顺序 brake_max >= brake_min >= brake_min_correct
//! - actor id 唯一，parent_actor 必须在 actors 中 (actors 非空时)
//! - sink 名称唯一，file sink 需要 path 参数

use std::collections::HashSet;

use contracts::{ContractError, RssSensorBlueprint, SinkType};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 RssSensorBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &RssSensorBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_dynamics(blueprint)?;
    validate_actors(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// 字段级规则
fn validate_fields(blueprint: &RssSensorBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|errors| {
        let mut flat = Vec::new();
        flatten_errors("", &errors, &mut flat);
        flat.sort();
        match flat.into_iter().next() {
            Some((field, message)) => ContractError::config_validation(field, message),
            None => ContractError::config_validation("blueprint", errors.to_string()),
        }
    })
}

/// 将嵌套的 ValidationErrors 展平为 (路径, 描述)
fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' rule", error.code));
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    flatten_errors(&format!("{path}[{idx}]"), nested, out);
                }
            }
        }
    }
}

/// 校验动力学参数的制动顺序
fn validate_dynamics(blueprint: &RssSensorBlueprint) -> Result<(), ContractError> {
    let profiles = [
        ("dynamics.ego", &blueprint.dynamics.ego),
        ("dynamics.other", &blueprint.dynamics.other),
    ];
    for (field, profile) in profiles {
        profile
            .check_brake_ordering()
            .map_err(|message| ContractError::config_validation(format!("{field}.alpha_lon"), message))?;
    }
    Ok(())
}

/// 校验 actor id 唯一性及 parent_actor
fn validate_actors(blueprint: &RssSensorBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for actor in &blueprint.actors {
        if !seen.insert(actor.id) {
            return Err(ContractError::config_validation(
                format!("actors[id={}]", actor.id),
                "duplicate actor id",
            ));
        }
    }

    if let Some(parent) = blueprint.sensor.parent_actor {
        if !blueprint.actors.is_empty() && !seen.contains(&parent) {
            return Err(ContractError::config_validation(
                "sensor.parent_actor",
                format!("parent_actor {parent} not found in actors"),
            ));
        }
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &RssSensorBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                format!("duplicate sink name '{}'", sink.name),
            ));
        }

        if sink.sink_type == SinkType::File
            && !sink
                .params
                .get("path")
                .is_some_and(|path| !path.trim().is_empty())
        {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].params.path"),
                "file sink requires a non-empty 'path' parameter",
            ));
        }
    }
    Ok(())
}
