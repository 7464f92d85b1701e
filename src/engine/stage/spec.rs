use serde_json::{Map, Value};

use super::merge_cursors::STAGE_NAME;
use crate::engine::errors::MergeError;
use crate::engine::merger::MergeParams;

/// Parses a serialized stage, `{"$mergeCursors": {nss, remotes, sort?, batchSize?}}`,
/// into validated merge parameters.
pub fn parse_stage(value: &Value) -> Result<MergeParams, MergeError> {
    let stage = value
        .as_object()
        .ok_or_else(|| MergeError::InvalidSpec(format!("stage must be an object, got {}", value)))?;

    if stage.len() != 1 {
        return Err(MergeError::InvalidSpec(format!(
            "stage must have exactly one field, found {}",
            stage.len()
        )));
    }

    let body = stage.get(STAGE_NAME).ok_or_else(|| {
        let name = stage.keys().next().map(String::as_str).unwrap_or_default();
        MergeError::InvalidSpec(format!("expected {}, found {}", STAGE_NAME, name))
    })?;

    parse_body(body)
}

/// Parses the body of a `$mergeCursors` stage.
pub fn parse_body(body: &Value) -> Result<MergeParams, MergeError> {
    if !body.is_object() {
        return Err(MergeError::InvalidSpec(format!(
            "{} takes an object, got {}",
            STAGE_NAME, body
        )));
    }

    let params: MergeParams = serde_json::from_value(body.clone())
        .map_err(|error| MergeError::InvalidSpec(error.to_string()))?;
    params.validate()?;
    Ok(params)
}

pub fn serialize_stage(params: &MergeParams) -> Result<Value, MergeError> {
    let mut stage = Map::with_capacity(1);
    stage.insert(STAGE_NAME.to_string(), serde_json::to_value(params)?);
    Ok(Value::Object(stage))
}
