use crate::error::ModelError;
use crate::types::TestModel;

/// Load and validate an index model from its JSON form.
pub fn parse_model(json: &str) -> Result<TestModel, ModelError> {
    Ok(serde_json::from_str(json)?)
}
