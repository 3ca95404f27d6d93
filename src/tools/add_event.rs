use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AddEventParams {
    #[schemars(
        description = "The event as a JSON object. Objects with an 'action' key are stored as actions, objects with an 'observation' key as observations."
    )]
    pub event: serde_json::Value,
}
