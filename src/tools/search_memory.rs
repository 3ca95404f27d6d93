use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchMemoryParams {
    #[schemars(description = "Natural language query")]
    pub query: String,

    #[schemars(description = "Maximum number of events to return. Defaults to 10.")]
    pub k: Option<usize>,
}
