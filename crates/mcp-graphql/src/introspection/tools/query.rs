use rmcp::model::{CallToolResult, Content, Tool};
use rmcp::schemars::JsonSchema;
use rmcp::{schemars, serde_json};
use serde::Deserialize;
use tracing::warn;

use crate::forward::{QueryForwarder, QueryRequest};
use crate::schema_from_type;

/// The name of the tool to execute an ad hoc GraphQL operation
pub const QUERY_GRAPHQL_TOOL_NAME: &str = "query-graphql";

#[derive(Clone)]
pub struct QueryGraphql {
    forwarder: QueryForwarder,
    pub tool: Tool,
}

/// Input for the query-graphql tool.
#[derive(JsonSchema, Deserialize, Debug)]
pub struct Input {
    /// The GraphQL operation
    query: String,

    /// The variable values represented as JSON
    #[serde(default)]
    variables: Option<String>,

    /// Extra HTTP headers for this request as a JSON object. These override the configured headers.
    #[serde(default)]
    headers: Option<String>,
}

impl From<Input> for QueryRequest {
    fn from(input: Input) -> Self {
        QueryRequest {
            query: input.query,
            variables: input.variables,
            headers: input.headers,
        }
    }
}

impl QueryGraphql {
    pub fn new(forwarder: QueryForwarder) -> Self {
        Self {
            forwarder,
            tool: Tool::new(
                QUERY_GRAPHQL_TOOL_NAME,
                "Query a GraphQL endpoint with the given query and variables. \
                Use the `introspect-schema` tool first to get information about the GraphQL schema. \
                Always use the schema to create operations - do not try arbitrary operations.",
                schema_from_type!(Input),
            ),
        }
    }

    // Per-call headers may hold credentials and must never be recorded
    #[tracing::instrument(skip_all, fields(query = %input.query))]
    pub async fn execute(&self, input: Input) -> CallToolResult {
        match self.forwarder.forward(&input.into()).await {
            Ok(response) => CallToolResult::success(vec![Content::text(response)]),
            Err(error) => {
                warn!("GraphQL query failed: {error}");
                CallToolResult::error(vec![Content::text(error.to_string())])
            }
        }
    }
}
