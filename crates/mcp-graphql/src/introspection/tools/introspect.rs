use reqwest::header::HeaderMap;
use rmcp::model::{CallToolResult, Content, Tool};
use rmcp::schemars::JsonSchema;
use rmcp::{schemars, serde_json};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::errors::SchemaFetchError;
use crate::introspection::introspect;
use crate::introspection::type_filter::filter_types;
use crate::schema_from_type;
use crate::schema_source::SchemaSource;

/// The name of the tool to get GraphQL schema information
pub const INTROSPECT_SCHEMA_TOOL_NAME: &str = "introspect-schema";

/// A tool to get the whole GraphQL schema, or details about specific types in it.
#[derive(Clone)]
pub struct IntrospectSchema {
    client: reqwest::Client,
    endpoint: Url,
    headers: HeaderMap,
    schema_source: SchemaSource,
    pub tool: Tool,
}

/// Input for the introspect-schema tool.
#[derive(JsonSchema, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    /// Names of the types to describe. When omitted or empty, the full schema is returned as SDL.
    #[serde(default)]
    type_names: Option<Vec<String>>,

    /// Include descriptions in the output. Descriptions are currently always included.
    #[serde(default = "default_true")]
    #[allow(dead_code)]
    descriptions: bool,

    /// Include directives in the output. Currently has no effect.
    #[serde(default = "default_true")]
    #[allow(dead_code)]
    directives: bool,
}

fn default_true() -> bool {
    true
}

impl IntrospectSchema {
    pub fn new(
        client: reqwest::Client,
        endpoint: Url,
        headers: HeaderMap,
        schema_source: SchemaSource,
    ) -> Self {
        Self {
            client,
            endpoint,
            headers,
            schema_source,
            tool: Tool::new(
                INTROSPECT_SCHEMA_TOOL_NAME,
                "Introspect the GraphQL schema. Pass `typeNames` to get details about specific types, \
                or omit it to get the full schema as SDL. Use this tool before executing a query to \
                get the schema information.",
                schema_from_type!(Input),
            ),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, input: Input) -> CallToolResult {
        let type_names = input.type_names.filter(|names| !names.is_empty());
        let result = match type_names {
            Some(type_names) => self.describe_types(&type_names).await,
            None => {
                self.schema_source
                    .resolve(&self.client, &self.endpoint, &self.headers)
                    .await
            }
        };

        match result {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(error) => {
                warn!("Introspection failed: {error}");
                CallToolResult::error(vec![Content::text(format!(
                    "Introspection failed: {error}"
                ))])
            }
        }
    }

    async fn describe_types(&self, type_names: &[String]) -> Result<String, SchemaFetchError> {
        let schema = introspect(&self.client, &self.endpoint, &self.headers).await?;
        Ok(filter_types(&schema, type_names)?)
    }
}
