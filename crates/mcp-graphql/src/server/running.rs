use reqwest::header::HeaderMap;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ErrorCode, Implementation, JsonObject,
    ListResourcesResult, ListToolsResult, PaginatedRequestParams, RawResource,
    ReadResourceRequestParams, ReadResourceResult, Resource, ResourceContents,
    ResourcesCapability, ServerCapabilities, ServerInfo, ToolsCapability,
};
use rmcp::{RoleServer, ServerHandler, service::RequestContext};
use serde_json::Value;
use tracing::error;
use url::Url;

use crate::errors::McpError;
use crate::forward::QueryForwarder;
use crate::introspection::tools::introspect::{INTROSPECT_SCHEMA_TOOL_NAME, IntrospectSchema};
use crate::introspection::tools::query::{QUERY_GRAPHQL_TOOL_NAME, QueryGraphql};
use crate::schema_source::SchemaSource;

/// The name of the resource holding the endpoint's schema as SDL
pub(crate) const SCHEMA_RESOURCE_NAME: &str = "graphql-schema";

#[derive(Clone)]
pub(super) struct Running {
    name: String,
    endpoint: Url,
    headers: HeaderMap,
    client: reqwest::Client,
    schema_source: SchemaSource,
    introspect_tool: IntrospectSchema,
    query_tool: QueryGraphql,
}

impl Running {
    pub(super) fn new(
        client: reqwest::Client,
        name: String,
        endpoint: Url,
        headers: HeaderMap,
        allow_mutations: bool,
        schema_source: SchemaSource,
    ) -> Self {
        let introspect_tool = IntrospectSchema::new(
            client.clone(),
            endpoint.clone(),
            headers.clone(),
            schema_source.clone(),
        );
        let query_tool = QueryGraphql::new(QueryForwarder::new(
            client.clone(),
            endpoint.clone(),
            &headers,
            allow_mutations,
        ));
        Self {
            name,
            endpoint,
            headers,
            client,
            schema_source,
            introspect_tool,
            query_tool,
        }
    }

    fn list_tools_impl(&self) -> ListToolsResult {
        ListToolsResult::with_all_items(vec![
            self.introspect_tool.tool.clone(),
            self.query_tool.tool.clone(),
        ])
    }

    async fn call_tool_impl(
        &self,
        tool_name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        if tool_name == INTROSPECT_SCHEMA_TOOL_NAME {
            Ok(self
                .introspect_tool
                .execute(convert_arguments(arguments)?)
                .await)
        } else if tool_name == QUERY_GRAPHQL_TOOL_NAME {
            Ok(self.query_tool.execute(convert_arguments(arguments)?).await)
        } else {
            Err(tool_not_found(tool_name))
        }
    }

    fn schema_resource(&self) -> Resource {
        Resource::new(
            RawResource {
                name: SCHEMA_RESOURCE_NAME.to_string(),
                uri: self.endpoint.to_string(),
                mime_type: None,
                title: None,
                description: Some(format!("The GraphQL schema of {}", self.endpoint)),
                icons: None,
                size: None,
                meta: None,
            },
            None,
        )
    }

    fn list_resources_impl(&self) -> ListResourcesResult {
        ListResourcesResult::with_all_items(vec![self.schema_resource()])
    }

    async fn read_resource_impl(
        &self,
        request: ReadResourceRequestParams,
    ) -> Result<ReadResourceResult, McpError> {
        if Url::parse(&request.uri).ok().as_ref() != Some(&self.endpoint) {
            return Err(McpError::resource_not_found(
                format!("Resource not found for URI: {}", request.uri),
                None,
            ));
        }

        let text = self
            .schema_source
            .resolve(&self.client, &self.endpoint, &self.headers)
            .await
            .map_err(|e| {
                error!("Failed to get GraphQL schema: {e}");
                McpError::internal_error(format!("Failed to get GraphQL schema: {e}"), None)
            })?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::TextResourceContents {
                uri: request.uri,
                mime_type: None,
                text,
                meta: None,
            }],
        })
    }
}

impl ServerHandler for Running {
    #[tracing::instrument(skip_all, fields(tool_name = request.name.as_ref(), request_id = %context.id.clone()))]
    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.call_tool_impl(&request.name, request.arguments).await
    }

    #[tracing::instrument(skip_all)]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(self.list_tools_impl())
    }

    #[tracing::instrument(skip_all)]
    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(self.list_resources_impl())
    }

    #[tracing::instrument(skip_all, fields(resource_uri = request.uri.as_str(), request_id = %context.id.clone()))]
    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        self.read_resource_impl(request).await
    }

    fn get_info(&self) -> ServerInfo {
        let capabilities = ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
            resources: Some(ResourcesCapability::default()),
            ..Default::default()
        };

        ServerInfo {
            server_info: Implementation {
                name: self.name.clone(),
                icons: None,
                title: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                website_url: None,
            },
            capabilities,
            instructions: Some(format!("GraphQL MCP server for {}", self.endpoint)),
            ..Default::default()
        }
    }
}

fn tool_not_found(name: &str) -> McpError {
    McpError::new(
        ErrorCode::METHOD_NOT_FOUND,
        format!("Tool {name} not found"),
        None,
    )
}

fn convert_arguments<T: serde::de::DeserializeOwned>(
    arguments: Option<JsonObject>,
) -> Result<T, McpError> {
    serde_json::from_value(Value::from(arguments.unwrap_or_default())).map_err(|e| {
        McpError::new(
            ErrorCode::INVALID_PARAMS,
            format!("Invalid input: {e}"),
            None,
        )
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::introspection::test_support::{HELLO_INTROSPECTION, response_body, text};

    fn running(endpoint: &str, allow_mutations: bool, schema_source: SchemaSource) -> Running {
        Running::new(
            reqwest::Client::new(),
            "test-server".to_string(),
            endpoint.parse().unwrap(),
            HeaderMap::new(),
            allow_mutations,
            schema_source,
        )
    }

    fn arguments(value: Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    #[test]
    fn lists_both_tools() {
        let running = running("http://localhost:4000/graphql", false, SchemaSource::Introspect);

        let names: Vec<_> = running
            .list_tools_impl()
            .tools
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();

        assert_eq!(names, ["introspect-schema", "query-graphql"]);
    }

    #[test]
    fn lists_the_schema_resource_at_the_endpoint() {
        let running = running("http://localhost:4000/graphql", false, SchemaSource::Introspect);

        let resources = running.list_resources_impl().resources;

        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name, "graphql-schema");
        assert_eq!(resources[0].uri, "http://localhost:4000/graphql");
    }

    #[test]
    fn server_info_reports_name_and_endpoint() {
        let running = running("https://api.example.com/graphql", false, SchemaSource::Introspect);

        let info = running.get_info();

        assert_eq!(info.server_info.name, "test-server");
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            info.instructions.as_deref(),
            Some("GraphQL MCP server for https://api.example.com/graphql")
        );
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
    }

    #[tokio::test]
    async fn reads_the_schema_resource() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.graphql");
        std::fs::write(&path, "type Query { hello: String }").unwrap();
        let running = running("http://localhost:4000/graphql", false, SchemaSource::File(path));

        let result = running
            .read_resource_impl(ReadResourceRequestParams {
                uri: "http://localhost:4000/graphql".to_string(),
                meta: None,
            })
            .await
            .unwrap();

        let [ResourceContents::TextResourceContents { uri, text, .. }] = result.contents.as_slice()
        else {
            panic!("expected a single text resource");
        };
        assert_eq!(uri, "http://localhost:4000/graphql");
        assert_eq!(text, "type Query { hello: String }");
    }

    #[tokio::test]
    async fn reads_the_schema_resource_through_introspection() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(response_body(HELLO_INTROSPECTION))
            .expect(1)
            .create_async()
            .await;
        let endpoint = format!("{}/graphql", server.url());
        let running = running(&endpoint, false, SchemaSource::Introspect);

        let result = running
            .read_resource_impl(ReadResourceRequestParams {
                uri: endpoint,
                meta: None,
            })
            .await
            .unwrap();

        mock.assert();
        let [ResourceContents::TextResourceContents { text, .. }] = result.contents.as_slice() else {
            panic!("expected a single text resource");
        };
        assert!(text.contains("hello: String"));
    }

    #[tokio::test]
    async fn schema_resolution_failure_is_an_mcp_error() {
        let dir = tempfile::tempdir().unwrap();
        let running = running(
            "http://localhost:4000/graphql",
            false,
            SchemaSource::File(dir.path().join("missing.graphql")),
        );

        let error = running
            .read_resource_impl(ReadResourceRequestParams {
                uri: "http://localhost:4000/graphql".to_string(),
                meta: None,
            })
            .await
            .unwrap_err();

        assert_eq!(error.code, ErrorCode::INTERNAL_ERROR);
        assert!(error.message.starts_with("Failed to get GraphQL schema: "));
    }

    #[tokio::test]
    async fn other_resources_are_not_found() {
        let running = running("http://localhost:4000/graphql", false, SchemaSource::Introspect);

        for uri in ["http://localhost:4000/other", "not a uri"] {
            let error = running
                .read_resource_impl(ReadResourceRequestParams {
                    uri: uri.to_string(),
                    meta: None,
                })
                .await
                .unwrap_err();

            assert_eq!(error.code, ErrorCode::RESOURCE_NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn unknown_tools_are_method_not_found() {
        let running = running("http://localhost:4000/graphql", false, SchemaSource::Introspect);

        let error = running.call_tool_impl("execute", None).await.unwrap_err();

        assert_eq!(error.code, ErrorCode::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_arguments_are_invalid_params() {
        let running = running("http://localhost:4000/graphql", false, SchemaSource::Introspect);

        let error = running
            .call_tool_impl(QUERY_GRAPHQL_TOOL_NAME, arguments(json!({"variables": "{}"})))
            .await
            .unwrap_err();

        assert_eq!(error.code, ErrorCode::INVALID_PARAMS);

        let error = running
            .call_tool_impl(
                INTROSPECT_SCHEMA_TOOL_NAME,
                arguments(json!({"typeNames": "Query"})),
            )
            .await
            .unwrap_err();

        assert_eq!(error.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn disallowed_mutation_is_rejected_without_a_request() {
        // Nothing listens at this endpoint, so any request would fail with a different message
        let running = running("https://api.example.com/graphql", false, SchemaSource::Introspect);

        let result = running
            .call_tool_impl(
                QUERY_GRAPHQL_TOOL_NAME,
                arguments(json!({"query": "mutation { doThing }"})),
            )
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            text(&result),
            "Mutations are not allowed unless you enable them in the configuration. Please use a query operation instead."
        );
    }

    #[tokio::test]
    async fn introspect_schema_classifies_hello_query() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(response_body(HELLO_INTROSPECTION))
            .create_async()
            .await;
        let running = running(
            &format!("{}/graphql", server.url()),
            false,
            SchemaSource::Introspect,
        );

        let result = running
            .call_tool_impl(
                INTROSPECT_SCHEMA_TOOL_NAME,
                arguments(json!({"typeNames": ["Query"]})),
            )
            .await
            .unwrap();

        let value: Value = serde_json::from_str(text(&result)).unwrap();
        assert_eq!(value["Query"]["kind"], "OBJECT");
        assert_eq!(value["Query"]["fields"]["hello"]["type"], "String");
    }

    #[tokio::test]
    async fn query_graphql_reports_graphql_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"errors": [{"message": "boom"}]}"#)
            .create_async()
            .await;
        let running = running(
            &format!("{}/graphql", server.url()),
            false,
            SchemaSource::Introspect,
        );

        let result = running
            .call_tool_impl(QUERY_GRAPHQL_TOOL_NAME, arguments(json!({"query": "{ hello }"})))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).starts_with("GraphQL errors: ["));
        assert!(text(&result).contains("\"message\": \"boom\""));
    }
}
