//! Forwarding of arbitrary GraphQL operations to the endpoint

use std::collections::BTreeMap;
use std::str::FromStr;

use apollo_compiler::ast::{Definition, OperationType};
use apollo_compiler::parser::Parser;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::errors::{ForwardError, status_text};

/// A single operation to forward, as received from the MCP client
#[derive(Debug, Default, Clone)]
pub struct QueryRequest {
    /// The GraphQL document
    pub query: String,

    /// Variable values as JSON text
    pub variables: Option<String>,

    /// Extra headers for this request as a JSON object
    pub headers: Option<String>,
}

/// Sends GraphQL operations to the endpoint, enforcing the mutation policy
#[derive(Debug, Clone)]
pub struct QueryForwarder {
    client: reqwest::Client,
    endpoint: Url,
    headers: HeaderMap,
    allow_mutations: bool,
}

impl QueryForwarder {
    pub fn new(
        client: reqwest::Client,
        endpoint: Url,
        headers: &HeaderMap,
        allow_mutations: bool,
    ) -> Self {
        let headers = {
            let mut defaults = HeaderMap::new();
            defaults.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            defaults.extend(headers.clone());
            defaults
        };
        Self {
            client,
            endpoint,
            headers,
            allow_mutations,
        }
    }

    /// Validate and forward an operation, returning the endpoint's response as pretty JSON.
    ///
    /// Syntax errors and disallowed mutations are rejected before anything is sent.
    #[tracing::instrument(skip_all, fields(endpoint = %self.endpoint))]
    pub async fn forward(&self, request: &QueryRequest) -> Result<String, ForwardError> {
        check_operation(&request.query, self.allow_mutations)?;

        let variables = parse_variables(request.variables.as_deref())?;
        let headers = merge_headers(&self.headers, request.headers.as_deref())?;
        let body = json!({
            "query": request.query,
            "variables": variables,
        });

        debug!("Forwarding GraphQL operation");
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable response body: {e}>"));
            return Err(ForwardError::Transport {
                status_text: status_text(status),
                body,
            });
        }

        let text = response.text().await?;

        let json: Value = serde_json::from_str(&text)?;
        if let Some(errors) = json
            .get("errors")
            .and_then(Value::as_array)
            .filter(|errors| !errors.is_empty())
        {
            return Err(ForwardError::GraphQLExecution(serde_json::to_string_pretty(
                errors,
            )?));
        }

        Ok(serde_json::to_string_pretty(&json)?)
    }
}

/// Check the syntax of a document and reject mutations unless they are allowed.
///
/// Queries and subscriptions always pass the policy check.
fn check_operation(query: &str, allow_mutations: bool) -> Result<(), ForwardError> {
    let document = Parser::new().parse_ast(query, "operation.graphql")?;

    let has_mutation = document.definitions.iter().any(|definition| {
        matches!(
            definition,
            Definition::OperationDefinition(operation)
                if operation.operation_type == OperationType::Mutation
        )
    });

    if has_mutation && !allow_mutations {
        return Err(ForwardError::MutationNotAllowed);
    }
    Ok(())
}

/// Empty text counts the same as no value at all
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

fn parse_variables(variables: Option<&str>) -> Result<Value, ForwardError> {
    match non_empty(variables) {
        Some(text) => Ok(serde_json::from_str(text)?),
        None => Ok(Value::Null),
    }
}

/// Layer per-request headers over the defaults, replacing any header with the same name
fn merge_headers(defaults: &HeaderMap, overrides: Option<&str>) -> Result<HeaderMap, ForwardError> {
    let mut headers = defaults.clone();
    if let Some(text) = non_empty(overrides) {
        let overrides: BTreeMap<String, String> = serde_json::from_str(text)?;
        for (name, value) in overrides {
            headers.insert(HeaderName::from_str(&name)?, HeaderValue::from_str(&value)?);
        }
    }
    Ok(headers)
}
