use std::fmt;
use std::path::PathBuf;

use apollo_compiler::ast::Document;
use apollo_compiler::validation::WithErrors;
use reqwest::StatusCode;
use reqwest::header::{InvalidHeaderName, InvalidHeaderValue};
use tokio::task::JoinError;

/// A wrapper around WithErrors that provides safe UTF-8 formatting
/// This avoids the ariadne UTF-8 multibyte character bug
pub(crate) struct SafeWithErrors<'a, T>(pub(crate) &'a WithErrors<T>);

impl<T> fmt::Display for SafeWithErrors<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = &self.0.errors;

        if errors.is_empty() {
            return write!(f, "Unknown error");
        }

        let mut first = true;
        for diagnostic in errors.iter() {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{}", diagnostic.error)?;
        }

        Ok(())
    }
}

/// An error that prevents the server from starting
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start server: {0}")]
    StartupError(#[from] JoinError),

    #[error("Failed to initialize MCP server: {0}")]
    McpInitializeError(#[from] Box<rmcp::service::ServerInitializeError>),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// A failure while obtaining the schema of the GraphQL endpoint
#[derive(Debug, thiserror::Error)]
pub enum SchemaFetchError {
    #[error("GraphQL request failed: {0}")]
    Introspection(String),

    #[error("Failed to fetch schema from URL: {0}")]
    RemoteSchema(String),

    #[error("Could not read schema file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Introspection response contained no data{}", errors_suffix(.0))]
    MissingData(Vec<String>),

    #[error("Could not parse the GraphQL schema: {0}")]
    Schema(#[from] cynic_introspection::SchemaError),

    #[error("Could not serialize type information: {0}")]
    Json(#[from] serde_json::Error),
}

fn errors_suffix(errors: &[String]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(": {}", errors.join("; "))
    }
}

/// A failure while forwarding an operation to the GraphQL endpoint.
///
/// Every variant is recoverable and is reported to the MCP client as a tool
/// error rather than aborting the server.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Invalid GraphQL query: {0}")]
    QuerySyntax(String),

    #[error(
        "Mutations are not allowed unless you enable them in the configuration. Please use a query operation instead."
    )]
    MutationNotAllowed,

    #[error("GraphQL request failed: {status_text}\n{body}")]
    Transport { status_text: String, body: String },

    #[error("GraphQL errors: {0}")]
    GraphQLExecution(String),

    #[error("Failed to execute GraphQL query: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to execute GraphQL query: invalid header name: {0}")]
    HeaderName(#[from] InvalidHeaderName),

    #[error("Failed to execute GraphQL query: invalid header value: {0}")]
    HeaderValue(#[from] InvalidHeaderValue),

    #[error("Failed to execute GraphQL query: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<WithErrors<Document>> for ForwardError {
    fn from(errors: WithErrors<Document>) -> Self {
        ForwardError::QuerySyntax(SafeWithErrors(&errors).to_string())
    }
}

/// The reason phrase of an HTTP status, falling back to the numeric code
pub(crate) fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or(status.as_str())
        .to_string()
}

/// An MCP protocol error
pub type McpError = rmcp::model::ErrorData;
