//! Live introspection of a GraphQL endpoint

use cynic::{GraphQlResponse, QueryBuilder as _};
use cynic_introspection::query::IntrospectionQuery;
use cynic_introspection::Schema;
use reqwest::header::HeaderMap;
use tracing::debug;
use url::Url;

use crate::errors::{SchemaFetchError, status_text};

pub(crate) mod tools;
pub mod type_filter;

/// Run the standard introspection query against an endpoint and build a schema from the result.
///
/// The configured headers are sent along with the request. Nothing is cached, so every call
/// results in exactly one request.
#[tracing::instrument(skip(client, headers))]
pub async fn introspect(
    client: &reqwest::Client,
    endpoint: &Url,
    headers: &HeaderMap,
) -> Result<Schema, SchemaFetchError> {
    let operation = IntrospectionQuery::build(());

    debug!("Sending introspection query");
    let response = client
        .post(endpoint.clone())
        .headers(headers.clone())
        .json(&operation)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SchemaFetchError::Introspection(status_text(status)));
    }

    let response: GraphQlResponse<IntrospectionQuery> = response.json().await?;
    let Some(data) = response.data else {
        return Err(SchemaFetchError::MissingData(
            response
                .errors
                .unwrap_or_default()
                .into_iter()
                .map(|error| error.message)
                .collect(),
        ));
    };

    Ok(data.into_schema()?)
}

/// Introspect an endpoint and print the result as SDL
pub async fn introspect_sdl(
    client: &reqwest::Client,
    endpoint: &Url,
    headers: &HeaderMap,
) -> Result<String, SchemaFetchError> {
    introspect(client, endpoint, headers)
        .await
        .map(|schema| schema.to_sdl())
}
