//! Where the SDL for the `graphql-schema` resource comes from

use std::path::PathBuf;

use reqwest::header::HeaderMap;
use tracing::debug;
use url::Url;

use crate::errors::{SchemaFetchError, status_text};
use crate::introspection::introspect_sdl;

/// Source for the GraphQL schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SchemaSource {
    /// Introspect the GraphQL endpoint itself
    #[default]
    Introspect,

    /// A pre-built SDL document served over HTTP
    Url(Url),

    /// A local SDL file
    File(PathBuf),
}

impl SchemaSource {
    /// Choose a source from the optional `schema` setting.
    ///
    /// Values starting with `http://` or `https://` are fetched over HTTP, anything else is a
    /// path on the local file system. A missing setting means live introspection.
    pub fn from_setting(schema: Option<&str>) -> Result<Self, url::ParseError> {
        match schema {
            None => Ok(SchemaSource::Introspect),
            Some(value) if value.starts_with("http://") || value.starts_with("https://") => {
                Url::parse(value).map(SchemaSource::Url)
            }
            Some(path) => Ok(SchemaSource::File(PathBuf::from(path))),
        }
    }

    /// Resolve the schema to SDL text.
    ///
    /// Every call performs exactly one HTTP request or one file read.
    #[tracing::instrument(skip(self, client, headers), fields(source = ?self))]
    pub async fn resolve(
        &self,
        client: &reqwest::Client,
        endpoint: &Url,
        headers: &HeaderMap,
    ) -> Result<String, SchemaFetchError> {
        match self {
            SchemaSource::Url(url) => {
                debug!("Fetching schema from {url}");
                let response = client.get(url.clone()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(SchemaFetchError::RemoteSchema(status_text(status)));
                }
                Ok(response.text().await?)
            }
            SchemaSource::File(path) => {
                debug!("Reading schema from {}", path.display());
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| SchemaFetchError::ReadFile {
                        path: path.clone(),
                        source,
                    })
            }
            SchemaSource::Introspect => introspect_sdl(client, endpoint, headers).await,
        }
    }
}
