use mcp_graphql::server::Transport;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use url::Url;

use super::logging::Logging;

/// Configuration for the MCP server
#[derive(Debug, Deserialize)]
pub struct Config {
    /// The name advertised to MCP clients
    #[serde(default = "defaults::name", deserialize_with = "parsers::text")]
    pub name: String,

    /// The target GraphQL endpoint
    #[serde(default = "defaults::endpoint")]
    pub endpoint: Url,

    /// Whether `query-graphql` may run mutation operations
    #[serde(default)]
    pub allow_mutations: bool,

    /// Headers to include in all GraphQL requests. Accepts a map or the same map as JSON text.
    #[serde(default, deserialize_with = "parsers::header_map")]
    pub headers: HeaderMap,

    /// Where the schema comes from: an http(s) URL, a file path, or live introspection when unset
    #[serde(default, deserialize_with = "parsers::optional_text")]
    pub schema: Option<String>,

    #[serde(default)]
    pub logging: Logging,

    /// The type of server transport to use
    #[serde(default)]
    pub transport: Transport,
}

mod defaults {
    use url::Url;

    pub(super) fn name() -> String {
        "mcp-graphql".to_string()
    }

    pub(super) fn endpoint() -> Url {
        // SAFETY: This is a constant that always parses, checked by
        // [test::default_endpoint_parses_correctly]
        #[allow(clippy::unwrap_used)]
        Url::parse("http://localhost:4000/graphql").unwrap()
    }

}

mod parsers {
    use std::collections::BTreeMap;

    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
    use serde::Deserializer;

    fn parse_header(key: &str, value: &str) -> Result<(HeaderName, HeaderValue), String> {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| e.to_string())?;
        let value = HeaderValue::from_str(value).map_err(|e| e.to_string())?;
        Ok((name, value))
    }

    /// Accept any scalar as text, so a name or path made of digits is not rejected as a number
    pub(super) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TextVisitor;
        impl serde::de::Visitor<'_> for TextVisitor {
            type Value = String;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(v.to_string())
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(v.to_string())
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(v.to_string())
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(v.to_string())
            }

            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(v.to_string())
            }
        }

        deserializer.deserialize_any(TextVisitor)
    }

    pub(super) fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OptionalTextVisitor;
        impl<'de> serde::de::Visitor<'de> for OptionalTextVisitor {
            type Value = Option<String>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("an optional string")
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(None)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(None)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                text(deserializer).map(Some)
            }
        }

        deserializer.deserialize_option(OptionalTextVisitor)
    }

    pub(super) fn header_map<'de, D>(deserializer: D) -> Result<HeaderMap, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HeaderMapVisitor;
        impl<'de> serde::de::Visitor<'de> for HeaderMapVisitor {
            type Value = HeaderMap;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a map of header string keys and values, or that map as JSON")
            }

            // Environment variables carry the headers as JSON text
            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v.trim().is_empty() {
                    return Ok(HeaderMap::new());
                }

                let entries: BTreeMap<String, String> = serde_json::from_str(v)
                    .map_err(|e| E::custom(format!("headers are not a JSON object of strings: {e}")))?;

                entries
                    .iter()
                    .map(|(key, value)| parse_header(key, value))
                    .collect::<Result<HeaderMap, _>>()
                    .map_err(E::custom)
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut parsed = HeaderMap::with_capacity(map.size_hint().unwrap_or(0));

                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    let (name, value) =
                        parse_header(&key, &value).map_err(serde::de::Error::custom)?;
                    parsed.insert(name, value);
                }

                Ok(parsed)
            }
        }

        deserializer.deserialize_any(HeaderMapVisitor)
    }
}
