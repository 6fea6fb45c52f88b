use std::path::PathBuf;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use mcp_graphql::schema_source::SchemaSource;
use mcp_graphql::server::Server;
use runtime::logging::{Logging, LoggingLayerBuilder};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod runtime;

/// Clap styling
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Arguments to the MCP server
#[derive(Debug, clap::Parser)]
#[command(
    version,
    styles = STYLES,
    about = "mcp-graphql - explore and query a GraphQL endpoint from an AI agent",
)]
struct Args {
    /// Path to a YAML config file. Without one, configuration is read from environment variables.
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config: runtime::Config = match Args::parse().config {
        Some(config_path) => runtime::read_config(config_path)?,
        None => runtime::read_config_from_env()?,
    };

    let (logging_layer, _guard) = LoggingLayerBuilder::new().build(&config.logging)?;
    tracing_subscriber::registry()
        .with(logging_layer)
        .with(Logging::env_filter(&config.logging)?)
        .init();

    info!(
        "Started graphql mcp server {} for endpoint: {}",
        config.name, config.endpoint
    );

    let schema_source = SchemaSource::from_setting(config.schema.as_deref())?;
    if config.allow_mutations {
        warn!("Mutations are enabled for {}", config.endpoint);
    }

    Ok(Server::builder()
        .transport(config.transport)
        .name(config.name)
        .endpoint(config.endpoint)
        .headers(config.headers)
        .allow_mutations(config.allow_mutations)
        .schema_source(schema_source)
        .build()
        .start()
        .await?)
}
