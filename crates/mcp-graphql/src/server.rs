use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use bon::bon;
use reqwest::header::HeaderMap;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::{StreamableHttpServerConfig, StreamableHttpService};
use rmcp::{ServiceExt as _, transport::stdio};
use serde::Deserialize;
use tracing::{error, info};
use url::Url;

use crate::errors::ServerError;
use crate::schema_source::SchemaSource;

mod running;

use running::Running;

/// An MCP server for a single GraphQL endpoint
pub struct Server {
    transport: Transport,
    name: String,
    endpoint: Url,
    headers: HeaderMap,
    allow_mutations: bool,
    schema_source: SchemaSource,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transport {
    /// Use standard IO for server <> client communication
    #[default]
    Stdio,

    /// Host the MCP server on the configuration, using streamable HTTP messages.
    StreamableHttp {
        /// The IP address to bind to
        #[serde(default = "Transport::default_address")]
        address: IpAddr,

        /// The port to bind to
        #[serde(default = "Transport::default_port")]
        port: u16,

        /// Enable stateful mode for session management
        #[serde(default = "Transport::default_stateful_mode")]
        stateful_mode: bool,
    },
}

impl Transport {
    fn default_address() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    fn default_port() -> u16 {
        8000
    }

    fn default_stateful_mode() -> bool {
        true
    }
}

#[bon]
impl Server {
    #[builder]
    pub fn new(
        #[builder(default)] transport: Transport,
        #[builder(into)] name: String,
        endpoint: Url,
        #[builder(default)] headers: HeaderMap,
        #[builder(default)] allow_mutations: bool,
        #[builder(default)] schema_source: SchemaSource,
    ) -> Self {
        Self {
            transport,
            name,
            endpoint,
            headers,
            allow_mutations,
            schema_source,
        }
    }

    /// Serve MCP requests until the transport closes or the process is asked to stop
    pub async fn start(self) -> Result<(), ServerError> {
        let client = reqwest::Client::builder().build()?;
        let running = Running::new(
            client,
            self.name,
            self.endpoint,
            self.headers,
            self.allow_mutations,
            self.schema_source,
        );

        match self.transport {
            Transport::StreamableHttp {
                address,
                port,
                stateful_mode,
            } => {
                info!(port = ?port, address = ?address, "Starting MCP server in Streamable HTTP mode");
                let listen_address = SocketAddr::new(address, port);
                let service = StreamableHttpService::new(
                    move || Ok(running.clone()),
                    LocalSessionManager::default().into(),
                    StreamableHttpServerConfig {
                        stateful_mode,
                        ..Default::default()
                    },
                );
                let router = axum::Router::new().nest_service("/mcp", service);

                let tcp_listener = tokio::net::TcpListener::bind(listen_address).await?;
                axum::serve(tcp_listener, router)
                    .with_graceful_shutdown(shutdown_signal())
                    .await?;
            }
            Transport::Stdio => {
                info!("Starting MCP server in stdio mode");
                let service = running
                    .serve(stdio())
                    .await
                    .inspect_err(|e| {
                        error!("serving error: {:?}", e);
                    })
                    .map_err(Box::new)?;
                service.waiting().await?;
            }
        }

        Ok(())
    }
}

#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
