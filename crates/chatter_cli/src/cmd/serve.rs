use chatter_relay::AppState;
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    config::{Config, Environment},
    error::Result,
};

#[derive(Debug, clap::Args)]
pub(crate) struct Serve {
    /// Port to listen on, overrides the configured port.
    #[arg(short, long)]
    port: Option<u16>,
}

impl Serve {
    pub(crate) async fn run(self, mut config: Config) -> Result<()> {
        if let Some(port) = self.port {
            config.server.port = port;
        }

        let upstream = config.upstream.client()?;
        let environment = config.server.environment;
        info!(
            agent = upstream.agent_id(),
            ?environment,
            cors_origin = %config.server.cors_origin,
            "Configuring relay."
        );

        let state = AppState::new(upstream)
            .with_user_context(config.user_context)
            .with_exposed_errors(environment != Environment::Production);
        let router = chatter_relay::router(state, &config.server.cors_origin)?;

        let listener = TcpListener::bind((config.server.address.as_str(), config.server.port)).await?;
        chatter_relay::serve(listener, router).await?;

        Ok(())
    }
}
