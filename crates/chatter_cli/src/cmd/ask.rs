use std::io::Write;

use chatter_consumer::{CancellationToken, RelayClient, Session};
use chatter_protocol::ConversationId;
use tracing::{debug, warn};

use crate::{config::Config, error::Result, render};

#[derive(Debug, clap::Args)]
pub(crate) struct Ask {
    /// The message to send.
    #[arg(required = true)]
    message: String,

    /// Stream progress steps while the answer is produced.
    #[arg(short, long)]
    stream: bool,

    /// Continue an existing conversation instead of starting a new one.
    #[arg(long, value_name = "ID")]
    conversation: Option<String>,

    /// Relay to talk to, overrides the configured relay URL.
    #[arg(long, value_name = "URL")]
    relay_url: Option<String>,
}

impl Ask {
    pub(crate) async fn run(self, config: &Config, out: &mut impl Write) -> Result<()> {
        let relay_url = self
            .relay_url
            .unwrap_or_else(|| config.client.relay_url.clone());
        debug!(relay = %relay_url, stream = self.stream, "Asking relay.");

        let mut session = Session::new(RelayClient::new(relay_url));
        if let Some(max) = config.client.max_frame_bytes {
            session = session.with_max_frame_bytes(max);
        }
        if let Some(id) = self.conversation {
            session = session.with_conversation(ConversationId::new(id));
        }

        let cancel = CancellationToken::new();
        let abort = cancel.clone();
        let signal = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                abort.cancel();
            }
        });

        let result = session
            .submit(&self.message, self.stream, &cancel, |step, message| {
                if let Err(error) = writeln!(out, "[{step}] {message}") {
                    warn!(%error, "Unable to print step.");
                }
            })
            .await
            .map(|exchange| {
                debug!(kind = exchange.response.kind(), "Received response.");
                render::response(&exchange.response)
            });
        signal.abort();

        let rendered = result?;
        writeln!(out, "{rendered}")?;

        if let Some(conversation) = session.conversation() {
            writeln!(out, "\nconversation: {conversation}")?;
        }

        Ok(())
    }
}
