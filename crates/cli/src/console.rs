//! The read-dispatch-print loop.
//!
//! One line is read, parsed, executed against the gateway and answered before the next
//! line is read. Nothing that goes wrong inside a command ends the session; only `STOP`,
//! end of input, or a failure to read/write the console itself does.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use stockroom_core::Entity;
use stockroom_infra::{CatalogGateway, CatalogStore, GatewayError};

use crate::command::{Command, CommandError, HELP};

/// What the loop does after a line has been handled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Console session bound to a gateway and an output sink.
pub struct Console<S, W> {
    gateway: CatalogGateway<S>,
    out: W,
}

impl<S, W> Console<S, W>
where
    S: CatalogStore,
    W: AsyncWrite + Unpin,
{
    pub fn new(gateway: CatalogGateway<S>, out: W) -> Self {
        Self { gateway, out }
    }

    /// Print the banner, then handle lines from `input` until `STOP` or end of input.
    ///
    /// A line that is not valid UTF-8 is reported and skipped.
    pub async fn run<R>(&mut self, input: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        self.write_line(HELP).await?;
        self.write_line("Type STOP to exit.").await?;

        let mut input = input;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf).await? == 0 {
                tracing::debug!("end of input; stopping");
                break;
            }
            let flow = match std::str::from_utf8(&buf) {
                Ok(line) => self.handle_line(line.trim_end_matches(['\n', '\r'])).await?,
                Err(_) => {
                    tracing::warn!(bytes = buf.len(), "skipping line that is not valid UTF-8");
                    self.write_line(&CommandError::InvalidUtf8.to_string()).await?;
                    Flow::Continue
                }
            };
            if flow == Flow::Stop {
                break;
            }
        }
        self.out.flush().await
    }

    /// Parse and execute a single line.
    pub async fn handle_line(&mut self, line: &str) -> std::io::Result<Flow> {
        match Command::parse(line) {
            Ok(Some(command)) => self.execute(command).await,
            Ok(None) => Ok(Flow::Continue),
            Err(err @ CommandError::Unknown(_)) => {
                self.write_line(&err.to_string()).await?;
                self.write_line(HELP).await?;
                Ok(Flow::Continue)
            }
            Err(err) => {
                self.write_line(&err.to_string()).await?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn execute(&mut self, command: Command) -> std::io::Result<Flow> {
        let message = match command {
            Command::AddStore { name } => self
                .gateway
                .add_store(&name)
                .await
                .map(|store| format!("Store added: {}", store.name())),
            Command::AddProduct { name, price } => self
                .gateway
                .add_product(&name, price)
                .await
                .map(|product| format!("Product added: {product}")),
            Command::ShelveProduct { product, store } => self
                .gateway
                .shelve_product(&product, &store)
                .await
                .map(|store| format!("Product {product} shelved in store {}", store.name())),
            Command::ProductStatistics => self
                .gateway
                .statistics()
                .await
                .map(|report| report.to_string().trim_end().to_string()),
            Command::Catalog => self
                .gateway
                .catalog()
                .await
                .map(|listing| listing.to_string().trim_end().to_string()),
            Command::Stop => return Ok(Flow::Stop),
        };

        match message {
            Ok(text) if text.is_empty() => {}
            Ok(text) => self.write_line(&text).await?,
            Err(err) => {
                if let GatewayError::Storage(source) = &err {
                    tracing::error!(error = %source, "catalog storage failure");
                }
                self.write_line(&err.to_string()).await?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Hand back the gateway and the sink, so the caller can shut the gateway down.
    pub fn into_parts(self) -> (CatalogGateway<S>, W) {
        (self.gateway, self.out)
    }

    async fn write_line(&mut self, text: &str) -> std::io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await
    }
}
