use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::controller::{Controller, switch_name};
use crate::error::InstallError;
use crate::protocol::{ControllerMessage, FlowInstaller, FlowMod, FlowRule, SwitchMessage};

/// Installer backed by a session's outgoing queue. Never blocks; fails once
/// the session's writer has gone away.
pub struct ChannelInstaller {
    tx: mpsc::UnboundedSender<ControllerMessage>,
}

impl FlowInstaller for ChannelInstaller {
    fn install_flow(&mut self, rule: &FlowRule) -> Result<(), InstallError> {
        self.tx
            .send(ControllerMessage::FlowMod(FlowMod::from(rule)))
            .map_err(|_| InstallError::ChannelClosed)
    }
}

/// Accepts switch connections speaking newline-delimited JSON.
pub struct ChannelServer {
    listener: TcpListener,
    controller: Arc<Controller>,
}

impl ChannelServer {
    pub async fn bind(addr: impl ToSocketAddrs, controller: Arc<Controller>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .context("failed to bind switch channel")?;
        Ok(Self { listener, controller })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("Switch channel listening on {}", self.local_addr()?);

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("Switch connection from {}", addr);
                    let controller = self.controller.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_switch(stream, controller).await {
                            error!("Error handling switch {}: {:#}", addr, e);
                        }
                        debug!("Switch {} disconnected", addr);
                    });
                }
                Err(e) => {
                    error!("Failed to accept switch connection: {}", e);
                }
            }
        }
    }
}

async fn handle_switch(stream: TcpStream, controller: Arc<Controller>) -> anyhow::Result<()> {
    let (reader, writer) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_messages(writer, rx));

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let reply = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => match serde_json::from_str::<SwitchMessage>(line.trim()) {
                Ok(message) => process_message(message, &controller, &tx),
                Err(e) => Some(ControllerMessage::Error {
                    message: format!("Invalid message: {}", e),
                }),
            },
            Err(e) => Some(ControllerMessage::Error {
                message: format!("Message is not UTF-8: {}", e),
            }),
        };

        if let Some(reply) = reply {
            if tx.send(reply).is_err() {
                break;
            }
        }
    }

    drop(tx);
    writer_task.await.context("switch writer task panicked")?
}

fn process_message(
    message: SwitchMessage,
    controller: &Controller,
    tx: &mpsc::UnboundedSender<ControllerMessage>,
) -> Option<ControllerMessage> {
    match message {
        SwitchMessage::Features { datapath_id } => {
            let mut installer = ChannelInstaller { tx: tx.clone() };
            match controller.on_switch_join(datapath_id, &mut installer) {
                Ok(()) => None,
                Err(e) => {
                    warn!("Join of {} failed: {}", switch_name(datapath_id), e);
                    Some(ControllerMessage::Error {
                        message: e.to_string(),
                    })
                }
            }
        }
        SwitchMessage::EchoRequest { xid } => Some(ControllerMessage::EchoReply { xid }),
        SwitchMessage::RoutingTable { switch } => {
            let routes = controller.routes_for(&switch).summaries();
            Some(ControllerMessage::RoutingTable { switch, routes })
        }
    }
}

async fn write_messages(
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<ControllerMessage>,
) -> anyhow::Result<()> {
    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    writer.shutdown().await?;
    Ok(())
}
