//! Line-delimited JSON transport to the execution gateway.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use canvas_studio_core::errors::Result;
use canvas_studio_core::gateway::protocol::{decode_reply, encode_request};
use canvas_studio_core::gateway::{GatewayClient, GatewayReply, GatewayRequest, ReplySender};

use crate::error::ListenerResult;

/// Writes one encoded request per line. A reader task turns every reply line
/// into a [`GatewayReply`] on the reply channel.
pub struct TcpGatewayClient {
    writer: Mutex<OwnedWriteHalf>,
    reader: JoinHandle<()>,
}

impl TcpGatewayClient {
    pub async fn connect(addr: &str, replies: ReplySender) -> ListenerResult<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        tracing::info!("Connected to gateway at {}", addr);
        let (read, write) = stream.into_split();
        Ok(Self {
            writer: Mutex::new(write),
            reader: tokio::spawn(read_replies(read, replies)),
        })
    }
}

impl Drop for TcpGatewayClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl GatewayClient for TcpGatewayClient {
    async fn submit(&self, request: &GatewayRequest) -> Result<()> {
        let mut line = encode_request(request)?;
        line.push('\n');
        tracing::debug!("Gateway <- request {}", request.id);

        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

async fn read_replies(read: OwnedReadHalf, replies: ReplySender) {
    let mut lines = BufReader::new(read).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                let reply = decode_reply(&line);
                tracing::debug!("Gateway -> reply (success={})", reply.success);
                if replies.send(reply).is_err() {
                    break;
                }
            }
            Ok(None) => {
                tracing::warn!("Gateway closed the connection");
                break;
            }
            Err(e) => {
                tracing::error!("Gateway read failed: {}", e);
                let _ = replies.send(GatewayReply::failure_message(format!(
                    "Gateway read failed: {}",
                    e
                )));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_studio_core::gateway::{reply_channel, GatewayOperation};
    use canvas_studio_core::ModelTarget;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_request_and_reply_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read, mut write) = socket.into_split();
            let mut lines = BufReader::new(read).lines();
            let request = lines.next_line().await.unwrap().unwrap();
            write
                .write_all(b"{\"success\":false,\"reply\":[\"Block1 is locked\"]}\n")
                .await
                .unwrap();
            request
        });

        let (reply_tx, mut reply_rx) = reply_channel();
        let client = TcpGatewayClient::connect(&addr, reply_tx).await.unwrap();
        let request = GatewayRequest {
            id: 1,
            load: Some(ModelTarget::new("ModelA", "base")),
            operation: GatewayOperation::Revert,
        };
        client.submit(&request).await.unwrap();

        let sent: Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(sent["action"], json!("steps"));

        let reply = reply_rx.recv().await.unwrap();
        assert_eq!(
            reply,
            GatewayReply::failure(vec!["Block1 is locked".to_string()])
        );
    }

    #[tokio::test]
    async fn test_closed_connection_drops_reply_channel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let (reply_tx, mut reply_rx) = reply_channel();
        let _client = TcpGatewayClient::connect(&addr, reply_tx).await.unwrap();
        server.await.unwrap();

        assert!(reply_rx.recv().await.is_none());
    }
}
