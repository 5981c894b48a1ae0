use std::sync::{
    RwLock,
    atomic::{AtomicU64, Ordering},
};

use {
    async_trait::async_trait,
    futures::{SinkExt, StreamExt},
    krypta_protocol::{MAX_PAYLOAD_BYTES, Request, ResponseFrame, TransactionFrame},
    serde_json::Value,
    tokio::{net::TcpStream, sync::Mutex},
    tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message},
    tracing::{debug, info, warn},
};

use crate::{error::TransportError, transport::Transport};

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport. One transaction is in flight at a time; frames for
/// other transaction numbers (server pushes) are skipped.
pub struct WsTransport {
    stream: Mutex<Stream>,
    next_nr: AtomicU64,
    token: RwLock<Option<String>>,
}

impl WsTransport {
    /// Connect to `url` (`ws://` or `wss://`).
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        info!(url = %url, "connecting to backend");
        let (stream, _response) = connect_async(url).await?;
        Ok(Self {
            stream: Mutex::new(stream),
            next_nr: AtomicU64::new(1),
            token: RwLock::new(None),
        })
    }

    /// Close the connection gracefully.
    pub async fn close(&self) -> Result<(), TransportError> {
        self.stream.lock().await.close(None).await?;
        Ok(())
    }

    fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_multiple(&self, requests: Vec<Request>) -> Result<Vec<Value>, TransportError> {
        let transaction_nr = self.next_nr.fetch_add(1, Ordering::Relaxed);
        let expected = requests.len();
        let frame = TransactionFrame {
            transaction_nr,
            requests,
            token: self.token(),
        };
        let json = serde_json::to_string(&frame)?;
        if json.len() > MAX_PAYLOAD_BYTES {
            return Err(TransportError::Protocol(format!(
                "transaction of {} bytes exceeds the {MAX_PAYLOAD_BYTES} byte limit",
                json.len()
            )));
        }

        let mut stream = self.stream.lock().await;
        stream.send(Message::Text(json.into())).await?;
        debug!(transaction_nr, requests = expected, "sent transaction");

        let response = loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    let frame: ResponseFrame = match serde_json::from_str(text.as_str()) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!(error = %e, "ignoring unparseable frame");
                            continue;
                        },
                    };
                    if frame.transaction_nr == transaction_nr {
                        break frame;
                    }
                    debug!(
                        got = frame.transaction_nr,
                        transaction_nr, "skipping frame for another transaction"
                    );
                },
                Some(Ok(Message::Ping(data))) => {
                    stream.send(Message::Pong(data)).await?;
                },
                Some(Ok(Message::Close(_))) | None => return Err(TransportError::Closed),
                Some(Ok(_)) => {}, // Ignore binary, pong, etc.
                Some(Err(e)) => return Err(e.into()),
            }
        };

        if let Some(error) = response.error {
            debug!(transaction_nr, code = %error.code, "transaction rejected");
            return Err(TransportError::Server(error));
        }

        if response.responses.len() != expected {
            return Err(TransportError::Protocol(format!(
                "expected {expected} responses, got {}",
                response.responses.len()
            )));
        }

        Ok(response.responses.into_iter().map(|r| r.payload).collect())
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
    }
}
