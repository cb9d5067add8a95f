//! Mock WebSocket server for channel lifecycle tests.
//!
//! Accepts connections, records every text message and, once the first text
//! message (the handshake) arrives, plays a fixed script on that connection.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// What the server does after receiving the handshake.
#[derive(Debug, Clone)]
pub enum ServerAction {
    Text(String),
    Binary(Vec<u8>),
    Close,
}

/// A mock WebSocket server for testing.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    messages: Arc<Mutex<Vec<String>>>,
    connections: Arc<Mutex<u32>>,
}

impl MockWsServer {
    /// Start a server that only records and answers pings.
    pub async fn start() -> Self {
        Self::with_script(Vec::new()).await
    }

    /// Start a server that plays `script` on every connection after the handshake.
    pub async fn with_script(script: Vec<ServerAction>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let messages = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(Mutex::new(0));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let messages_clone = messages.clone();
        let connections_clone = connections.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        tokio::spawn(handle_connection(
                            stream,
                            script.clone(),
                            messages_clone.clone(),
                            connections_clone.clone(),
                        ));
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            messages,
            connections,
        }
    }

    /// Get the server's WebSocket URL.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Number of connections accepted so far.
    pub async fn connection_count(&self) -> u32 {
        *self.connections.lock().await
    }

    /// All text messages received, across connections.
    pub async fn received_messages(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(
    stream: TcpStream,
    script: Vec<ServerAction>,
    messages: Arc<Mutex<Vec<String>>>,
    connections: Arc<Mutex<u32>>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };
    *connections.lock().await += 1;

    let (mut write, mut read) = ws_stream.split();
    let mut script_played = false;

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                messages.lock().await.push(text);
                if script_played {
                    continue;
                }
                script_played = true;
                for action in &script {
                    let frame = match action {
                        ServerAction::Text(text) => Message::Text(text.clone()),
                        ServerAction::Binary(data) => Message::Binary(data.clone()),
                        ServerAction::Close => {
                            let _ = write.send(Message::Close(None)).await;
                            return;
                        }
                    };
                    if write.send(frame).await.is_err() {
                        return;
                    }
                }
            }
            Ok(Message::Ping(data)) => {
                let _ = write.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => break,
            Err(_) => break,
            _ => {}
        }
    }
}

/// Poll `check` until it holds or five seconds pass.
pub async fn wait_until<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
