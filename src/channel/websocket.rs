//! WebSocket transport backed by tokio-tungstenite

use futures::{SinkExt, StreamExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use super::transport::{Connector, EventSink, Transport, TransportEvent};

/// Opens one WebSocket connection per attempt
///
/// Each attempt runs on its own task. Must be used from within a Tokio
/// runtime context; [`UpdateChannel`](super::UpdateChannel) enters its
/// runtime before calling [`Connector::open`].
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WsConnector {
    fn open(&self, address: &Url, sink: EventSink) -> Box<dyn Transport> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_socket(address.clone(), sink, shutdown_rx));

        Box::new(WsTransport {
            shutdown: Some(shutdown_tx),
            task,
        })
    }
}

/// A running WebSocket attempt
pub struct WsTransport {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl Transport for WsTransport {
    fn close(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            // Receiver gone means the socket task already finished
            if tx.send(()).is_err() {
                self.task.abort();
            }
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Drive one connection until it fails, closes, or is asked to shut down
async fn run_socket(address: Url, sink: EventSink, mut shutdown: oneshot::Receiver<()>) {
    log::debug!("[WebSocket] Connecting to {}", address);

    let stream = tokio::select! {
        _ = &mut shutdown => return,
        result = connect_async(address.as_str()) => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                sink.emit(TransportEvent::Error(format!("connect failed: {}", e)));
                return;
            }
        },
    };

    sink.emit(TransportEvent::Opened);
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                let _ = write.send(Message::Close(None)).await;
                let _ = write.close().await;
                return;
            }

            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => sink.emit(TransportEvent::Message(text)),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => sink.emit(TransportEvent::Message(text)),
                    Err(_) => log::warn!("[WebSocket] Dropping non UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    if let Some(frame) = frame {
                        log::debug!("[WebSocket] Close frame: {} {}", frame.code, frame.reason);
                    }
                    sink.emit(TransportEvent::Closed);
                    return;
                }
                // Pings are answered by tungstenite itself
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    sink.emit(TransportEvent::Error(e.to_string()));
                    return;
                }
                None => {
                    sink.emit(TransportEvent::Closed);
                    return;
                }
            },
        }
    }
}
