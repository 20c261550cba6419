use futures_util::sink::SinkExt;
use futures_util::stream::StreamExt;
use log::{debug, error, info, warn};
use std::sync::Arc;
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

use crate::core::adapter::BroadcastOptions;
use crate::core::connection::{ChannelConnection, Connection};
use crate::core::message_types::{ClientMessage, ServerMessage};
use crate::core::packet::{BroadcastFlags, Frame, PacketOptions};
use crate::core::server::NamespaceServer;

// Handle a WebSocket connection
pub async fn handle_ws_client(ws: WebSocket, server: Arc<NamespaceServer>) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    // Generate a unique client ID
    let client_id = Uuid::new_v4().to_string();
    let (connection, mut outbound) = ChannelConnection::channel(client_id.clone());
    let connection = Arc::new(connection);

    // Spawn a task to forward queued frames to the WebSocket
    tokio::task::spawn(async move {
        while let Some(packet) = outbound.recv().await {
            for frame in packet.frames.iter() {
                let message = match frame {
                    Frame::Text(text) => Message::text(text.as_str()),
                    Frame::Binary(bytes) => Message::binary(bytes.clone()),
                };
                if let Err(e) = ws_tx.send(message).await {
                    error!("Failed to send WebSocket message: {}", e);
                    return;
                }
            }
        }
    });

    // Register the client
    if let Err(e) = server.connect(connection.clone()).await {
        error!("Failed to register client {}: {}", client_id, e);
        return;
    }

    reply(
        &connection,
        &ServerMessage::Connected {
            client_id: client_id.clone(),
            namespace: server.name().to_string(),
        },
    );

    // Handle incoming messages
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(msg) => {
                if msg.is_close() {
                    break;
                }
                // Only process text messages
                if let Ok(text) = msg.to_str() {
                    if let Some(response) = process_message(text, &client_id, &server).await {
                        reply(&connection, &response);
                    }
                }
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
        }
    }

    // Client disconnected
    if let Err(e) = server.disconnect(&client_id).await {
        error!("Error disconnecting client {}: {}", client_id, e);
    }
    info!("Current connections: {}", server.connection_count().await);
}

// Queue a direct reply for a single client
fn reply(connection: &ChannelConnection, message: &ServerMessage) {
    match serde_json::to_string(message) {
        Ok(text) => {
            let frames: Arc<[Frame]> = Arc::from(vec![Frame::Text(text)]);
            let opts = PacketOptions::from(BroadcastFlags::default());
            if let Err(e) = connection.packet(frames, &opts) {
                debug!("Failed to reply to {}: {}", connection.id(), e);
            }
        }
        Err(e) => error!("Failed to serialize reply: {}", e),
    }
}

/// Process an incoming client command, returns the reply to send back
pub async fn process_message(
    text: &str,
    client_id: &str,
    server: &NamespaceServer,
) -> Option<ServerMessage> {
    let command = match serde_json::from_str::<ClientMessage>(text) {
        Ok(command) => command,
        Err(e) => {
            warn!("Failed to parse message from {}: {}", client_id, e);
            return Some(ServerMessage::error("invalid_message", e.to_string()));
        }
    };

    let result = match command {
        ClientMessage::Join { room } => server
            .join(client_id, &room)
            .await
            .map(|_| Some(ServerMessage::success(format!("Joined room {}", room)))),
        ClientMessage::Leave { room } => server
            .leave(client_id, &room)
            .await
            .map(|_| Some(ServerMessage::success(format!("Left room {}", room)))),
        ClientMessage::Emit {
            event,
            data,
            rooms,
            include_self,
            volatile,
            compress,
        } => {
            let mut opts = BroadcastOptions {
                rooms,
                ..BroadcastOptions::default()
            }
            .compress(compress);
            if volatile {
                opts = opts.volatile();
            }
            if !include_self {
                opts = opts.except(client_id);
            }
            server.emit(&event, data, &opts).await.map(|_| None)
        }
        ClientMessage::Clients { rooms } => server
            .clients(&rooms)
            .await
            .map(|clients| Some(ServerMessage::Clients { rooms, clients })),
    };

    result.unwrap_or_else(|e| {
        error!("Failed to process command from {}: {}", client_id, e);
        Some(ServerMessage::error("internal_error", e.to_string()))
    })
}
