//! WebSocket handler: the transport between clients and their game.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws?username=<name>`
//! 2. The connection joins the waiting room and receives `waiting` frames
//!    as the room fills
//! 3. Once seated, every publication of the game is forwarded as a
//!    `gameplay_data` frame, and client frames are routed to the game
//! 4. A disconnect while seated ends the game for everyone
//!
//! # Frames
//!
//! ```text
//! server -> {"type":"waiting","content":{"players":["alice","bob"]}}
//! server -> {"type":"gameplay_data","content":{"game_id":"..","seq":4,"state":{"phase":"BIDDING",..}}}
//! client -> {"type":"bid","bid":2}
//! client -> {"type":"play_card","card_index":0,"tigress":"pirate"}
//! client -> {"type":"ack","seq":4}
//! ```
//!
//! Every publication must be acked before the game moves past a gated
//! phase. An ack without `seq` acks the last publication this connection
//! forwarded.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use log::{debug, error, info, warn};
use pirate_king::{
    GameError, Intent, PlayerIntent, Publication,
    entities::{Bid, TigressPlay, Username},
};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::{AppState, Seat, Ticket};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    username: String,
}

/// Client messages received via WebSocket
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Bid {
        bid: Bid,
    },
    PlayCard {
        card_index: usize,
        #[serde(default)]
        tigress: Option<TigressPlay>,
    },
    Ack {
        #[serde(default)]
        seq: Option<u64>,
    },
}

impl ClientMessage {
    /// The game intent for this frame. `last_seen` stands in for a missing
    /// ack sequence number.
    fn into_intent(self, last_seen: Option<u64>) -> Intent {
        match self {
            Self::Bid { bid } => Intent::Bid { bid },
            Self::PlayCard {
                card_index,
                tigress,
            } => Intent::PlayCard {
                card_index,
                tigress,
            },
            Self::Ack { seq } => Intent::Ack {
                seq: seq.or(last_seen),
            },
        }
    }
}

/// Messages sent to the client
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
enum ServerMessage<'a> {
    Waiting { players: &'a [Username] },
    GameplayData(&'a Publication),
}

type WsSender = SplitSink<WebSocket, Message>;
type WsReceiver = SplitStream<WebSocket>;

/// Upgrade HTTP connection to WebSocket and seat the client.
///
/// # Query Parameters
///
/// - `username`: Display name, trimmed and truncated
///
/// # Response
///
/// On success, upgrades connection to WebSocket protocol (101 Switching Protocols).
/// A blank username returns `400 Bad Request`.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let username = Username::new(&query.username);
    if username.as_str().is_empty() {
        return (StatusCode::BAD_REQUEST, "username must not be blank").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, username, state))
}

async fn handle_socket(socket: WebSocket, username: Username, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    metrics::websocket_connection_opened();

    let ticket = state.room.join(username.as_str()).await;
    let player = ticket.player.id;
    logging::log_connection_event(username.as_str(), Some(player), "connected");

    match wait_for_seat(&mut sender, &mut receiver, ticket).await {
        Some(seat) => play(sender, receiver, seat).await,
        None => {
            if state.room.leave(player) {
                logging::log_connection_event(username.as_str(), Some(player), "left_room");
            }
        }
    }

    metrics::websocket_connection_closed();
    info!("WebSocket disconnected: {username} ({player})");
}

async fn send_message(sender: &mut WsSender, message: &ServerMessage<'_>) -> Result<(), ()> {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return Ok(());
        }
    };
    sender
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| debug!("WebSocket send failed: {e}"))?;
    metrics::websocket_messages_sent();
    Ok(())
}

/// Keeps the client informed of the waiting room until it is seated.
/// Returns `None` if the connection closed first.
async fn wait_for_seat(
    sender: &mut WsSender,
    receiver: &mut WsReceiver,
    ticket: Ticket,
) -> Option<Seat> {
    let Ticket {
        player,
        waiting,
        mut seat,
        mut roster,
    } = ticket;

    send_message(sender, &ServerMessage::Waiting { players: &waiting })
        .await
        .ok()?;

    loop {
        tokio::select! {
            biased;

            seated = &mut seat => {
                if seated.is_err() {
                    warn!("{} was not seated, closing", player.id);
                }
                return seated.ok();
            }
            Ok(()) = roster.changed() => {
                let players = roster.borrow_and_update().clone();
                send_message(sender, &ServerMessage::Waiting { players: &players })
                    .await
                    .ok()?;
            }
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    metrics::websocket_messages_received();
                    metrics::websocket_messages_dropped("rejected");
                    debug!("{} is not seated yet, dropping {}", player.id, text.as_str());
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return None,
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Relays a seated connection: publications out, intents in.
async fn play(mut sender: WsSender, mut receiver: WsReceiver, seat: Seat) {
    let Seat { player, game } = seat;
    let (seen_tx, seen_rx) = watch::channel(None::<u64>);

    let mut publications = game.subscribe();
    let send_task = tokio::spawn(async move {
        loop {
            let current = publications.borrow_and_update().clone();
            if let Some(publication) = current {
                if send_message(&mut sender, &ServerMessage::GameplayData(&publication))
                    .await
                    .is_err()
                {
                    break;
                }
                seen_tx.send_replace(Some(publication.seq));
                if publication.state.is_terminal() {
                    let _ = sender.close().await;
                    break;
                }
            }
            if publications.changed().await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics::websocket_messages_received();

                let intent = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => message.into_intent(*seen_rx.borrow()),
                    Err(e) => {
                        warn!("Failed to parse client message from {player}: {}", e);
                        metrics::websocket_messages_dropped("unparseable");
                        continue;
                    }
                };

                match game.submit(PlayerIntent::new(player, intent)) {
                    Ok(()) => {}
                    Err(GameError::InboxFull) => {
                        warn!("game {} inbox full, dropped {intent:?} from {player}", game.id());
                        metrics::websocket_messages_dropped("inbox_full");
                    }
                    Err(e) => {
                        debug!("{player}: {intent:?} not submitted: {e}");
                        metrics::websocket_messages_dropped("rejected");
                    }
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!("WebSocket error from {player}: {}", e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();

    let finished = game
        .snapshot()
        .is_some_and(|publication| publication.state.is_terminal());
    if !finished {
        let username = game
            .players()
            .iter()
            .find(|p| p.id == player)
            .map(|p| p.username.to_string())
            .unwrap_or_default();
        logging::log_connection_event(&username, Some(player), "seat_lost");
        game.seat_lost(player);
    }
}
