//! Per-connection session: turns client messages into runtime intents and
//! reports failures back to the sender only.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::protocol::events::Joined;
use crate::protocol::OutboundEvent;
use crate::services::runtime::GameRuntime;
use crate::ws::hub::{ConnectionHub, EventSink};
use crate::ws::protocol::{ClientMsg, PROTOCOL_VERSION};

pub struct Session {
    connection_id: String,
    runtime: Arc<GameRuntime>,
    hub: Arc<ConnectionHub>,
    hello_done: bool,
    /// `(room_id, player_id)` once joined.
    seat: Option<(String, String)>,
}

impl Session {
    /// Register a fresh connection. The receiver yields everything the
    /// runtime sends to it.
    pub fn open(
        runtime: Arc<GameRuntime>,
        hub: Arc<ConnectionHub>,
    ) -> (Self, UnboundedReceiver<OutboundEvent>) {
        let connection_id = Uuid::new_v4().to_string();
        let rx = hub.register(&connection_id);
        info!(connection_id = %connection_id, "Session opened");
        let session = Self {
            connection_id,
            runtime,
            hub,
            hello_done: false,
            seat: None,
        };
        (session, rx)
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn seat(&self) -> Option<(&str, &str)> {
        self.seat
            .as_ref()
            .map(|(room, player)| (room.as_str(), player.as_str()))
    }

    /// Handle one raw text frame.
    pub async fn handle_text(&mut self, text: &str) {
        match serde_json::from_str::<ClientMsg>(text) {
            Ok(msg) => self.handle(msg).await,
            Err(e) => {
                warn!(connection_id = %self.connection_id, error = %e, "Malformed client message");
                self.reply_error(&AppError::validation(
                    ErrorCode::ValidationError,
                    format!("malformed message: {e}"),
                ));
            }
        }
    }

    pub async fn handle(&mut self, msg: ClientMsg) {
        let intent = msg.name();
        debug!(connection_id = %self.connection_id, intent, "Client message");
        if let Err(err) = self.route(msg).await {
            self.reply_error(&err);
        }
    }

    /// Connection dropped: start the grace period and forget the channel.
    pub fn close(mut self) {
        if let Some((room_id, player_id)) = self.seat.take() {
            if let Err(e) = self.runtime.disconnect(&room_id, &self.connection_id) {
                debug!(room_id = %room_id, player_id = %player_id, error = %e, "Disconnect after room closed");
            }
        }
        self.hub.unregister(&self.connection_id);
        info!(connection_id = %self.connection_id, "Session closed");
    }

    async fn route(&mut self, msg: ClientMsg) -> Result<(), AppError> {
        if !self.hello_done && !matches!(msg, ClientMsg::Hello { .. }) {
            return Err(AppError::validation(
                ErrorCode::ValidationError,
                "hello required before any other message",
            ));
        }

        let runtime = Arc::clone(&self.runtime);
        match msg {
            ClientMsg::Hello { protocol } => {
                if protocol != PROTOCOL_VERSION {
                    return Err(AppError::validation(
                        ErrorCode::ValidationError,
                        format!("unsupported protocol {protocol}; expected {PROTOCOL_VERSION}"),
                    ));
                }
                self.hello_done = true;
            }
            ClientMsg::ListRooms => self.reply(&OutboundEvent::RoomList(runtime.list_rooms())),
            ClientMsg::CreateRoom {
                name,
                player_id,
                player_name,
                points_to_win,
                team_method,
            } => {
                self.ensure_unseated()?;
                let summary = runtime.create_room(&name, &player_id, points_to_win, team_method)?;
                let joined =
                    runtime.join_room(&summary.id, &player_id, &player_name, &self.connection_id)?;
                self.seated(joined);
            }
            ClientMsg::JoinRoom {
                room_id,
                player_id,
                name,
            } => {
                self.ensure_unseated()?;
                let joined = runtime.join_room(&room_id, &player_id, &name, &self.connection_id)?;
                self.seated(joined);
            }
            ClientMsg::Reconnect { room_id, token } => {
                self.ensure_unseated()?;
                let joined = runtime
                    .reconnect(&room_id, &token, &self.connection_id)
                    .await?;
                self.seated(joined);
            }
            ClientMsg::LeaveRoom => {
                let (room_id, player_id) = self.require_seat()?;
                runtime.leave_room(&room_id, &player_id)?;
                self.seat = None;
            }
            ClientMsg::ToggleReady => {
                let (room_id, player_id) = self.require_seat()?;
                runtime.toggle_ready(&room_id, &player_id)?;
            }
            ClientMsg::ChangeTeam { target_id, team } => {
                let (room_id, player_id) = self.require_seat()?;
                runtime.change_team(&room_id, &player_id, &target_id, team)?;
            }
            ClientMsg::StartGame => {
                let (room_id, player_id) = self.require_seat()?;
                runtime.start_game(&room_id, &player_id)?;
            }
            ClientMsg::DeclareBid {
                trump_type,
                number_of_pairs,
            } => {
                let (room_id, player_id) = self.require_seat()?;
                runtime.declare_bid(&room_id, &player_id, trump_type, number_of_pairs)?;
            }
            ClientMsg::PassBid => {
                let (room_id, player_id) = self.require_seat()?;
                runtime.pass_bid(&room_id, &player_id)?;
            }
            ClientMsg::SelectNegri { card } => {
                let (room_id, player_id) = self.require_seat()?;
                runtime.select_negri(&room_id, &player_id, card)?;
            }
            ClientMsg::PlayCard { card } => {
                let (room_id, player_id) = self.require_seat()?;
                runtime.play_card(&room_id, &player_id, card)?;
            }
            ClientMsg::SelectBaseSuit { suit } => {
                let (room_id, player_id) = self.require_seat()?;
                runtime.select_base_suit(&room_id, &player_id, suit)?;
            }
            ClientMsg::DeclareOpen => {
                let (room_id, player_id) = self.require_seat()?;
                runtime.declare_open(&room_id, &player_id)?;
            }
            ClientMsg::RevealBroken => {
                let (room_id, player_id) = self.require_seat()?;
                runtime.reveal_broken(&room_id, &player_id)?;
            }
            ClientMsg::ReportViolation {
                violator_id,
                violation_type,
            } => {
                let (room_id, player_id) = self.require_seat()?;
                runtime.report_violation(&room_id, &player_id, &violator_id, violation_type)?;
            }
        }
        Ok(())
    }

    fn seated(&mut self, joined: Joined) {
        self.seat = Some((joined.room_id.clone(), joined.player_id.clone()));
        self.reply(&OutboundEvent::Joined(joined));
    }

    fn ensure_unseated(&self) -> Result<(), AppError> {
        match &self.seat {
            Some((room_id, _)) => Err(AppError::conflict(
                ErrorCode::AlreadyInRoom,
                format!("connection already joined room {room_id}"),
            )),
            None => Ok(()),
        }
    }

    fn require_seat(&self) -> Result<(String, String), AppError> {
        self.seat
            .clone()
            .ok_or_else(|| AppError::not_found(ErrorCode::PlayerNotFound, "join a room first"))
    }

    fn reply(&self, event: &OutboundEvent) {
        self.hub.send_to(&self.connection_id, event);
    }

    fn reply_error(&self, err: &AppError) {
        self.reply(&err.to_event());
    }
}
