//! Socket.IO event relay.
//!
//! Bridges transport events to engine calls and fans results back out.
//! Each socket authenticates during the namespace handshake, joins its
//! personal `user:{id}` room (the invite side-channel address) and gets its
//! game handlers registered. Session groups are `game:{code}` rooms.
//!
//! Fan-out discipline: lightweight events (`player-joined`, `update`,
//! `round-start`, `round-end`, `ended`, `player-left`) go to the whole room
//! and carry only public data; full `state` pushes are computed per
//! recipient through the sanitizer so no socket ever receives another
//! player's private slot.

use std::sync::Arc;
use std::time::Duration;

use socketioxide::extract::{AckSender, Data, SocketRef, TryData};
use socketioxide::SocketIo;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use parlor_engine::{view_for, GameEngine, PlayerProfile, Session};

use crate::auth::{AuthBackend, AuthedUser, HandshakeAuth};
use crate::directory::ClientDirectory;
use crate::events::{
    Ack, ActionRequest, CreateRequest, ErrorBody, GameEnded, InviteRequest, JoinRequest,
    LeaveRequest, PlayerJoined, PlayerLeft, RoundEnd, RoundStart, StartRequest, StateUpdate,
};

/// Shared handles every socket handler needs.
pub struct RelayContext {
    pub engine: Arc<GameEngine>,
    pub directory: Arc<ClientDirectory>,
    pub auth: Arc<dyn AuthBackend>,
    pub io: SocketIo,
    /// How long a finished session stays readable after the `ended`
    /// broadcast.
    pub ended_grace: Duration,
}

fn session_room(code: &str) -> String {
    format!("game:{code}")
}

fn user_room(user: Uuid) -> String {
    format!("user:{user}")
}

/// Registers the `/game` namespace on `io`.
pub fn register(io: &SocketIo, ctx: RelayContext) {
    let ctx = Arc::new(ctx);
    io.ns("/game", move |socket: SocketRef, TryData(auth): TryData<HandshakeAuth>| {
        let ctx = ctx.clone();
        async move {
            let token = auth.ok().and_then(|a| a.token);
            match authenticate(token, &ctx).await {
                Some(user) => accept_connection(socket, user, ctx),
                None => {
                    socket
                        .emit(
                            "error",
                            &ErrorBody {
                                reason: "unauthorized".into(),
                                message: "missing or invalid bearer token".into(),
                            },
                        )
                        .ok();
                    socket.disconnect().ok();
                }
            }
        }
    });
}

async fn authenticate(token: Option<String>, ctx: &Arc<RelayContext>) -> Option<AuthedUser> {
    let token = token?;
    ctx.auth.validate(&token).await
}

fn accept_connection(socket: SocketRef, user: AuthedUser, ctx: Arc<RelayContext>) {
    info!(socket = %socket.id, player = %user.id, name = %user.name, "🔌 socket authenticated");
    let _ = socket.join(user_room(user.id));
    ctx.directory
        .insert_client(user.clone(), socket.id.to_string());
    setup_game_handlers(socket, user, ctx);
}

/// Registers the per-socket game handlers, one block per event so each
/// closure only owns the clones it needs.
fn setup_game_handlers(socket: SocketRef, user: AuthedUser, ctx: Arc<RelayContext>) {
    {
        let ctx = ctx.clone();
        let user = user.clone();
        socket.on(
            "create",
            move |socket: SocketRef, Data(req): Data<CreateRequest>, ack: AckSender| {
                let ctx = ctx.clone();
                let user = user.clone();
                async move {
                    handle_create(socket, user, req, ack, ctx).await;
                }
            },
        );
    }

    {
        let ctx = ctx.clone();
        let user = user.clone();
        socket.on(
            "join",
            move |socket: SocketRef, Data(req): Data<JoinRequest>, ack: AckSender| {
                let ctx = ctx.clone();
                let user = user.clone();
                async move {
                    handle_join(socket, user, req, ack, ctx).await;
                }
            },
        );
    }

    {
        let ctx = ctx.clone();
        let user = user.clone();
        socket.on(
            "start",
            move |_socket: SocketRef, Data(req): Data<StartRequest>, ack: AckSender| {
                let ctx = ctx.clone();
                let user = user.clone();
                async move {
                    handle_start(user, req, ack, ctx).await;
                }
            },
        );
    }

    {
        let ctx = ctx.clone();
        let user = user.clone();
        socket.on(
            "action",
            move |socket: SocketRef, Data(req): Data<ActionRequest>| {
                let ctx = ctx.clone();
                let user = user.clone();
                async move {
                    handle_action(socket, user, req, ctx).await;
                }
            },
        );
    }

    {
        let ctx = ctx.clone();
        let user = user.clone();
        socket.on(
            "leave",
            move |socket: SocketRef, Data(req): Data<LeaveRequest>| {
                let ctx = ctx.clone();
                let user = user.clone();
                async move {
                    handle_leave(socket, user, req, ctx).await;
                }
            },
        );
    }

    {
        let ctx = ctx.clone();
        let user = user.clone();
        socket.on(
            "invite",
            move |_socket: SocketRef, Data(req): Data<InviteRequest>, ack: AckSender| {
                let ctx = ctx.clone();
                let user = user.clone();
                async move {
                    handle_invite(user, req, ack, ctx).await;
                }
            },
        );
    }

    {
        let ctx = ctx.clone();
        let user = user.clone();
        socket.on_disconnect(move |_socket: SocketRef| {
            let ctx = ctx.clone();
            let user = user.clone();
            async move {
                handle_transport_disconnect(user, ctx).await;
            }
        });
    }
}

async fn handle_create(
    socket: SocketRef,
    user: AuthedUser,
    req: CreateRequest,
    ack: AckSender,
    ctx: Arc<RelayContext>,
) {
    let profile = PlayerProfile {
        id: user.id,
        name: user.name.clone(),
        avatar_url: user.avatar_url.clone(),
    };
    match ctx.engine.create_session(req.game_type, profile, req.settings) {
        Ok(session) => {
            let _ = socket.join(session_room(&session.code));
            ctx.directory.set_membership(user.id, session.code.clone());
            let state = view_for(&session, user.id);
            ack.send(&Ack::with_state(&session.code, state)).ok();
        }
        Err(err) => {
            debug!(player = %user.id, %err, "create rejected");
            ack.send(&Ack::err(&err)).ok();
        }
    }
}

async fn handle_join(
    socket: SocketRef,
    user: AuthedUser,
    req: JoinRequest,
    ack: AckSender,
    ctx: Arc<RelayContext>,
) {
    let profile = PlayerProfile {
        id: user.id,
        name: req.player_name.unwrap_or_else(|| user.name.clone()),
        avatar_url: user.avatar_url.clone(),
    };
    match ctx.engine.join_session(&req.code, profile) {
        Ok(session) => {
            let _ = socket.join(session_room(&session.code));
            ctx.directory.set_membership(user.id, session.code.clone());
            ack.send(&Ack::with_state(&session.code, view_for(&session, user.id)))
                .ok();

            if let Some(player) = session.player(user.id) {
                broadcast(
                    &ctx,
                    &session.code,
                    "player-joined",
                    &PlayerJoined {
                        player: player.clone(),
                        player_count: session.connected_count(),
                    },
                )
                .await;
            }
            push_states(&ctx, &session).await;
        }
        Err(err) => {
            debug!(player = %user.id, code = %req.code, %err, "join rejected");
            ack.send(&Ack::err(&err)).ok();
        }
    }
}

async fn handle_start(user: AuthedUser, req: StartRequest, ack: AckSender, ctx: Arc<RelayContext>) {
    match ctx.engine.start_session(&req.code, user.id) {
        Ok(session) => {
            ack.send(&Ack::ok()).ok();
            broadcast(&ctx, &session.code, "round-start", &round_start(&session)).await;
            push_states(&ctx, &session).await;
        }
        Err(err) => {
            debug!(player = %user.id, code = %req.code, %err, "start rejected");
            ack.send(&Ack::err(&err)).ok();
        }
    }
}

async fn handle_action(
    socket: SocketRef,
    user: AuthedUser,
    req: ActionRequest,
    ctx: Arc<RelayContext>,
) {
    let outcome = match ctx
        .engine
        .handle_action(&req.code, user.id, &req.action, &req.payload)
    {
        Ok(outcome) => outcome,
        Err(err) => {
            // only the failing caller hears about it
            socket.emit("error", &ErrorBody::from(&err)).ok();
            return;
        }
    };
    let session = &outcome.session;

    broadcast(
        &ctx,
        &req.code,
        "update",
        &StateUpdate {
            game_data: session.data.public_view(),
            players: session.players.clone(),
            round: session.round,
        },
    )
    .await;

    let Some(results) = outcome.results else {
        return;
    };

    broadcast(
        &ctx,
        &req.code,
        "round-end",
        &RoundEnd {
            round: results.round,
            scores: results.scores,
            summary: results.summary,
            players: session.players.clone(),
        },
    )
    .await;

    if outcome.game_ended {
        let standings = session.standings();
        broadcast(
            &ctx,
            &req.code,
            "ended",
            &GameEnded {
                winner: standings.first().map(|p| p.id),
                final_scores: standings,
            },
        )
        .await;
        schedule_removal(&ctx, req.code.clone());
    } else {
        // rounds auto-advance; no separate "ready" round-trip
        broadcast(&ctx, &req.code, "round-start", &round_start(session)).await;
        push_states(&ctx, session).await;
    }
}

async fn handle_leave(socket: SocketRef, user: AuthedUser, req: LeaveRequest, ctx: Arc<RelayContext>) {
    let _ = socket.leave(session_room(&req.code));
    ctx.directory.clear_membership(user.id);
    if let Some(session) = ctx.engine.player_disconnect(&req.code, user.id) {
        info!(player = %user.id, code = %req.code, "👋 player left session");
        broadcast(
            &ctx,
            &req.code,
            "player-left",
            &PlayerLeft {
                player_id: user.id,
                player_count: session.connected_count(),
            },
        )
        .await;
    }
}

async fn handle_invite(
    user: AuthedUser,
    req: InviteRequest,
    ack: AckSender,
    ctx: Arc<RelayContext>,
) {
    // read-only lookup: invites must not mutate the session
    let Some(session) = ctx.engine.get_session(&req.code) else {
        ack.send(&Ack::err(&parlor_engine::EngineError::SessionNotFound))
            .ok();
        return;
    };
    if let Some(claimed) = req.game_type {
        if claimed != session.game_type {
            debug!(code = %req.code, ?claimed, actual = ?session.game_type, "invite game type mismatch");
        }
    }
    let host_name = session
        .player(session.host_id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| user.name.clone());
    let notice = crate::events::InviteNotice {
        code: session.code.clone(),
        game_type: session.game_type,
        host_name,
    };
    if let Err(err) = ctx
        .io
        .to(user_room(req.target_user_id))
        .emit("invite", &notice)
    {
        warn!(target = %req.target_user_id, "invite delivery failed: {err}");
    }
    ack.send(&Ack::ok()).ok();
}

async fn handle_transport_disconnect(user: AuthedUser, ctx: Arc<RelayContext>) {
    ctx.directory.remove_client(user.id);
    // the membership stays: the player is still on the roster and may
    // reconnect; only the reaper or an explicit leave clears it
    let Some(code) = ctx.directory.membership(user.id) else {
        return;
    };
    if let Some(session) = ctx.engine.player_disconnect(&code, user.id) {
        info!(player = %user.id, code = %code, "👋 player disconnected");
        broadcast(
            &ctx,
            &code,
            "player-left",
            &PlayerLeft {
                player_id: user.id,
                player_count: session.connected_count(),
            },
        )
        .await;
    }
}

fn round_start(session: &Session) -> RoundStart {
    RoundStart {
        round: session.round,
        total_rounds: session.total_rounds,
        game_data: session.data.public_view(),
        timer_secs: session.timer_secs,
    }
}

/// Group broadcast with per-call failure isolation: a dead recipient is
/// logged and never aborts delivery to the rest of the room.
async fn broadcast<T: Serialize>(ctx: &Arc<RelayContext>, code: &str, event: &str, payload: &T) {
    if let Err(err) = ctx.io.to(session_room(code)).emit(event, payload) {
        warn!(code, event, "broadcast failed: {err}");
    }
}

/// One sanitized full-state push per connected roster member. Never reuses
/// a view across recipients.
async fn push_states(ctx: &Arc<RelayContext>, session: &Session) {
    for player in &session.players {
        if !player.is_connected {
            continue;
        }
        let Some(client) = ctx.directory.client(player.id) else {
            continue;
        };
        let view = view_for(session, player.id);
        if let Err(err) = ctx.io.to(client.socket_id.clone()).emit("state", &view) {
            warn!(player = %player.id, "state push failed: {err}");
        }
    }
}

/// Lets late readers fetch the final standings for a short grace window,
/// then removes the session.
fn schedule_removal(ctx: &Arc<RelayContext>, code: String) {
    let engine = ctx.engine.clone();
    let directory = ctx.directory.clone();
    let grace = ctx.ended_grace;
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        engine.remove_session(&code);
        directory.forget_session(&code);
    });
}
