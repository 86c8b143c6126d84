use crate::{
    config::is_valid_stage_id,
    quiz::{QuizCommand, QuizRunner, RunOutcome},
    websocket::messages::{ClientMessage, ServerMessage},
    ActiveSession, AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::{sync::mpsc, time::Instant};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct QuizQuery {
    pub stage: Option<String>,
}

/// WebSocket upgrade handler. Each connection plays one quiz session.
pub async fn handle_websocket(
    ws: WebSocketUpgrade,
    Query(query): Query<QuizQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let stage_id = requested_stage(query.stage, &state.config.questions.default_stage);
    tracing::info!("Quiz connection requested for stage '{}'", stage_id);
    ws.on_upgrade(move |socket| handle_socket(socket, state, stage_id))
}

/// The stage asked for in the query, or the default when it is missing or malformed
fn requested_stage(stage: Option<String>, default_stage: &str) -> String {
    match stage {
        Some(stage) if is_valid_stage_id(&stage) => stage,
        Some(stage) => {
            tracing::warn!("Rejecting stage id {:?}, using '{}'", stage, default_stage);
            default_stage.to_string()
        }
        None => default_stage.to_string(),
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, stage_id: String) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(100);
    let (cmd_tx, cmd_rx) = mpsc::channel::<QuizCommand>(16);

    let connection_id = Uuid::new_v4();
    state.active_sessions.insert(
        connection_id,
        ActiveSession {
            stage_id: stage_id.clone(),
            started_at: Instant::now(),
        },
    );

    let runner = QuizRunner::new(
        stage_id.clone(),
        state.config.game.quiz_settings(),
        state.questions.clone(),
        state.profiles.clone(),
        tx.clone(),
    );
    let mut quiz_task = tokio::spawn(runner.run(cmd_rx));

    // Spawn a task to send messages to the client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                }
            }
        }
    });

    // Handle incoming messages from the client
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        if !forward_client_message(client_msg, &cmd_tx).await {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse message: {}", e);
                        let error_msg = ServerMessage::Error {
                            message: format!("Invalid message format: {}", e),
                            retryable: false,
                        };
                        let _ = tx.send(error_msg).await;
                    }
                },
                Message::Close(_) => {
                    tracing::info!("Client {} disconnected", connection_id);
                    break;
                }
                _ => {}
            }
        }
        // Dropping cmd_tx here tears the session down
    });

    // The session ends when the quiz finishes or the client goes away
    tokio::select! {
        outcome = (&mut quiz_task) => {
            match outcome {
                Ok(RunOutcome::Completed(summary)) => {
                    tracing::info!("Connection {} finished stage '{}' with {}", connection_id, stage_id, summary.score);
                }
                Ok(outcome) => {
                    tracing::info!("Connection {} quiz ended: {:?}", connection_id, outcome);
                }
                Err(e) => {
                    tracing::error!("Quiz task for {} failed: {}", connection_id, e);
                }
            }
            recv_task.abort();
            // Let the final messages drain before closing
            let _ = (&mut send_task).await;
        }
        _ = (&mut recv_task) => {
            // Sender dropped with recv_task; the runner sees a closed channel and stops
            let _ = (&mut quiz_task).await;
            send_task.abort();
        }
        _ = (&mut send_task) => {
            recv_task.abort();
            let _ = (&mut quiz_task).await;
        }
    }

    state.active_sessions.remove(&connection_id);
    tracing::info!("WebSocket connection {} closed", connection_id);
}

/// Forward a client message to the session. Returns false once the client left.
async fn forward_client_message(msg: ClientMessage, commands: &mpsc::Sender<QuizCommand>) -> bool {
    let command = match msg {
        ClientMessage::Select { choice } => QuizCommand::Select(choice),
        ClientMessage::Skip => QuizCommand::Skip,
        ClientMessage::Leave => return false,
    };
    commands.send(command).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_stage_falls_back_to_default() {
        assert_eq!(requested_stage(Some("stage2".to_string()), "stage1"), "stage2");
        assert_eq!(requested_stage(None, "stage1"), "stage1");
        assert_eq!(requested_stage(Some(String::new()), "stage1"), "stage1");
        assert_eq!(requested_stage(Some("a b&c".to_string()), "stage1"), "stage1");
    }

    #[tokio::test]
    async fn test_forward_maps_commands() {
        let (tx, mut rx) = mpsc::channel(4);

        assert!(forward_client_message(ClientMessage::Select { choice: 1 }, &tx).await);
        assert!(forward_client_message(ClientMessage::Skip, &tx).await);
        assert_eq!(rx.recv().await, Some(QuizCommand::Select(1)));
        assert_eq!(rx.recv().await, Some(QuizCommand::Skip));
    }

    #[tokio::test]
    async fn test_leave_stops_forwarding() {
        let (tx, _rx) = mpsc::channel(4);
        assert!(!forward_client_message(ClientMessage::Leave, &tx).await);
    }

    #[tokio::test]
    async fn test_forward_fails_after_session_ended() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        assert!(!forward_client_message(ClientMessage::Skip, &tx).await);
    }
}
