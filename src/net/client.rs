use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::AppError;
use crate::types::{ClientState, SharedState};
use crate::vote::clients::read_client_list;
use crate::vote::request::{encode_vote_request, VoteRequest};
use crate::wire::{frame_packet, parse_packet, PacketKind};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_JITTER_MS: u64 = 250;

pub async fn run_vote_client(
    ws_url: String,
    state: SharedState,
    mut outgoing: mpsc::Receiver<VoteRequest>,
    max_backoff: Duration,
) {
    let mut backoff = INITIAL_BACKOFF;
    loop {
        match connect_and_run(&ws_url, &state, &mut outgoing, &mut backoff).await {
            Ok(()) => {
                tracing::info!("vote WS closed cleanly, reconnecting");
            }
            Err(e) => {
                tracing::warn!("vote WS error: {e}, reconnecting in {backoff:?}");
            }
        }

        {
            let mut state = state.lock();
            state.connected = false;
            state.session.reset();
        }

        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=MAX_JITTER_MS));
        tokio::time::sleep(backoff + jitter).await;
        backoff = next_backoff(backoff, max_backoff);
    }
}

fn next_backoff(current: Duration, max: Duration) -> Duration {
    (current * 2).min(max)
}

async fn connect_and_run(
    ws_url: &str,
    state: &SharedState,
    outgoing: &mut mpsc::Receiver<VoteRequest>,
    backoff: &mut Duration,
) -> Result<(), AppError> {
    tracing::info!("connecting to vote server: {ws_url}");
    let (ws_stream, _) = connect_async(ws_url)
        .await
        .map_err(|e| AppError::Transport(e.to_string()))?;
    tracing::info!("vote server connected");

    *backoff = INITIAL_BACKOFF;
    state.lock().connected = true;

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                let Some(msg) = msg else { break };
                match msg.map_err(|e| AppError::Transport(e.to_string()))? {
                    Message::Binary(frame) => handle_frame(state, &frame),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(request) = outgoing.recv() => {
                tracing::debug!("sending {} vote", request.vote_type().as_str());
                write
                    .send(Message::Binary(outgoing_frame(&request)))
                    .await
                    .map_err(|e| AppError::Transport(e.to_string()))?;
            }
        }
    }

    Ok(())
}

pub fn outgoing_frame(request: &VoteRequest) -> Vec<u8> {
    frame_packet(PacketKind::VoteRequest, &encode_vote_request(request))
}

/// Route one inbound frame to the session. Bad frames are logged and dropped.
pub fn handle_frame(state: &SharedState, frame: &[u8]) {
    let (kind, body) = match parse_packet(frame) {
        Ok(packet) => packet,
        Err(e) => {
            tracing::warn!("dropping frame: {e}");
            return;
        }
    };

    let mut guard = state.lock();
    let ClientState { session, host, .. } = &mut *guard;

    match kind {
        PacketKind::VoteUpdate => {
            // decode failures and aborted votes are logged inside the session
            let _ = session.receive(body, host);
        }
        PacketKind::ClientList => match read_client_list(body) {
            Ok(roster) => {
                tracing::debug!("client roster: {} connected", roster.len());
                session.set_clients(roster);
            }
            Err(e) => tracing::warn!("bad client list: {e}"),
        },
        PacketKind::VoteRequest => {
            tracing::warn!("server sent a client vote request, ignoring");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vote::clients::{write_client_list, ConnectedClient};
    use crate::vote::request::decode_vote_request;
    use crate::vote::update::{encode_vote_update, VoteUpdate};
    use crate::vote::{SubmarineInfo, VoteSession};

    fn state() -> SharedState {
        ClientState::shared(VoteSession::new(
            1,
            vec![SubmarineInfo { name: "Humpback".into(), price: 0 }],
            vec![],
        ))
    }

    #[test]
    fn test_backoff_doubles_until_cap() {
        let max = Duration::from_secs(30);
        assert_eq!(next_backoff(Duration::from_secs(1), max), Duration::from_secs(2));
        assert_eq!(next_backoff(Duration::from_secs(16), max), Duration::from_secs(30));
        assert_eq!(next_backoff(max, max), max);
    }

    #[test]
    fn test_outgoing_frame_carries_request() {
        let request = VoteRequest::Kick { client_id: 4 };
        let frame = outgoing_frame(&request);
        assert_eq!(frame[0], PacketKind::VoteRequest as u8);
        assert_eq!(decode_vote_request(&frame[1..]).unwrap(), request);
    }

    #[test]
    fn test_client_list_then_vote_update() {
        let state = state();
        let roster = vec![ConnectedClient::new(1, "me", true), ConnectedClient::new(2, "bob", true)];
        handle_frame(&state, &frame_packet(PacketKind::ClientList, &write_client_list(&roster)));
        assert_eq!(state.lock().session.clients().len(), 2);

        let update = VoteUpdate { ready_clients: Some(vec![2]), ..Default::default() };
        handle_frame(&state, &frame_packet(PacketKind::VoteUpdate, &encode_vote_update(&update)));
        assert!(state.lock().session.clients().find(2).unwrap().is_ready());
    }

    #[test]
    fn test_garbage_frames_ignored() {
        let state = state();
        handle_frame(&state, &[]);
        handle_frame(&state, &[0xEE, 0x01]);
        handle_frame(&state, &[PacketKind::VoteUpdate as u8]);
        handle_frame(&state, &[PacketKind::ClientList as u8, 0x05]);
        assert!(state.lock().session.clients().is_empty());
        assert!(state.lock().session.tallies().snapshot().is_empty());
    }
}
