use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

use super::clients::ConnectedClient;
use super::types::{SubmarineInfo, VoteType};

const RECENT_EVENTS_MAX: usize = 20;

/// Game-side effects triggered while applying a vote update.
pub trait VoteHost {
    fn show_submarine_vote(
        &mut self,
        starter: Option<&ConnectedClient>,
        submarine: &SubmarineInfo,
        vote_type: VoteType,
        transfer_items: bool,
        timeout: Duration,
    );

    fn show_money_transfer_vote(
        &mut self,
        starter: Option<&ConnectedClient>,
        from: Option<&ConnectedClient>,
        amount: i32,
        to: Option<&ConnectedClient>,
        timeout: Duration,
    );

    fn end_vote(&mut self, passed: bool, yes: u8, no: u8);

    fn purchase_submarine(&mut self, submarine: &SubmarineInfo);

    fn switch_submarine(&mut self, submarine: &SubmarineInfo, transfer_items: bool, delivery_fee: i32);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    SubmarineVoteShown {
        starter: Option<u8>,
        submarine: String,
        vote_type: VoteType,
        transfer_items: bool,
        timeout_secs: u64,
    },
    MoneyTransferVoteShown {
        starter: Option<u8>,
        from: Option<u8>,
        to: Option<u8>,
        amount: i32,
        timeout_secs: u64,
    },
    VoteEnded {
        passed: bool,
        yes: u8,
        no: u8,
    },
    SubmarinePurchased {
        submarine: String,
    },
    SubmarineSwitched {
        submarine: String,
        transfer_items: bool,
        delivery_fee: i32,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct HostRecord {
    pub ts: i64,
    #[serde(flatten)]
    pub event: HostEvent,
}

/// Headless host: remembers what the game would have done.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RecordingHost {
    events: VecDeque<HostRecord>,
    owned_submarines: Vec<String>,
    current_submarine: Option<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent first.
    pub fn recent_events(&self) -> Vec<HostRecord> {
        self.events.iter().cloned().collect()
    }

    /// Events in the order they happened.
    pub fn events_in_order(&self) -> Vec<HostEvent> {
        self.events.iter().rev().map(|r| r.event.clone()).collect()
    }

    pub fn owned_submarines(&self) -> &[String] {
        &self.owned_submarines
    }

    pub fn current_submarine(&self) -> Option<&str> {
        self.current_submarine.as_deref()
    }

    fn record(&mut self, event: HostEvent) {
        tracing::debug!(?event, "host event");
        self.events.push_front(HostRecord { ts: chrono::Utc::now().timestamp_millis(), event });
        if self.events.len() > RECENT_EVENTS_MAX {
            self.events.pop_back();
        }
    }
}

impl VoteHost for RecordingHost {
    fn show_submarine_vote(
        &mut self,
        starter: Option<&ConnectedClient>,
        submarine: &SubmarineInfo,
        vote_type: VoteType,
        transfer_items: bool,
        timeout: Duration,
    ) {
        self.record(HostEvent::SubmarineVoteShown {
            starter: starter.map(|c| c.id),
            submarine: submarine.name.clone(),
            vote_type,
            transfer_items,
            timeout_secs: timeout.as_secs(),
        });
    }

    fn show_money_transfer_vote(
        &mut self,
        starter: Option<&ConnectedClient>,
        from: Option<&ConnectedClient>,
        amount: i32,
        to: Option<&ConnectedClient>,
        timeout: Duration,
    ) {
        self.record(HostEvent::MoneyTransferVoteShown {
            starter: starter.map(|c| c.id),
            from: from.map(|c| c.id),
            to: to.map(|c| c.id),
            amount,
            timeout_secs: timeout.as_secs(),
        });
    }

    fn end_vote(&mut self, passed: bool, yes: u8, no: u8) {
        self.record(HostEvent::VoteEnded { passed, yes, no });
    }

    fn purchase_submarine(&mut self, submarine: &SubmarineInfo) {
        if !self.owned_submarines.contains(&submarine.name) {
            self.owned_submarines.push(submarine.name.clone());
        }
        self.record(HostEvent::SubmarinePurchased { submarine: submarine.name.clone() });
    }

    fn switch_submarine(&mut self, submarine: &SubmarineInfo, transfer_items: bool, delivery_fee: i32) {
        self.current_submarine = Some(submarine.name.clone());
        self.record(HostEvent::SubmarineSwitched {
            submarine: submarine.name.clone(),
            transfer_items,
            delivery_fee,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(name: &str) -> SubmarineInfo {
        SubmarineInfo { name: name.into(), price: 1000 }
    }

    #[test]
    fn test_purchase_then_switch_tracks_state() {
        let mut host = RecordingHost::new();
        host.purchase_submarine(&sub("Typhon"));
        host.switch_submarine(&sub("Typhon"), true, 0);
        assert_eq!(host.owned_submarines(), &["Typhon".to_string()]);
        assert_eq!(host.current_submarine(), Some("Typhon"));
        assert_eq!(
            host.events_in_order(),
            vec![
                HostEvent::SubmarinePurchased { submarine: "Typhon".into() },
                HostEvent::SubmarineSwitched {
                    submarine: "Typhon".into(),
                    transfer_items: true,
                    delivery_fee: 0
                },
            ]
        );
    }

    #[test]
    fn test_repeat_purchase_not_duplicated() {
        let mut host = RecordingHost::new();
        host.purchase_submarine(&sub("Orca"));
        host.purchase_submarine(&sub("Orca"));
        assert_eq!(host.owned_submarines().len(), 1);
    }

    #[test]
    fn test_events_capped() {
        let mut host = RecordingHost::new();
        for i in 0..(RECENT_EVENTS_MAX + 5) {
            host.end_vote(i % 2 == 0, 1, 0);
        }
        assert_eq!(host.recent_events().len(), RECENT_EVENTS_MAX);
    }

    #[test]
    fn test_money_transfer_records_ids() {
        let mut host = RecordingHost::new();
        let alice = ConnectedClient::new(1, "alice", true);
        host.show_money_transfer_vote(Some(&alice), Some(&alice), 300, None, Duration::from_secs(30));
        let json = serde_json::to_value(&host.recent_events()[0]).unwrap();
        assert_eq!(json["event"], "money_transfer_vote_shown");
        assert_eq!(json["from"], 1);
        assert!(json["to"].is_null());
        assert_eq!(json["timeout_secs"], 30);
    }
}
