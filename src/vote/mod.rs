pub mod clients;
pub mod host;
pub mod projection;
pub mod request;
pub mod session;
pub mod tally;
pub mod types;
pub mod update;

pub use clients::{ClientRegistry, ConnectedClient};
pub use host::{HostEvent, RecordingHost, VoteHost};
pub use request::{encode_vote_request, VoteRequest};
pub use session::{ApplyReport, VoteSession};
pub use types::{Ballot, SubmarineInfo, VoteState, VoteType};
pub use update::{decode_vote_update, VoteUpdate};
