pub mod client;

pub use client::{handle_frame, run_vote_client};
