#![allow(dead_code)]

pub mod config;
pub mod error;
pub mod net;
pub mod server;
pub mod types;
pub mod vote;
pub mod wire;
