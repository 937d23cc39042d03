#![forbid(unsafe_code)]

mod client;
mod config;
mod node;

pub use client::DistributedClient;
pub use config::{ClientConfig, ConnectOptions};
pub use memvault_ring::NodeAddr;
