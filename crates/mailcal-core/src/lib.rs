//! Client core for the mail & calendar assistant.
//!
//! Serializes user submissions into one ordered stream of backend calls,
//! correlates replies with requests and keeps the conversation log that the
//! UI renders from. Platform access goes through the traits in [`ports`].

pub mod ports;
pub mod event_bus;
pub mod session;
pub mod correlation;
pub mod queue;
pub mod conversation;
pub mod connection;
pub mod client;


pub use client::{ChatClient, ClientPorts, ClientStatus, SubmitOutcome, Submission};
