pub mod message;
pub mod protocol;
pub mod event;
pub mod connection;
pub mod config;
pub mod error;

#[cfg(test)]
mod tests;

pub use error::{AdmissionError, ClientError};
pub type Result<T> = std::result::Result<T, ClientError>;
