//! egui front end: a read-only projection of the chat client plus the
//! chat panel that renders it.

pub mod panels;
pub mod state;
pub mod theme;
