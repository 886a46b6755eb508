//! Request and response bodies of the platform APIs.

pub mod cap;
pub mod manager;
pub mod public;
