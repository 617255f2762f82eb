//! Domain model shared between the PhotoSync server and any future
//! first-party clients (CLI tooling, admin scripts). Pure data: no
//! storage-backend or HTTP-framework types leak in here.

pub mod entities;
pub mod dto;

pub use entities::*;
