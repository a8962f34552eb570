pub mod config;
pub mod digest;
pub mod notification;

pub mod error;
