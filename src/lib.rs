pub mod auction;
pub mod config;
pub mod database;
pub mod error;
pub mod event_store;
pub mod handlers;
pub mod message_broker;
pub mod scheduler;
pub mod search;
pub mod server;

#[cfg(test)]
mod testing;
