pub mod consumer;
pub mod model;
pub mod projector;
pub mod query;
pub mod repository;
pub mod sync;
