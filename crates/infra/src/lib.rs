pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod pagination;
pub mod repos;

pub use error::EngineError;
