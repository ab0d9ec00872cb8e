pub mod advancement;
pub mod head_to_head;
pub mod lifecycle;
pub mod ranking;
pub mod result_processor;
pub mod schedule;
pub mod standings;
pub mod types;
