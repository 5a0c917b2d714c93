pub mod patient;
pub mod queues;
pub mod tier;
