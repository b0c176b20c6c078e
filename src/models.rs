pub mod board;
pub mod store;
pub mod task;
pub mod user;
