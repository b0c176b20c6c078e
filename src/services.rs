pub mod analytics;
pub mod auth;
pub mod quick_add;
pub mod quotes;
pub mod tasks;
