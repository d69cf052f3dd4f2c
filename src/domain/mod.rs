pub mod analyses;
pub mod subscriptions;
pub mod usage;
pub mod users;
