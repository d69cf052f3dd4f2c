pub mod billing;
pub mod db;
pub mod error;
pub mod mailer;
pub mod session;
pub mod usage;
