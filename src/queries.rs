pub mod connections;
pub mod notifications;
pub mod users;
