pub mod connections;
pub mod notifications;
pub mod sessions;
pub mod users;
