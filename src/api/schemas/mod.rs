pub mod auth;
pub mod health;
pub mod messaging;
pub mod pagination;
pub mod users;
