pub mod account_service;
pub mod auth_service;
pub mod follow_service;
pub mod health_service;
pub mod messaging_service;
pub mod privacy_gate;
pub mod rate_limit_service;
