pub mod auth_service;
pub mod author_service;
pub mod http;
pub mod persistence;
