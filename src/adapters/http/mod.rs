pub mod app_error_impl;
pub mod app_state;
pub mod auth_cookies;
pub mod middleware;
pub mod routes;
