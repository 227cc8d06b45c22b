/// Middleware modules for the API server
///
/// - `security`: security headers on every response
/// - `rate_limit`: token bucket limiting for the authentication routes

pub mod rate_limit;
pub mod security;
