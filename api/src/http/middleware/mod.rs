/// Middleware modules

pub mod logger;
pub mod request_id;
pub mod security_headers;
pub mod session_auth;
