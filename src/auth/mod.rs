//! Authentication Module
//! Mission: Token lifecycle and role-based access control

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod reset;
pub mod revocation;

pub use api::AuthState;
pub use jwt::JwtHandler;
pub use middleware::auth_middleware;
pub use revocation::RevocationLedger;
