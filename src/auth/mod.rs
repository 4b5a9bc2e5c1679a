// Authentication module
// JWT-based authentication with registration, login, token refresh and role checks

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use middleware::{authenticate, require_auth, AuthGate};
pub use models::{Identity, LoginTokens, Role, User, UserResponse};
pub use repository::{InMemoryUserStore, PgUserStore, UserStore};
pub use service::AuthService;
pub use token::TokenService;
