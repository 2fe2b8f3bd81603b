#![forbid(unsafe_code)]

pub mod error;
pub mod extract;
pub mod routes;

pub use error::ApiError;
pub use extract::AuthUser;
pub use routes::router;
