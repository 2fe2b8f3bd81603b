#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_service;
pub mod error;
pub mod practice_service;
pub mod timeline_service;
pub mod tokens;

pub use wellness_core::Clock;

pub use app_services::AppServices;
pub use auth_service::{AuthService, Session};
pub use error::{AppServicesError, AuthError, PracticeServiceError, TimelineServiceError};
pub use practice_service::{PracticeService, TreeInit};
pub use timeline_service::{TimelineService, synthesize_entries};
pub use tokens::{TOKEN_LIFETIME_DAYS, TokenIssuer};
