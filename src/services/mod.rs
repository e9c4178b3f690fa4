pub mod auth_service;
pub mod authenticator;
pub mod browser;
pub mod browserless;
pub mod clock;
pub mod cookie_jar;
pub mod nuveq;
pub mod pending_auth;
pub mod scraper;
pub mod session_store;
pub mod visitor_cache;

pub use auth_service::*;
pub use authenticator::*;
pub use browser::*;
pub use browserless::*;
pub use clock::*;
pub use cookie_jar::*;
pub use pending_auth::*;
pub use scraper::*;
pub use session_store::*;
pub use visitor_cache::*;
