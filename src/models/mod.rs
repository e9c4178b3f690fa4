pub mod api;
pub mod cookie;
pub mod error;
pub mod session;
pub mod visitor;

pub use api::*;
pub use cookie::*;
pub use error::*;
pub use session::*;
pub use visitor::*;
