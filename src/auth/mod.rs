mod authenticator;
mod models;

pub use authenticator::Authenticator;
pub use models::LoginOutcome;
