//! Typed console operations on top of the gateway.

mod operator;
mod sessions;
mod users;

pub use operator::OperatorApi;
pub use sessions::SessionsApi;
pub use users::UsersApi;
