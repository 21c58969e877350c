mod role;
mod session;
mod session_record;
pub mod user;

pub use role::Role;
pub use session::{Session, SessionPatch};
pub use session_record::{SessionQuery, SessionRecord};
pub use user::{NewUser, PasswordReset, User, UserUpdate};
