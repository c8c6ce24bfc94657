mod admin;
mod email;
mod indexnow;

pub use admin::{cmd_create_admin, cmd_promote};
pub use email::cmd_check_email;
pub use indexnow::cmd_indexnow;
