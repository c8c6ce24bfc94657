pub mod prelude;

pub mod candidates;
pub mod elections;
pub mod users;
pub mod votes;
