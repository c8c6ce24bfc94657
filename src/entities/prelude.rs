pub use super::candidates::Entity as Candidates;
pub use super::elections::Entity as Elections;
pub use super::users::Entity as Users;
pub use super::votes::Entity as Votes;
