pub mod mailer;
pub use mailer::{EmailSender, MailError, MemoryEmailSender, OtpMailer};

pub mod media;
pub use media::{MediaError, MediaKind, MediaService};

pub mod account_service;
pub mod account_service_impl;
pub use account_service::{AccountError, AccountService, NewPassword, PendingOtp, Portal};
pub use account_service_impl::SeaOrmAccountService;

pub mod election_service;
pub mod election_service_impl;
pub use election_service::{ElectionError, ElectionService};
pub use election_service_impl::SeaOrmElectionService;

pub mod voting_service;
pub mod voting_service_impl;
pub use voting_service::{VotingError, VotingService};
pub use voting_service_impl::SeaOrmVotingService;
