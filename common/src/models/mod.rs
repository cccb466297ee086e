pub mod errors;
pub mod token_link;
pub mod user;
pub mod wallet;

pub use errors::DataError;
pub use token_link::{RedeemError, TokenLink};
pub use user::{MetadataFields, RenameMode, SendAs, UserProfile};
