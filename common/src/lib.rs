pub mod models;

pub use models::errors::DataError;
pub use models::token_link::{RedeemError, TokenLink};
pub use models::user::{MetadataFields, RenameMode, SendAs, UserProfile};
pub use models::wallet;
