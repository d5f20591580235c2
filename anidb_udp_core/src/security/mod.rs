//! Protection for AniDB account secrets

pub mod secure_string;

pub use secure_string::SecureString;
