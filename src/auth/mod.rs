//! Bearer credential acquisition

mod token;

pub use token::{ClientCredentialsProvider, TokenProvider};
