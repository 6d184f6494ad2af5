//! Google OAuth: credential encoding, client registration, consent flow and
//! the shared [`TokenStore`].

mod client_secrets;
mod credential;
pub mod oauth;
mod token_store;

pub use client_secrets::ClientSecrets;
pub use credential::{Credential, GOOGLE_TOKEN_URI};
pub use oauth::{ConsentFlow, LoopbackConsent};
pub use token_store::{CredentialSources, TokenStore};

/// Environment variable holding a base64 credential.
pub const TOKEN_ENV: &str = "GOOGLE_TOKEN_B64";

/// Environment variable holding a base64 `credentials.json`.
pub const CREDENTIALS_ENV: &str = "GOOGLE_CREDENTIALS_B64";

/// Full read/write access to calendars.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
