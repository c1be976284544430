//! Setup pairing between voice-assistant identities and the web app

pub mod setup_token;

pub use setup_token::{PersistOutcome, SetupTokenService, TokenStore, SETUP_CODE_LENGTH};
