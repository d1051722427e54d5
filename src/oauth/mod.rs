mod clock;
mod credentials;
pub mod oauth_client;
mod token;
mod token_manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::Credentials;
pub use token::{Token, TokenResponse};
pub use token_manager::{TokenManager, DEFAULT_SAFETY_MARGIN};
