//! Token sources: the network step that turns client credentials into a
//! bearer token.

use crate::errors::AuthError;

pub mod platform_token;

pub use platform_token::{token_endpoint, PlatformTokenSource};

/// Raw result of one acquisition round-trip, before it is stamped with an
/// expiry and cached.
#[derive(Clone, PartialEq, Eq)]
pub struct FetchedToken {
    pub access_token: String,
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for FetchedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedToken")
            .field("access_token", &crate::helpers::secret::mask(&self.access_token))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// One round-trip to an identity provider. Implementations never retry.
pub trait FetchToken: Send + Sync {
    fn fetch_token(&self) -> impl std::future::Future<Output = Result<FetchedToken, AuthError>> + Send;

    /// Short name used as a log field and metrics label.
    fn name(&self) -> &str;
}
