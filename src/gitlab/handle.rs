use std::sync::Arc;

use log::info;

use crate::auth::Token;
use crate::error::{MrLensError, Result};

use super::client::GitLabClient;

/// Two-state handle for the authenticated GitLab client.
///
/// The dashboard starts unconfigured, so no client exists until a token is
/// saved. `initialize` replaces any previous client outright; credentials
/// are never merged across re-initializations. Calling [`ClientHandle::get`]
/// before `initialize` is a contract violation surfaced as
/// [`MrLensError::ClientUninitialized`].
#[derive(Default)]
pub enum ClientHandle {
    #[default]
    Uninitialized,
    Ready(Arc<GitLabClient>),
}

impl ClientHandle {
    /// Build a client bound to `base_url` carrying `token` as a bearer
    /// credential on every request, replacing any existing client.
    pub fn initialize(&mut self, base_url: &str, token: Token) -> Result<()> {
        info!("Initializing GitLab client for {base_url}");
        *self = ClientHandle::Ready(Arc::new(GitLabClient::new(base_url, token)?));
        Ok(())
    }

    /// The current client, or an error if `initialize` has not run yet.
    pub fn get(&self) -> Result<Arc<GitLabClient>> {
        match self {
            ClientHandle::Ready(client) => Ok(Arc::clone(client)),
            ClientHandle::Uninitialized => Err(MrLensError::ClientUninitialized),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ClientHandle::Ready(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_before_initialize_fails() {
        let handle = ClientHandle::default();
        assert!(!handle.is_ready());
        assert!(matches!(
            handle.get(),
            Err(MrLensError::ClientUninitialized)
        ));
    }

    #[test]
    fn test_get_after_initialize_succeeds() {
        let mut handle = ClientHandle::default();
        handle
            .initialize("https://gitlab.com", Token::from("glpat-test"))
            .unwrap();

        assert!(handle.is_ready());
        let client = handle.get().unwrap();
        assert_eq!(
            client.graphql_url().as_str(),
            "https://gitlab.com/api/graphql"
        );
    }

    #[test]
    fn test_reinitialize_replaces_client() {
        let mut handle = ClientHandle::default();
        handle
            .initialize("https://gitlab.com", Token::from("first"))
            .unwrap();
        handle
            .initialize("https://gitlab.example.com", Token::from("second"))
            .unwrap();

        let client = handle.get().unwrap();
        assert_eq!(
            client.graphql_url().as_str(),
            "https://gitlab.example.com/api/graphql"
        );
    }
}
