//! Auth service handed opaquely to the dispatch tree.

use tracing::debug;

/// Authentication collaborator: owns the endpoint/identity/client-id triple
/// the token protocol needs. The protocol itself lives behind this boundary.
#[derive(Debug, Clone)]
pub struct AuthService {
    api_server_url: String,
    installation_id: String,
    github_client_id: String,
}

impl AuthService {
    pub fn new(api_server_url: String, installation_id: String, github_client_id: String) -> Self {
        debug!(
            target: "rewind::auth",
            endpoint = %api_server_url,
            "constructed auth service"
        );
        Self {
            api_server_url,
            installation_id,
            github_client_id,
        }
    }

    /// URL the user visits to authorize this installation via GitHub.
    pub fn device_authorization_url(&self) -> String {
        format!(
            "{}/auth/github/device?client_id={}&installation_id={}",
            self.api_server_url.trim_end_matches('/'),
            self.github_client_id,
            self.installation_id
        )
    }

    pub fn installation_id(&self) -> &str {
        &self.installation_id
    }
}
