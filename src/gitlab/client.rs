use graphql_client::Response as GraphQLResponse;
use reqwest::Client;
use url::Url;

use crate::auth::Token;
use crate::error::{MrLensError, Result};

/// Authenticated HTTP client for one GitLab instance.
///
/// Holds the reqwest client, the resolved GraphQL endpoint and the bearer
/// token. Constructed through [`super::ClientHandle::initialize`] once a
/// configuration exists; a configuration change builds a fresh client
/// rather than mutating this one.
pub struct GitLabClient {
    client: Client,
    graphql_url: Url,
    token: Token,
}

impl GitLabClient {
    pub fn new(base_url: &str, token: Token) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("mrlens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MrLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base = Url::parse(base_url)
            .map_err(|e| MrLensError::Config(format!("Invalid base URL: {e}")))?;

        let graphql_url = base
            .join("api/graphql")
            .map_err(|e| MrLensError::Config(format!("Invalid GraphQL URL: {e}")))?;

        Ok(Self {
            client,
            graphql_url,
            token,
        })
    }

    pub fn graphql_url(&self) -> &Url {
        &self.graphql_url
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(self.token.as_str())
    }

    /// Execute a GraphQL request and return the response data.
    ///
    /// Any GraphQL-level error in the response body is collapsed into a
    /// single [`MrLensError::GraphQl`]; the dashboard never distinguishes
    /// failure causes. No retries here — re-attempting is a user action.
    pub(crate) async fn execute_graphql_request<T>(
        &self,
        request_body: &impl serde::Serialize,
    ) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let request = self.auth_request(
            self.client
                .post(self.graphql_url.clone())
                .json(request_body),
        );

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(MrLensError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let response_body: GraphQLResponse<T> = response.json().await?;

        if let Some(errors) = response_body.errors {
            return Err(MrLensError::GraphQl(
                errors
                    .iter()
                    .map(|e| e.message.clone())
                    .collect::<Vec<_>>()
                    .join(", "),
            ));
        }

        response_body.data.ok_or(MrLensError::NoResponseData)
    }
}
