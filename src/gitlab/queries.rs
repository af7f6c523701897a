use graphql_client::GraphQLQuery;
use log::warn;

use super::client::GitLabClient;
use crate::error::Result;

/// RFC 3339 timestamp scalar from the GitLab schema.
type Time = chrono::DateTime<chrono::Utc>;

/// GraphQL query for open merge requests with their most recent pipeline,
/// its stages and each stage's jobs.
#[derive(GraphQLQuery)]
#[graphql(
    schema_path = "graphql/schema.graphql",
    query_path = "graphql/open_merge_requests.graphql",
    response_derives = "Debug,Clone,PartialEq"
)]
pub struct GetOpenMergeRequests;

impl GitLabClient {
    /// Fetch up to five open merge requests, newest first.
    ///
    /// A response without a top-level project (wrong path, or a token that
    /// cannot see it) is reported as no data rather than an error.
    pub async fn fetch_open_merge_requests_graphql(
        &self,
        project_path: &str,
    ) -> Result<Vec<get_open_merge_requests::GetOpenMergeRequestsProjectMergeRequestsNodes>> {
        let variables = get_open_merge_requests::Variables {
            project_path: project_path.to_string(),
        };

        let request_body = GetOpenMergeRequests::build_query(variables);

        let data: get_open_merge_requests::ResponseData =
            self.execute_graphql_request(&request_body).await?;

        let Some(project) = data.project else {
            warn!("Project '{project_path}' not found or not visible with this token");
            return Ok(Vec::new());
        };

        Ok(project
            .merge_requests
            .and_then(|connection| connection.nodes)
            .map(|nodes| nodes.into_iter().flatten().collect())
            .unwrap_or_default())
    }
}
