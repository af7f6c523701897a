use std::sync::Arc;

use log::info;

use super::client::GitLabClient;
use super::queries::get_open_merge_requests as query;
use super::types::{Author, Job, JobStatus, MergeRequest, Pipeline, PipelineStatus, Stage};
use crate::error::Result;

/// Fetches and converts merge request data for one project.
///
/// Cheap to construct per fetch: it only holds a client handle and the
/// project path the results belong to.
pub struct MergeRequestProvider {
    pub client: Arc<GitLabClient>,
    pub project_path: String,
}

impl MergeRequestProvider {
    pub fn new(client: Arc<GitLabClient>, project_path: String) -> Self {
        Self {
            client,
            project_path,
        }
    }

    /// Fetch the project's open merge requests as domain types.
    pub async fn fetch_open_merge_requests(&self) -> Result<Vec<MergeRequest>> {
        info!(
            "Fetching open merge requests for project: {}",
            self.project_path
        );

        let nodes = self
            .client
            .fetch_open_merge_requests_graphql(&self.project_path)
            .await?;

        let merge_requests: Vec<MergeRequest> =
            nodes.into_iter().map(merge_request_from_node).collect();

        info!("Fetched {} open merge requests", merge_requests.len());

        Ok(merge_requests)
    }
}

// GraphQL connections are Option<Vec<Option<T>>> throughout, so every level
// flattens before conversion.

fn merge_request_from_node(
    node: query::GetOpenMergeRequestsProjectMergeRequestsNodes,
) -> MergeRequest {
    let pipelines = node
        .pipelines
        .and_then(|connection| connection.nodes)
        .map(|nodes| {
            nodes
                .into_iter()
                .flatten()
                .map(pipeline_from_node)
                .collect()
        })
        .unwrap_or_default();

    MergeRequest {
        id: node.id,
        title: node.title,
        description: node.description.filter(|d| !d.trim().is_empty()),
        created_at: node.created_at,
        author: node.author.map(|author| Author {
            name: author.name,
            avatar_url: author.avatar_url,
        }),
        should_be_rebased: node.should_be_rebased,
        web_url: node.web_url,
        pipelines,
    }
}

fn pipeline_from_node(
    node: query::GetOpenMergeRequestsProjectMergeRequestsNodesPipelinesNodes,
) -> Pipeline {
    let stages = node
        .stages
        .and_then(|connection| connection.nodes)
        .map(|nodes| nodes.into_iter().flatten().map(stage_from_node).collect())
        .unwrap_or_default();

    Pipeline {
        id: node.id,
        status: node.status.into(),
        stages,
    }
}

fn stage_from_node(
    node: query::GetOpenMergeRequestsProjectMergeRequestsNodesPipelinesNodesStagesNodes,
) -> Stage {
    let jobs = node
        .jobs
        .and_then(|connection| connection.nodes)
        .map(|nodes| nodes.into_iter().flatten().map(job_from_node).collect())
        .unwrap_or_default();

    Stage {
        name: node.name.unwrap_or_default(),
        status: node.status,
        jobs,
    }
}

fn job_from_node(
    node: query::GetOpenMergeRequestsProjectMergeRequestsNodesPipelinesNodesStagesNodesJobsNodes,
) -> Job {
    Job {
        id: node.id,
        name: node.name.unwrap_or_default(),
        status: node.status.map(JobStatus::from).unwrap_or(JobStatus::Unknown),
        started_at: node.started_at,
    }
}

impl From<query::PipelineStatusEnum> for PipelineStatus {
    fn from(status: query::PipelineStatusEnum) -> Self {
        use query::PipelineStatusEnum as Remote;

        match status {
            Remote::CREATED => PipelineStatus::Created,
            Remote::WAITING_FOR_RESOURCE => PipelineStatus::WaitingForResource,
            Remote::PREPARING => PipelineStatus::Preparing,
            Remote::PENDING => PipelineStatus::Pending,
            Remote::RUNNING => PipelineStatus::Running,
            Remote::FAILED => PipelineStatus::Failed,
            Remote::SUCCESS => PipelineStatus::Success,
            Remote::CANCELED => PipelineStatus::Canceled,
            Remote::SKIPPED => PipelineStatus::Skipped,
            Remote::MANUAL => PipelineStatus::Manual,
            Remote::SCHEDULED => PipelineStatus::Scheduled,
            Remote::Other(_) => PipelineStatus::Unknown,
        }
    }
}

impl From<query::CiJobStatus> for JobStatus {
    fn from(status: query::CiJobStatus) -> Self {
        use query::CiJobStatus as Remote;

        match status {
            Remote::CREATED => JobStatus::Created,
            Remote::WAITING_FOR_RESOURCE => JobStatus::WaitingForResource,
            Remote::PREPARING => JobStatus::Preparing,
            Remote::PENDING => JobStatus::Pending,
            Remote::RUNNING => JobStatus::Running,
            Remote::FAILED => JobStatus::Failed,
            Remote::SUCCESS => JobStatus::Success,
            Remote::CANCELED => JobStatus::Canceled,
            Remote::SKIPPED => JobStatus::Skipped,
            Remote::MANUAL => JobStatus::Manual,
            Remote::SCHEDULED => JobStatus::Scheduled,
            Remote::Other(_) => JobStatus::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Token;
    use crate::error::MrLensError;

    fn bare_node(id: &str) -> query::GetOpenMergeRequestsProjectMergeRequestsNodes {
        query::GetOpenMergeRequestsProjectMergeRequestsNodes {
            id: id.to_string(),
            title: "Add feature".to_string(),
            description: None,
            created_at: None,
            author: None,
            should_be_rebased: false,
            web_url: None,
            pipelines: None,
        }
    }

    #[test]
    fn test_conversion_tolerates_absent_optionals() {
        let mr = merge_request_from_node(bare_node("gid://gitlab/MergeRequest/1"));

        assert_eq!(mr.id, "gid://gitlab/MergeRequest/1");
        assert!(mr.description.is_none());
        assert!(mr.created_at.is_none());
        assert!(mr.author.is_none());
        assert!(mr.pipelines.is_empty());
    }

    #[test]
    fn test_conversion_drops_blank_description() {
        let mut node = bare_node("gid://gitlab/MergeRequest/2");
        node.description = Some("   ".to_string());

        let mr = merge_request_from_node(node);
        assert!(mr.description.is_none());
    }

    #[test]
    fn test_stage_and_job_conversion_defaults() {
        let stage = stage_from_node(
            query::GetOpenMergeRequestsProjectMergeRequestsNodesPipelinesNodesStagesNodes {
                name: None,
                status: None,
                jobs: None,
            },
        );
        assert_eq!(stage.name, "");
        assert!(stage.status.is_none());
        assert!(stage.jobs.is_empty());

        let job = job_from_node(
            query::GetOpenMergeRequestsProjectMergeRequestsNodesPipelinesNodesStagesNodesJobsNodes {
                id: None,
                name: None,
                status: None,
                started_at: None,
            },
        );
        assert_eq!(job.status, JobStatus::Unknown);
        assert!(job.started_at.is_none());
    }

    #[test]
    fn test_unknown_remote_status_maps_to_unknown() {
        let status: PipelineStatus =
            query::PipelineStatusEnum::Other("SOMETHING_NEW".to_string()).into();
        assert_eq!(status, PipelineStatus::Unknown);

        let status: JobStatus = query::CiJobStatus::Other("SOMETHING_NEW".to_string()).into();
        assert_eq!(status, JobStatus::Unknown);
    }

    fn response_body() -> &'static str {
        r#"{
  "data": {
    "project": {
      "id": "gid://gitlab/Project/1",
      "mergeRequests": {
        "nodes": [
          {
            "id": "gid://gitlab/MergeRequest/42",
            "title": "Add request caching",
            "description": "Cache responses for a minute",
            "createdAt": "2024-05-01T10:00:00Z",
            "author": { "name": "Dana", "avatarUrl": null },
            "shouldBeRebased": true,
            "webUrl": "https://gitlab.example.com/group/project/-/merge_requests/42",
            "pipelines": {
              "nodes": [
                {
                  "id": "gid://gitlab/Ci::Pipeline/7",
                  "status": "RUNNING",
                  "stages": {
                    "nodes": [
                      {
                        "name": "build",
                        "status": "running",
                        "jobs": {
                          "nodes": [
                            {
                              "id": "gid://gitlab/Ci::Build/9",
                              "name": "compile",
                              "status": "RUNNING",
                              "startedAt": "2024-05-01T10:01:00Z"
                            },
                            null
                          ]
                        }
                      }
                    ]
                  }
                }
              ]
            }
          },
          null
        ]
      }
    }
  }
}"#
    }

    fn provider_for(server: &mockito::Server) -> MergeRequestProvider {
        let client = GitLabClient::new(&server.url(), Token::from("glpat-test")).unwrap();
        MergeRequestProvider::new(Arc::new(client), "group/project".to_string())
    }

    #[tokio::test]
    async fn test_fetch_parses_nested_response_and_sends_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/graphql")
            .match_header("authorization", "Bearer glpat-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(response_body())
            .create_async()
            .await;

        let provider = provider_for(&server);
        let merge_requests = provider.fetch_open_merge_requests().await.unwrap();

        mock.assert_async().await;

        assert_eq!(merge_requests.len(), 1);
        let mr = &merge_requests[0];
        assert_eq!(mr.reference(), "!42");
        assert!(mr.should_be_rebased);
        assert_eq!(mr.author.as_ref().unwrap().name, "Dana");

        let pipeline = mr.latest_pipeline().unwrap();
        assert_eq!(pipeline.status, PipelineStatus::Running);
        assert_eq!(pipeline.stages.len(), 1);
        assert_eq!(pipeline.stages[0].jobs.len(), 1);
        assert_eq!(pipeline.stages[0].jobs[0].status, JobStatus::Running);
    }

    #[tokio::test]
    async fn test_missing_project_is_no_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/graphql")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": {"project": null}}"#)
            .create_async()
            .await;

        let provider = provider_for(&server);
        let merge_requests = provider.fetch_open_merge_requests().await.unwrap();
        assert!(merge_requests.is_empty());
    }

    #[tokio::test]
    async fn test_graphql_errors_collapse_to_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/graphql")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"errors": [{"message": "token is expired"}]}"#)
            .create_async()
            .await;

        let provider = provider_for(&server);
        let result = provider.fetch_open_merge_requests().await;
        assert!(matches!(result, Err(MrLensError::GraphQl(_))));
    }

    #[tokio::test]
    async fn test_http_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/graphql")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let provider = provider_for(&server);
        let result = provider.fetch_open_merge_requests().await;
        assert!(matches!(
            result,
            Err(MrLensError::Api { status: 401, .. })
        ));
    }
}
