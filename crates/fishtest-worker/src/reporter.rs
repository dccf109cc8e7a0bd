//! Progress reports to the coordination server.

use async_trait::async_trait;
use fishtest_core::{RunId, RunStats, TaskId, WorkerInfo};
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::ReportError;
use crate::fetch::USER_AGENT;

/// Destination for cumulative task statistics.
///
/// Reporting is best effort: callers log failures and keep playing.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(
        &self,
        worker: &WorkerInfo,
        run_id: &RunId,
        task_id: TaskId,
        stats: RunStats,
    ) -> Result<(), ReportError>;
}

/// Body of `POST /api/update_task`.
#[derive(Debug, Serialize)]
struct UpdateTaskRequest<'a> {
    username: &'a str,
    password: &'a str,
    run_id: String,
    task_id: TaskId,
    stats: RunStats,
}

/// Reports to the coordination server's `update_task` endpoint.
#[derive(Debug, Clone)]
pub struct HttpReporter {
    client: reqwest::Client,
    url: String,
}

impl HttpReporter {
    pub fn new(config: &Config) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            url: config.update_task_url(),
        })
    }
}

#[async_trait]
impl ProgressReporter for HttpReporter {
    async fn report(
        &self,
        worker: &WorkerInfo,
        run_id: &RunId,
        task_id: TaskId,
        stats: RunStats,
    ) -> Result<(), ReportError> {
        let body = UpdateTaskRequest {
            username: &worker.username,
            password: &worker.password,
            run_id: run_id.to_string(),
            task_id,
            stats,
        };

        debug!(url = %self.url, run_id = %run_id, task_id = %task_id, ?stats, "POST update_task");
        let response = self.client.post(&self.url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reporter_for(remote: String) -> HttpReporter {
        HttpReporter::new(&Config {
            remote,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_report_posts_update_task() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/update_task"))
            .and(body_json(serde_json::json!({
                "username": "alice",
                "password": "secret",
                "run_id": "51a4f2",
                "task_id": 3,
                "stats": {"wins": 17, "losses": 4, "draws": 5},
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        reporter_for(mock_server.uri())
            .report(
                &WorkerInfo::new("alice", "secret", 2),
                &RunId::new("51a4f2"),
                TaskId::new(3),
                RunStats::new(17, 4, 5),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_report_non_success_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let result = reporter_for(mock_server.uri())
            .report(
                &WorkerInfo::new("alice", "secret", 2),
                &RunId::new("r"),
                TaskId::new(0),
                RunStats::default(),
            )
            .await;
        assert!(matches!(result, Err(ReportError::Status(500))));
    }

    #[tokio::test]
    async fn test_report_transport_error() {
        // Bind and release a port so nothing is listening on it.
        let closed_uri = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };

        let result = reporter_for(closed_uri)
            .report(
                &WorkerInfo::new("alice", "secret", 2),
                &RunId::new("r"),
                TaskId::new(0),
                RunStats::default(),
            )
            .await;
        assert!(matches!(result, Err(ReportError::Http(_))));
    }

    #[tokio::test]
    async fn test_unanswered_report_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3600)))
            .mount(&mock_server)
            .await;

        let reporter = HttpReporter::new(&Config {
            remote: mock_server.uri(),
            request_timeout: Duration::from_millis(100),
            ..Default::default()
        })
        .unwrap();

        let result = reporter
            .report(
                &WorkerInfo::new("alice", "secret", 2),
                &RunId::new("r"),
                TaskId::new(0),
                RunStats::default(),
            )
            .await;
        match result {
            Err(ReportError::Http(e)) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
