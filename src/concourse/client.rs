use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ConcourseConfig;
use crate::domain::{Acknowledgement, PipelineTrigger};
use crate::error::{Backend, Result, VoyagerError};

/// Resolved endpoint and credentials of a Concourse team
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcourseTarget {
    pub url: String,
    pub team: String,
    pub token: String,
}

/// A build as reported by the Concourse API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub job_name: Option<String>,
    #[serde(default)]
    pub status: String,
    /// Unix seconds
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
}

impl Build {
    /// Seconds between start and end, `None` while the build runs
    pub fn duration_secs(&self) -> Option<i64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if end >= start => Some(end - start),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct TriggerRequest<'a> {
    vars: BTreeMap<&'static str, &'a str>,
}

#[derive(Deserialize)]
struct TriggerResponse {
    id: u64,
    #[serde(default)]
    name: Option<String>,
}

/// Pipeline trigger backed by the Concourse REST API
pub struct ConcourseClient {
    http: Client,
    target: ConcourseTarget,
    pipeline: String,
    release_job: String,
    rollback_job: String,
    timeout_secs: u64,
}

impl ConcourseClient {
    pub fn new(target: ConcourseTarget, config: &ConcourseConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", target.token))
            .map_err(|e| VoyagerError::config(format!("Invalid Concourse token: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VoyagerError::config(format!("Cannot build HTTP client: {}", e)))?;

        Ok(ConcourseClient {
            http,
            target: ConcourseTarget {
                url: target.url.trim_end_matches('/').to_string(),
                ..target
            },
            pipeline: config.pipeline.clone(),
            release_job: config.release_job.clone(),
            rollback_job: config.rollback_job.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn pipeline_name(&self) -> &str {
        &self.pipeline
    }

    fn pipeline_url(&self) -> String {
        format!(
            "{}/api/v1/teams/{}/pipelines/{}",
            self.target.url, self.target.team, self.pipeline
        )
    }

    fn job_for(&self, request: &PipelineTrigger) -> &str {
        if request.is_rollback {
            &self.rollback_job
        } else {
            &self.release_job
        }
    }

    fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response> {
        request.send().map_err(|e| {
            if e.is_timeout() {
                VoyagerError::network(
                    Backend::Pipeline,
                    operation,
                    format!("timed out after {}s", self.timeout_secs),
                )
            } else {
                VoyagerError::network(Backend::Pipeline, operation, e)
            }
        })
    }

    /// Most recent builds of the pipeline, newest first
    pub fn builds(&self, limit: usize) -> Result<Vec<Build>> {
        let operation = "list builds";
        let request = self
            .http
            .get(format!("{}/builds", self.pipeline_url()))
            .query(&[("limit", limit)]);

        let response = self.send(request, operation)?;
        if !response.status().is_success() {
            return Err(unexpected(operation, response));
        }
        response
            .json()
            .map_err(|e| VoyagerError::network(Backend::Pipeline, operation, e))
    }
}

impl super::Pipeline for ConcourseClient {
    fn trigger(&self, request: &PipelineTrigger) -> Result<Acknowledgement> {
        let job = self.job_for(request);
        let operation = format!("trigger {}/{}", self.pipeline, job);

        let mut vars = BTreeMap::new();
        vars.insert("version", request.version.as_str());
        vars.insert("body", request.body.as_str());
        vars.insert("is_rollback", if request.is_rollback { "true" } else { "false" });

        let url = format!("{}/jobs/{}/builds", self.pipeline_url(), job);
        let response = self.send(self.http.post(url).json(&TriggerRequest { vars }), &operation)?;
        if !response.status().is_success() {
            return Err(unexpected(&operation, response));
        }

        let build: TriggerResponse = response
            .json()
            .map_err(|e| VoyagerError::network(Backend::Pipeline, operation.as_str(), e))?;
        let build_name = build.name.unwrap_or_else(|| "latest".to_string());
        let url = format!(
            "{}/teams/{}/pipelines/{}/jobs/{}/builds/{}",
            self.target.url, self.target.team, self.pipeline, job, build_name
        );

        info!(build = build.id, job, version = %request.version, "pipeline build accepted");
        debug!(%url, "build url");
        Ok(Acknowledgement {
            build_id: Some(build.id),
            build_name: Some(build_name),
            url: Some(url),
        })
    }
}

fn unexpected(operation: &str, response: Response) -> VoyagerError {
    let status = response.status();
    let text = response.text().unwrap_or_default();
    VoyagerError::network(
        Backend::Pipeline,
        operation,
        format!("{} - {}", status.as_u16(), text),
    )
}
