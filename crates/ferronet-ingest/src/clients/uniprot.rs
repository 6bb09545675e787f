//! UniProt ID mapping service
//!
//! A mapping job is submitted, polled until it reaches a terminal status and
//! then read. The job is driven as an explicit state machine so the poll
//! interval, backoff, poll limit and cancellation stay under caller control.

use crate::config::{http_client, UniProtConfig};
use crate::error::{IngestError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const FROM_KEGG: &str = "KEGG";
pub const TO_SWISS_PROT: &str = "UniProtKB-Swiss-Prot";
pub const TO_ENSEMBL: &str = "Ensembl";

/// Statuses that mean "poll again"
const PENDING_STATUSES: [&str; 3] = ["NEW", "QUEUED", "RUNNING"];
const FINISHED_STATUS: &str = "FINISHED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRequest {
    pub from_db: String,
    pub to_db: String,
    pub ids: Vec<String>,
    pub tax_id: Option<i64>,
}

impl MappingRequest {
    pub fn new(from_db: impl Into<String>, to_db: impl Into<String>, ids: Vec<String>) -> Self {
        Self {
            from_db: from_db.into(),
            to_db: to_db.into(),
            ids,
            tax_id: None,
        }
    }

    pub fn with_tax_id(mut self, tax_id: i64) -> Self {
        self.tax_id = Some(tax_id);
        self
    }
}

/// Mapped pairs and the ids the service could not map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingResults {
    pub mapped: HashMap<String, String>,
    pub failed: Vec<String>,
}

impl MappingResults {
    fn extend(&mut self, other: MappingResults) {
        for (from, to) in other.mapped {
            self.mapped.entry(from).or_insert(to);
        }
        self.failed.extend(other.failed);
    }
}

/// Lifecycle of one mapping job
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Submitted { job_id: String },
    Running { job_id: String, polls: u32, wait: Duration },
    Done { job_id: String, results: MappingResults },
    Failed { job_id: String, status: String },
}

/// What one status poll reported
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Pending(String),
    Finished,
    Results(MappingResults),
    Failed(String),
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    #[serde(rename = "jobId")]
    job_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MappedTo {
    Entry {
        #[serde(rename = "primaryAccession")]
        primary_accession: String,
    },
    Plain(String),
}

#[derive(Debug, Deserialize)]
struct MappedPair {
    from: String,
    to: MappedTo,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(rename = "jobStatus")]
    job_status: Option<String>,
    results: Option<Vec<MappedPair>>,
    #[serde(rename = "failedIds", default)]
    failed_ids: Vec<String>,
}

impl StatusResponse {
    fn outcome(self, to_db: &str) -> PollOutcome {
        if let Some(results) = self.results {
            return PollOutcome::Results(collect_results(results, self.failed_ids, to_db));
        }
        match self.job_status.as_deref() {
            Some(status) if PENDING_STATUSES.contains(&status) => PollOutcome::Pending(status.to_string()),
            Some(FINISHED_STATUS) => PollOutcome::Finished,
            Some(status) => PollOutcome::Failed(status.to_string()),
            None => PollOutcome::Failed("MISSING_STATUS".to_string()),
        }
    }
}

fn collect_results(pairs: Vec<MappedPair>, failed: Vec<String>, to_db: &str) -> MappingResults {
    let strip_version = to_db.to_lowercase().contains("ensembl");
    let mut mapped = HashMap::with_capacity(pairs.len());
    for pair in pairs {
        let to = match pair.to {
            MappedTo::Entry { primary_accession } => primary_accession,
            MappedTo::Plain(value) => value,
        };
        let to = if strip_version { strip_version_suffix(&to).to_string() } else { to };
        mapped.entry(pair.from).or_insert(to);
    }
    MappingResults { mapped, failed }
}

/// `ENSG00000167468.19` → `ENSG00000167468`
pub fn strip_version_suffix(id: &str) -> &str {
    id.split_once('.').map_or(id, |(stable, _)| stable)
}

pub struct IdMappingClient {
    client: reqwest::Client,
    config: UniProtConfig,
    cancel: CancellationToken,
}

impl IdMappingClient {
    pub fn new(config: UniProtConfig) -> Result<Self> {
        config.validate()?;
        let client = http_client(config.timeout_secs)?;
        Ok(Self {
            client,
            config,
            cancel: CancellationToken::new(),
        })
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn next_wait(&self, wait: Duration) -> Duration {
        wait.mul_f64(self.config.backoff_factor)
            .min(self.config.max_poll_interval())
    }

    async fn sleep_or_cancel(&self, wait: Duration) -> Result<()> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(IngestError::Cancelled),
            _ = tokio::time::sleep(wait) => Ok(()),
        }
    }

    /// Submit a job, retrying transient failures
    pub async fn submit(&self, request: &MappingRequest) -> Result<String> {
        let mut last_error = None;

        for attempt in 1..=self.config.max_retries.max(1) {
            if self.cancel.is_cancelled() {
                return Err(IngestError::Cancelled);
            }
            match self.submit_once(request).await {
                Ok(job_id) => return Ok(job_id),
                Err(err) => {
                    warn!("ID mapping submit attempt {}/{} failed: {}", attempt, self.config.max_retries, err);
                    last_error = Some(err);

                    if attempt < self.config.max_retries {
                        let backoff_secs = 2u64.pow(attempt);
                        self.sleep_or_cancel(Duration::from_secs(backoff_secs)).await?;
                    }
                },
            }
        }

        Err(last_error.unwrap_or_else(|| IngestError::config("UniProt max_retries is 0")))
    }

    async fn submit_once(&self, request: &MappingRequest) -> Result<String> {
        let url = self.url("idmapping/run");
        let ids = request.ids.join(",");
        let mut form: Vec<(&str, String)> = vec![
            ("from", request.from_db.clone()),
            ("to", request.to_db.clone()),
            ("ids", ids),
        ];
        if let Some(tax_id) = request.tax_id {
            form.push(("taxId", tax_id.to_string()));
        }

        let response = self.client.post(&url).form(&form).send().await?;
        if !response.status().is_success() {
            return Err(IngestError::Service {
                url,
                status: response.status().as_u16(),
            });
        }
        let run: RunResponse = response.json().await?;
        debug!(job_id = %run.job_id, ids = request.ids.len(), "Submitted ID mapping job");
        Ok(run.job_id)
    }

    /// Ask the service once for the status of a job
    pub async fn poll(&self, job_id: &str, to_db: &str) -> Result<PollOutcome> {
        let url = self.url(&format!("idmapping/status/{}", job_id));
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(IngestError::Service {
                url,
                status: response.status().as_u16(),
            });
        }
        let status: StatusResponse = response.json().await?;
        Ok(status.outcome(to_db))
    }

    async fn fetch_results(&self, job_id: &str, to_db: &str) -> Result<MappingResults> {
        let url = self.url(&format!("idmapping/results/{}", job_id));
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(IngestError::Service {
                url,
                status: response.status().as_u16(),
            });
        }
        let status: StatusResponse = response.json().await?;
        Ok(collect_results(status.results.unwrap_or_default(), status.failed_ids, to_db))
    }

    /// Advance a job by one transition
    pub async fn step(&self, state: JobState, to_db: &str) -> Result<JobState> {
        match state {
            JobState::Submitted { job_id } => Ok(JobState::Running {
                job_id,
                polls: 0,
                wait: self.config.poll_interval(),
            }),
            JobState::Running { job_id, polls, wait } => {
                if polls >= self.config.max_polls {
                    return Err(IngestError::PollLimitExceeded { job_id, polls });
                }
                self.sleep_or_cancel(wait).await?;

                match self.poll(&job_id, to_db).await? {
                    PollOutcome::Pending(status) => {
                        debug!(%job_id, %status, polls = polls + 1, "ID mapping job pending");
                        Ok(JobState::Running {
                            job_id,
                            polls: polls + 1,
                            wait: self.next_wait(wait),
                        })
                    },
                    PollOutcome::Finished => {
                        let results = self.fetch_results(&job_id, to_db).await?;
                        Ok(JobState::Done { job_id, results })
                    },
                    PollOutcome::Results(results) => Ok(JobState::Done { job_id, results }),
                    PollOutcome::Failed(status) => Ok(JobState::Failed { job_id, status }),
                }
            },
            terminal => Ok(terminal),
        }
    }

    /// Submit a job and drive it to completion
    pub async fn run_job(&self, request: &MappingRequest) -> Result<MappingResults> {
        let mut state = JobState::Submitted {
            job_id: self.submit(request).await?,
        };

        loop {
            state = match self.step(state, &request.to_db).await? {
                JobState::Done { results, .. } => return Ok(results),
                JobState::Failed { job_id, status } => {
                    return Err(IngestError::JobFailed { job_id, status })
                },
                running => running,
            };
        }
    }

    /// Map `ids` in batches of the configured size
    ///
    /// A batch whose job fails is recorded as failed ids and the remaining
    /// batches still run. Cancellation stops the whole conversion.
    pub async fn batch_convert(
        &self,
        from_db: &str,
        to_db: &str,
        ids: &[String],
        tax_id: Option<i64>,
    ) -> Result<MappingResults> {
        let mut combined = MappingResults::default();

        for (position, batch) in ids.chunks(self.config.batch_size).enumerate() {
            let mut request = MappingRequest::new(from_db, to_db, batch.to_vec());
            request.tax_id = tax_id;

            match self.run_job(&request).await {
                Ok(results) => combined.extend(results),
                Err(IngestError::Cancelled) => return Err(IngestError::Cancelled),
                Err(err) => {
                    warn!(batch = position + 1, size = batch.len(), error = %err, "ID mapping batch failed");
                    combined.failed.extend(batch.iter().cloned());
                },
            }
        }

        info!(
            from = from_db,
            to = to_db,
            requested = ids.len(),
            mapped = combined.mapped.len(),
            failed = combined.failed.len(),
            "ID mapping complete"
        );
        Ok(combined)
    }
}
