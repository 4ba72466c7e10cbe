//! Job search agent

use std::sync::Arc;

use async_trait::async_trait;
use tower::BoxError;
use tracing::{info, warn};

use crate::{
    agents::records::{job_id, record_slug, JobPosting, JobStore},
    server::executor::{ExecutionContext, Skill, SkillOutput},
};

/// Company searched when the request does not name one
pub const DEFAULT_COMPANY: &str = "Google";

/// One raw search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobListing {
    pub title: String,
    pub description: String,
    pub url: String,
}

/// Backend the search agent queries for postings
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn search(&self, company: &str) -> Result<Vec<JobListing>, BoxError>;
}

/// Offline source producing two placeholder postings per company
#[derive(Debug, Clone, Default)]
pub struct TemplateJobSource;

impl TemplateJobSource {
    pub fn listings(company: &str) -> Vec<JobListing> {
        ["Software Engineer", "Data Scientist"]
            .iter()
            .enumerate()
            .map(|(i, role)| JobListing {
                title: format!("{} {}", company, role),
                description: "Job description placeholder...".to_string(),
                url: format!("http://example.com/job{}", i + 1),
            })
            .collect()
    }
}

#[async_trait]
impl JobSource for TemplateJobSource {
    async fn search(&self, company: &str) -> Result<Vec<JobListing>, BoxError> {
        Ok(Self::listings(company))
    }
}

/// What a request to the search agent asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchRequest {
    FindJobs { company: String },
    JobDetails { job_id: String },
    Other,
}

impl SearchRequest {
    /// Classify request text; the subject is always its last word
    pub fn parse(text: &str) -> Self {
        let lower = text.to_lowercase();
        let last_word = text
            .split_whitespace()
            .last()
            .map(|w| w.trim_end_matches(|c: char| matches!(c, '.' | '?' | '!' | ',')))
            .filter(|w| !w.is_empty());

        if lower.contains("find jobs") || lower.contains("search") {
            SearchRequest::FindJobs {
                company: last_word.unwrap_or(DEFAULT_COMPANY).to_string(),
            }
        } else if lower.contains("get job details") || lower.contains("job id") {
            match last_word {
                Some(id) => SearchRequest::JobDetails {
                    job_id: id.to_string(),
                },
                None => SearchRequest::Other,
            }
        } else {
            SearchRequest::Other
        }
    }
}

/// Finds postings for a company and serves stored ones by id
pub struct SearchSkill {
    source: Arc<dyn JobSource>,
    jobs: JobStore,
}

impl SearchSkill {
    pub fn new(source: Arc<dyn JobSource>, jobs: JobStore) -> Self {
        Self { source, jobs }
    }

    /// Search for `company` and persist every posting found
    ///
    /// An empty answer from the source falls back to placeholder postings.
    pub async fn search_jobs(&self, company: &str) -> Result<Vec<JobPosting>, BoxError> {
        let mut listings = self.source.search(company).await?;
        if listings.is_empty() {
            warn!(company, "no search results, using placeholder postings");
            listings = TemplateJobSource::listings(company);
        }

        let mut postings = Vec::with_capacity(listings.len());
        for (i, listing) in listings.into_iter().enumerate() {
            let posting = JobPosting {
                id: job_id(company, i),
                title: listing.title,
                company: company.to_string(),
                description: listing.description,
                url: listing.url,
            };
            self.jobs.save(&posting).await?;
            postings.push(posting);
        }

        info!(company, found = postings.len(), "job search finished");
        Ok(postings)
    }

    /// Stored document of a posting, or a not-found notice
    ///
    /// The id is looked up the way search results were named, so `Zürich_0`
    /// finds the posting saved as `z_rich_0`.
    pub async fn job_details(&self, job_id: &str) -> Result<String, BoxError> {
        Ok(self
            .jobs
            .load_raw(&record_slug(job_id))
            .await?
            .unwrap_or_else(|| format!("Job with ID {} not found.", job_id)))
    }
}

#[async_trait]
impl Skill for SearchSkill {
    async fn invoke(&self, text: &str, _: &ExecutionContext) -> Result<SkillOutput, BoxError> {
        let reply = match SearchRequest::parse(text) {
            SearchRequest::FindJobs { company } => {
                let postings = self.search_jobs(&company).await?;
                format!(
                    "I searched for jobs at {} and found {} results.",
                    company,
                    postings.len()
                )
            }
            SearchRequest::JobDetails { job_id } => {
                let details = self.job_details(&job_id).await?;
                format!("Details for job {}: {}", job_id, details)
            }
            SearchRequest::Other => format!(
                "I received your message: {}. I am a Search Agent and I can find jobs for you.",
                text
            ),
        };
        Ok(SkillOutput::Completed(reply))
    }
}
