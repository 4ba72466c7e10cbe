//! The two job agents: search and apply
//!
//! Each agent is a [`Skill`](crate::server::Skill) plus the card it is
//! advertised with.

use std::{path::PathBuf, sync::Arc};

use crate::{
    protocol::{AgentCapabilities, AgentCard, AgentSkill},
    server::Skill,
};

pub mod apply;
pub mod records;
pub mod search;

pub use apply::{ApplyRequest, ApplySkill};
pub use records::{JobPosting, JobStore, ResumeStore};
pub use search::{JobListing, JobSource, SearchRequest, SearchSkill, TemplateJobSource};

pub const AGENT_VERSION: &str = "0.1.0";
pub const DEFAULT_SEARCH_AGENT_URL: &str = "http://localhost:10001";
pub const DEFAULT_APPLY_AGENT_URL: &str = "http://localhost:10002";

/// Where the agents keep their records and how they reach each other
#[derive(Debug, Clone)]
pub struct AgentsConfig {
    /// Root holding `jobs/` and `resumes/`
    pub data_dir: PathBuf,

    /// Search agent queried by the apply agent; `None` uses fallback details
    pub search_agent_url: Option<String>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            search_agent_url: Some(DEFAULT_SEARCH_AGENT_URL.to_string()),
        }
    }
}

impl AgentsConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_search_agent_url(mut self, url: Option<String>) -> Self {
        self.search_agent_url = url;
        self
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.data_dir.join("jobs")
    }

    pub fn resumes_dir(&self) -> PathBuf {
        self.data_dir.join("resumes")
    }

    /// Search skill backed by the offline posting templates
    pub fn search_skill(&self) -> Arc<dyn Skill> {
        Arc::new(SearchSkill::new(
            Arc::new(TemplateJobSource),
            JobStore::new(self.jobs_dir()),
        ))
    }

    pub fn apply_skill(&self) -> Arc<dyn Skill> {
        Arc::new(ApplySkill::new(
            ResumeStore::new(self.resumes_dir()),
            self.search_agent_url.clone(),
        ))
    }
}

pub fn search_card(url: impl Into<String>) -> AgentCard {
    AgentCard::new(
        "Search Agent",
        "Agent that searches for jobs",
        url,
        AGENT_VERSION,
    )
    .with_capabilities(AgentCapabilities::new().with_streaming())
    .with_skill(
        AgentSkill::new(
            "search_jobs_skill",
            "Search Jobs",
            "Searches for jobs by company name",
        )
        .with_tag("search")
        .with_tag("jobs")
        .with_example("Find jobs at Google"),
    )
}

pub fn apply_card(url: impl Into<String>) -> AgentCard {
    AgentCard::new("Apply Agent", "Agent that applies for jobs", url, AGENT_VERSION)
        .with_capabilities(AgentCapabilities::new().with_streaming())
        .with_skill(
            AgentSkill::new(
                "apply_job_skill",
                "Apply Job",
                "Applies for a job given an ID and resume",
            )
            .with_tag("apply")
            .with_tag("jobs")
            .with_example("Apply for job google_0 with my_resume.txt"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cards() {
        let search = search_card(DEFAULT_SEARCH_AGENT_URL);
        assert_eq!(search.name, "Search Agent");
        assert!(search.capabilities.streaming);
        assert_eq!(search.skills[0].id, "search_jobs_skill");
        assert!(search.default_input_modes.contains("text"));

        let apply = apply_card(DEFAULT_APPLY_AGENT_URL);
        assert_eq!(apply.version, "0.1.0");
        assert_eq!(apply.url, DEFAULT_APPLY_AGENT_URL);
        assert!(apply.skills[0].tags.contains("apply"));
    }

    #[test]
    fn test_data_layout() {
        let config = AgentsConfig::new("/tmp/agents").with_search_agent_url(None);

        assert_eq!(config.jobs_dir(), PathBuf::from("/tmp/agents/jobs"));
        assert_eq!(config.resumes_dir(), PathBuf::from("/tmp/agents/resumes"));
        assert!(config.search_agent_url.is_none());
    }
}
