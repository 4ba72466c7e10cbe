//! Job application agent
//!
//! Applies for a job by id: the posting is fetched from the search agent,
//! the named resume is read and an application file is written.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tower::BoxError;
use tracing::{info, warn};

use crate::{
    agents::records::ResumeStore,
    client::StreamingAggregator,
    server::executor::{ExecutionContext, Skill, SkillOutput},
};

/// Used when the search agent cannot be asked or has no answer
pub const FALLBACK_JOB_DETAILS: &str = "Mock Job Details";

/// Used when no resume is named or the named one does not exist
pub const FALLBACK_RESUME: &str = "Mock Resume Content";

/// Asked when an application request carries no job id
pub const JOB_ID_PROMPT: &str =
    "Which job should I apply for? Reply with its ID, for example: ID google_0";

/// `ID google_0` or `ID: google_0`
static JOB_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| compile_regex(r"\bID:?\s+(\S+)"));

/// `job google_0`, where the id carries a digit or an underscore
static JOB_WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?i)\bjob\s+([A-Za-z0-9-]*[_0-9][A-Za-z0-9_-]*)"));

/// `using cv.txt` or `with cv.txt`
static RESUME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?i)\b(?:using|with)\s+(\S+\.[A-Za-z0-9]+)"));

fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        // Patterns are constants covered by the tests below
        Err(err) => panic!("invalid regex pattern `{pattern}`: {err}"),
    }
}

fn trim_token(token: &str) -> &str {
    token.trim_end_matches(|c: char| matches!(c, '.' | ',' | '?' | '!' | ';'))
}

/// What a request to the apply agent asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyRequest {
    Apply {
        job_id: Option<String>,
        resume: Option<String>,
    },
    Other,
}

impl ApplyRequest {
    pub fn parse(text: &str) -> Self {
        if !text.to_lowercase().contains("apply") {
            return ApplyRequest::Other;
        }

        let job_id = JOB_ID_REGEX
            .captures(text)
            .or_else(|| JOB_WORD_REGEX.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| trim_token(m.as_str()).to_string())
            .filter(|id| !id.is_empty());
        let resume = RESUME_REGEX
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| trim_token(m.as_str()).to_string());

        ApplyRequest::Apply { job_id, resume }
    }
}

/// Applies for jobs found by the search agent
pub struct ApplySkill {
    resumes: ResumeStore,
    search_agent_url: Option<String>,
    aggregator: StreamingAggregator,
}

impl ApplySkill {
    pub fn new(resumes: ResumeStore, search_agent_url: Option<String>) -> Self {
        Self {
            resumes,
            search_agent_url,
            aggregator: StreamingAggregator::new(),
        }
    }

    pub fn with_aggregator(mut self, aggregator: StreamingAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Ask the search agent about `job_id`
    pub async fn job_details(&self, job_id: &str) -> String {
        let Some(url) = self.search_agent_url.as_deref() else {
            return FALLBACK_JOB_DETAILS.to_string();
        };

        let question = format!("Get details for job ID: {}", job_id);
        match self.aggregator.run(url, &question).await {
            Ok(details) if !details.trim().is_empty() => details,
            Ok(_) => FALLBACK_JOB_DETAILS.to_string(),
            Err(e) => {
                warn!(%url, job_id, error = %e, "search agent unavailable, using fallback details");
                FALLBACK_JOB_DETAILS.to_string()
            }
        }
    }

    pub async fn read_resume(&self, file_name: Option<&str>) -> Result<String, BoxError> {
        let Some(file_name) = file_name else {
            return Ok(FALLBACK_RESUME.to_string());
        };
        Ok(self
            .resumes
            .read_resume(file_name)
            .await?
            .unwrap_or_else(|| FALLBACK_RESUME.to_string()))
    }

    async fn apply(
        &self,
        job_id: &str,
        resume: Option<&str>,
        context: &ExecutionContext,
    ) -> Result<String, BoxError> {
        let details = self.job_details(job_id).await;
        let resume = self.read_resume(resume).await?;

        if context.cancellation.is_cancelled() {
            return Err("application canceled before it was written".into());
        }

        let path = self
            .resumes
            .write_application(job_id, &details, &resume)
            .await?;
        info!(job_id, path = %path.display(), "application written");

        Ok(format!(
            "Successfully applied for Job {}. Application saved to {}.",
            job_id,
            path.display()
        ))
    }
}

#[async_trait]
impl Skill for ApplySkill {
    async fn invoke(&self, text: &str, context: &ExecutionContext) -> Result<SkillOutput, BoxError> {
        // A reply to our question is read together with the original request
        let request = if context.is_resumed() {
            let mut texts = context.previous_texts();
            texts.push(text.to_string());
            texts.join(" ")
        } else {
            text.to_string()
        };

        let (job_id, resume) = match ApplyRequest::parse(&request) {
            ApplyRequest::Apply { job_id, resume } => (job_id, resume),
            ApplyRequest::Other => {
                return Ok(SkillOutput::Completed(format!(
                    "I received your message: {}. I am an Apply Agent.",
                    text
                )))
            }
        };

        let job_id = job_id.or_else(|| {
            let mut words = text.split_whitespace();
            match (context.is_resumed(), words.next(), words.next()) {
                (true, Some(word), None) => Some(trim_token(word).to_string()),
                _ => None,
            }
        });
        let Some(job_id) = job_id else {
            return Ok(SkillOutput::NeedsInput(JOB_ID_PROMPT.to_string()));
        };

        let status = self.apply(&job_id, resume.as_deref(), context).await?;
        Ok(SkillOutput::Completed(format!(
            "Application request processed for job {}. Status: {}",
            job_id, status
        )))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    use crate::protocol::{Message, Task, TaskState};

    use super::*;

    fn context(previous: Option<&str>) -> ExecutionContext {
        let current_task = previous.map(|text| {
            Task::new("t1", "c1")
                .with_status(TaskState::InputRequired)
                .with_history_message(Message::user(text))
        });
        ExecutionContext {
            task_id: "t1".into(),
            context_id: "c1".into(),
            message: Message::user("unused"),
            current_task,
            cancellation: CancellationToken::new(),
        }
    }

    fn skill(temp: &TempDir) -> ApplySkill {
        ApplySkill::new(ResumeStore::new(temp.path()), None)
    }

    #[test]
    fn test_parse_requests() {
        assert_eq!(
            ApplyRequest::parse("Apply for ID google_0 using cv.txt"),
            ApplyRequest::Apply {
                job_id: Some("google_0".into()),
                resume: Some("cv.txt".into()),
            }
        );
        assert_eq!(
            ApplyRequest::parse("Apply for job google_0 with my_resume.txt"),
            ApplyRequest::Apply {
                job_id: Some("google_0".into()),
                resume: Some("my_resume.txt".into()),
            }
        );
        assert_eq!(
            ApplyRequest::parse("please apply for this job"),
            ApplyRequest::Apply {
                job_id: None,
                resume: None,
            }
        );
        assert_eq!(ApplyRequest::parse("hello"), ApplyRequest::Other);
    }

    #[tokio::test]
    async fn test_apply_writes_application() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("cv.txt"), "Ten years of Rust").unwrap();
        let skill = skill(&temp);

        let output = skill
            .invoke("Apply for ID acme_1 using cv.txt", &context(None))
            .await
            .unwrap();

        let path = temp.path().join("application_acme_1.txt");
        assert_eq!(
            output,
            SkillOutput::Completed(format!(
                "Application request processed for job acme_1. Status: Successfully applied for Job acme_1. Application saved to {}.",
                path.display()
            ))
        );
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("Details: Mock Job Details"));
        assert!(written.contains("Resume: Ten years of Rust"));
    }

    #[tokio::test]
    async fn test_missing_resume_uses_fallback() {
        let temp = TempDir::new().unwrap();

        skill(&temp)
            .invoke("apply to ID acme_2 using nope.txt", &context(None))
            .await
            .unwrap();

        let written = std::fs::read_to_string(temp.path().join("application_acme_2.txt")).unwrap();
        assert!(written.contains("Resume: Mock Resume Content"));
    }

    #[tokio::test]
    async fn test_missing_job_id_asks_for_input() {
        let temp = TempDir::new().unwrap();

        let output = skill(&temp)
            .invoke("I want to apply", &context(None))
            .await
            .unwrap();

        assert_eq!(output, SkillOutput::NeedsInput(JOB_ID_PROMPT.to_string()));
    }

    #[tokio::test]
    async fn test_bare_reply_resumes_application() {
        let temp = TempDir::new().unwrap();

        let output = skill(&temp)
            .invoke("acme_3", &context(Some("I want to apply")))
            .await
            .unwrap();

        assert!(matches!(output, SkillOutput::Completed(ref text) if text.starts_with("Application request processed for job acme_3.")));
        assert!(temp.path().join("application_acme_3.txt").exists());
    }

    #[tokio::test]
    async fn test_unreachable_search_agent_falls_back() {
        let temp = TempDir::new().unwrap();
        let skill = ApplySkill::new(
            ResumeStore::new(temp.path()),
            Some("http://127.0.0.1:9".to_string()),
        );

        assert_eq!(skill.job_details("acme_0").await, FALLBACK_JOB_DETAILS);
    }

    #[tokio::test]
    async fn test_other_text_is_introduced() {
        let temp = TempDir::new().unwrap();

        let output = skill(&temp).invoke("hi", &context(None)).await.unwrap();

        assert_eq!(
            output,
            SkillOutput::Completed("I received your message: hi. I am an Apply Agent.".into())
        );
    }
}
