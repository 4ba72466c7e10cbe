//! Flat-file records kept by the domain agents
//!
//! Job postings are stored one JSON document per file under `jobs/`,
//! resumes and submitted applications as text under `resumes/`.

use std::{
    ffi::OsStr,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

/// A job posting as persisted by the search agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub company: String,
    pub description: String,
    pub url: String,
}

/// Id of the `index`-th posting found for `company`
///
/// `"Big Corp"` and `3` give `big_corp_3`.
pub fn job_id(company: &str, index: usize) -> String {
    format!("{}_{}", record_slug(company), index)
}

/// Lowercase `text` and replace every character outside `[a-z0-9_-]` with `_`
///
/// The result always passes [`is_record_id`] unless `text` is empty.
pub fn record_slug(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Ids map straight to file names, so only `[A-Za-z0-9_-]` is accepted
pub fn is_record_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}

/// Job postings, one `<id>.json` file each
#[derive(Debug, Clone)]
pub struct JobStore {
    dir: PathBuf,
}

impl JobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Write a posting, replacing any previous one with the same id
    pub async fn save(&self, posting: &JobPosting) -> std::io::Result<PathBuf> {
        if !is_record_id(&posting.id) {
            return Err(invalid_id(&posting.id));
        }
        fs::create_dir_all(&self.dir).await?;
        let path = self.path(&posting.id);
        let json = serde_json::to_string_pretty(posting)?;
        fs::write(&path, json).await?;
        debug!(path = %path.display(), "saved job posting");
        Ok(path)
    }

    /// Raw stored document of a posting, `None` when there is none
    pub async fn load_raw(&self, id: &str) -> std::io::Result<Option<String>> {
        if !is_record_id(id) {
            return Ok(None);
        }
        read_optional(&self.path(id)).await
    }

    pub async fn load(&self, id: &str) -> std::io::Result<Option<JobPosting>> {
        match self.load_raw(id).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

/// Resumes and the applications written from them
#[derive(Debug, Clone)]
pub struct ResumeStore {
    dir: PathBuf,
}

impl ResumeStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Content of a resume file, `None` when it does not exist
    ///
    /// Only plain file names are looked up; anything with a path component
    /// is treated as missing.
    pub async fn read_resume(&self, file_name: &str) -> std::io::Result<Option<String>> {
        if Path::new(file_name).file_name() != Some(OsStr::new(file_name)) {
            return Ok(None);
        }
        read_optional(&self.dir.join(file_name)).await
    }

    /// Write `application_<job_id>.txt` and return its path
    pub async fn write_application(
        &self,
        job_id: &str,
        job_details: &str,
        resume: &str,
    ) -> std::io::Result<PathBuf> {
        if !is_record_id(job_id) {
            return Err(invalid_id(job_id));
        }
        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("application_{}.txt", job_id));
        let content = format!(
            "Application for Job {}\nDetails: {}\nResume: {}\n",
            job_id, job_details, resume
        );
        fs::write(&path, content).await?;
        debug!(path = %path.display(), "saved application");
        Ok(path)
    }
}

fn invalid_id(id: &str) -> std::io::Error {
    std::io::Error::new(ErrorKind::InvalidInput, format!("invalid job id: {}", id))
}

async fn read_optional(path: &Path) -> std::io::Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
