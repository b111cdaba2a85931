//! Per-job scratch directories.

use std::path::{Path, PathBuf};

use tracing::{error, info};

use super::WorkerError;

/// Scratch directory `<root>/<job_id>` holding a job's downloads.
#[derive(Debug, Clone)]
pub struct JobWorkspace {
    job_id: String,
    dir: PathBuf,
}

impl JobWorkspace {
    /// Create (or reuse) the workspace for `job_id` under `root`.
    pub fn create(root: &Path, job_id: &str) -> Result<Self, WorkerError> {
        validate_job_id(job_id)?;
        let dir = root.join(job_id);
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            job_id: job_id.to_string(),
            dir,
        })
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Remove the workspace and everything in it. Failures are logged.
    pub fn cleanup(&self) {
        if !self.dir.exists() {
            return;
        }
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => info!("Cleaned up temporary files for job: {}", self.job_id),
            Err(e) => error!(
                "Error cleaning up temp files for job {}: {}",
                self.job_id, e
            ),
        }
    }
}

/// Job ids become directory names, so they must be a single path segment.
fn validate_job_id(job_id: &str) -> Result<(), WorkerError> {
    let invalid = job_id.is_empty()
        || job_id == "."
        || job_id == ".."
        || job_id.contains(['/', '\\', '\0']);
    if invalid {
        return Err(WorkerError::InvalidJobId(job_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_cleanup() {
        let root = tempfile::tempdir().unwrap();
        let workspace = JobWorkspace::create(root.path(), "job-123").unwrap();
        assert_eq!(workspace.path(), root.path().join("job-123"));
        assert!(workspace.path().is_dir());

        std::fs::write(workspace.path().join("subs.vtt"), "WEBVTT").unwrap();
        workspace.cleanup();
        assert!(!workspace.path().exists());

        // Cleaning twice is harmless.
        workspace.cleanup();
    }

    #[test]
    fn test_rejects_path_like_job_ids() {
        let root = tempfile::tempdir().unwrap();
        for bad in ["", ".", "..", "a/b", "..\\x"] {
            assert!(
                matches!(
                    JobWorkspace::create(root.path(), bad),
                    Err(WorkerError::InvalidJobId(_))
                ),
                "{bad:?}"
            );
        }
    }
}
