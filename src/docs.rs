//! HTML documentation through the external AsyncAPI generator (`npx ag`).

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

pub const HTML_TEMPLATE: &str = "@asyncapi/html-template";

#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    #[error("failed to create docs directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not launch `{program}` (is Node.js installed?): {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("documentation generator exited with {0}")]
    Failed(ExitStatus),
}

#[derive(Debug, Clone)]
pub struct DocsJob<'a> {
    pub schema: &'a Path,
    pub out_dir: &'a Path,
    pub version: &'a str,
}

impl DocsJob<'_> {
    pub fn command(&self) -> Command {
        let mut cmd = Command::new("npx");
        cmd.arg("ag")
            .arg(absolute(self.schema))
            .arg(HTML_TEMPLATE)
            .arg("--output")
            .arg(absolute(self.out_dir))
            .arg("--force-write")
            .arg("--param")
            .arg(format!("version={}", self.version))
            .arg("--param")
            .arg(r#"config={"expand": {"messageExamples": true}}"#)
            .env("PUPPETEER_SKIP_CHROMIUM_DOWNLOAD", "true");
        cmd
    }

    pub fn run(&self) -> Result<(), DocsError> {
        std::fs::create_dir_all(self.out_dir).map_err(|source| DocsError::CreateDir {
            path: self.out_dir.to_path_buf(),
            source,
        })?;
        let mut cmd = self.command();
        tracing::info!(command = ?cmd, "building docs");
        let status = cmd.status().map_err(|source| DocsError::Launch {
            program: cmd.get_program().to_string_lossy().into_owned(),
            source,
        })?;
        if !status.success() {
            return Err(DocsError::Failed(status));
        }
        Ok(())
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
