use std::path::{Path, PathBuf};

use crate::error::CaptureError;

use super::types::CaptureConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseDirSource {
    Explicit,
    Executable,
    WorkingDir,
}

/// The directory the logs are written to, and how it was chosen.
#[derive(Debug, Clone)]
pub struct BaseDir {
    pub path: PathBuf,
    pub source: BaseDirSource,
    /// Why the executable's directory could not be used, if it wasn't.
    pub fallback_reason: Option<String>,
}

pub fn resolve_log_dir(cfg: &CaptureConfig) -> Result<BaseDir, CaptureError> {
    if let Some(dir) = cfg.log_dir.as_deref() {
        return Ok(BaseDir {
            path: dir.to_path_buf(),
            source: BaseDirSource::Explicit,
            fallback_reason: None,
        });
    }
    resolve_from(std::env::current_exe(), std::env::current_dir)
}

fn resolve_from(
    exe: std::io::Result<PathBuf>,
    cwd: impl FnOnce() -> std::io::Result<PathBuf>,
) -> Result<BaseDir, CaptureError> {
    let exe_err = match exe {
        Ok(exe) => match exe.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => {
                return Ok(BaseDir {
                    path: dir.to_path_buf(),
                    source: BaseDirSource::Executable,
                    fallback_reason: None,
                })
            }
            None => format!("executable {} has no parent directory", exe.display()),
        },
        Err(e) => format!("get executable failed: {e}"),
    };

    match cwd() {
        Ok(path) => Ok(BaseDir {
            path,
            source: BaseDirSource::WorkingDir,
            fallback_reason: Some(exe_err),
        }),
        Err(e) => Err(CaptureError::BaseDir(format!(
            "{exe_err}; get working directory failed: {e}"
        ))),
    }
}

impl BaseDir {
    pub fn join(&self, file: impl AsRef<Path>) -> PathBuf {
        self.path.join(file)
    }
}
