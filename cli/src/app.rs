//! CLI 装配层：确定日志目录、打开四个日志文件、构建 Supervisor，并把结果映射为退出码。
use std::sync::Arc;

use lspcap_core::api::{
    exit_code, resolve_log_dir, CaptureConfig, CaptureError, CaptureLog, ChildCommand,
    ExitPolicy, MarkerFilter, ParentStreams, RelayLogs, Supervisor, SupervisorError,
};

use crate::commands::cli::Args;

/// Fixed defaults plus the few things the command line may change.
pub fn build_config(args: &Args) -> CaptureConfig {
    let mut cfg = CaptureConfig {
        log_dir: args.log_dir.clone(),
        ..CaptureConfig::default()
    };
    if args.propagate_exit_code {
        cfg.exit_policy = ExitPolicy::Propagate;
    }
    if let Ok(v) = std::env::var("RUST_LOG") {
        if !v.trim().is_empty() {
            cfg.logging.level = v;
        }
    }
    cfg
}

/// Runs one capture session and returns the process exit code.
///
/// Errors are startup failures that happened before the child could be
/// launched; everything after that is folded into the exit code.
pub async fn run_app(cfg: CaptureConfig, cmd: ChildCommand) -> Result<i32, CaptureError> {
    let base = resolve_log_dir(&cfg)?;
    let capture = CaptureLog::create(base.join(&cfg.files.capture))?;
    let dispatch = capture.dispatch(&cfg.logging.level)?;

    let logs = tracing::dispatcher::with_default(&dispatch, || {
        tracing::info!(dir = %base.path.display(), source = ?base.source, "capture started");
        if let Some(reason) = &base.fallback_reason {
            tracing::warn!(%reason, "executable directory unavailable, using working directory");
        }
        tracing::debug!(config = ?cfg, "effective config");
        RelayLogs::open(&base, &cfg.files).inspect_err(|e| {
            tracing::error!(error = %e, "can not open relay log");
        })
    })?;

    let filter = Arc::new(MarkerFilter::new(&cfg.filter.marker));
    let supervisor = Supervisor::new(cfg.relay.clone(), filter, dispatch.clone());
    let result = supervisor.run(&cmd, ParentStreams::inherit(), logs).await;
    let code = exit_code(&result, cfg.exit_policy);

    if let Err(e @ (SupervisorError::Start { .. } | SupervisorError::Pipe { .. })) = &result {
        eprintln!("lspcap: {e}");
    }
    tracing::dispatcher::with_default(&dispatch, || match &result {
        Ok(_) => tracing::info!(exit_code = code, "supervisor exiting"),
        Err(e) => tracing::error!(exit_code = code, error = %e, "supervisor exiting"),
    });
    Ok(code)
}
