//! skillsync doctor - Check tools, authentication and configuration

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok};
use crate::error::{Result, SyncError};

#[derive(Args, Debug)]
pub struct DoctorArgs {}

#[derive(Debug, Serialize)]
pub struct DoctorCheck {
    pub name: &'static str,
    pub ok: bool,
    /// A failing required check makes the command exit non-zero.
    pub required: bool,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub config_path: Option<String>,
    pub healthy: bool,
    pub checks: Vec<DoctorCheck>,
}

pub fn run(ctx: &AppContext, _args: &DoctorArgs) -> Result<()> {
    let mut checks = Vec::new();
    let mut first_failure: Option<SyncError> = None;
    let mut record = |name: &'static str, required: bool, outcome: Result<String>| {
        let (ok, detail) = match outcome {
            Ok(detail) => (true, detail),
            Err(err) => {
                let detail = err.to_string();
                if required && first_failure.is_none() {
                    first_failure = Some(err);
                }
                (false, detail)
            }
        };
        checks.push(DoctorCheck {
            name,
            ok,
            required,
            detail,
        });
    };

    let settings = ctx.settings();
    record(
        "config",
        true,
        settings
            .as_ref()
            .map(|s| format!("canonical {}", s.canonical))
            .map_err(|err| match err {
                SyncError::Config(msg) => SyncError::Config(msg.clone()),
                other => SyncError::Config(other.to_string()),
            }),
    );

    record(
        "git",
        true,
        ctx.vcs.ensure_available().map(|()| ctx.config.tools.git.clone()),
    );

    let needs_gh = settings
        .as_ref()
        .is_ok_and(|s| s.forking.needs_hosting_api());
    let gh_available = ctx.hosting.ensure_available();
    let gh_ok = gh_available.is_ok();
    record(
        "gh",
        needs_gh,
        gh_available.map(|()| ctx.config.tools.gh.clone()),
    );
    if gh_ok {
        record(
            "gh auth",
            needs_gh,
            ctx.hosting
                .ensure_authenticated()
                .and_then(|()| ctx.hosting.current_user())
                .map(|user| format!("logged in as {user}")),
        );
    }

    if let Ok(settings) = &settings {
        let dir = &settings.managed_dir;
        let installed = if ctx.vcs.is_working_copy(dir) {
            Ok(dir.display().to_string())
        } else {
            Err(SyncError::NotInstalled(dir.clone()))
        };
        record("managed dir", false, installed);
    }

    let healthy = first_failure.is_none();
    let report = DoctorReport {
        config_path: ctx
            .config_path
            .as_ref()
            .map(|path| path.display().to_string()),
        healthy,
        checks,
    };

    if ctx.robot_mode {
        emit_json(&robot_ok(&report))?;
    } else {
        let mut layout = HumanLayout::new();
        layout.title("skillsync doctor");
        if let Some(path) = &report.config_path {
            layout.kv("config file", path);
            layout.blank();
        }
        for check in &report.checks {
            layout.check(check.ok, check.name, &check.detail);
        }
        emit_human(layout);
    }

    first_failure.map_or(Ok(()), Err)
}
