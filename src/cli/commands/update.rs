//! skillsync update - Rebase the managed directory

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok, spinner};
use crate::error::Result;
use crate::utils::format_names;
use crate::workflow::{UpdateMode, UpdateReport, UpdateWorkflow};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Rebase onto the canonical repository instead of your fork
    #[arg(long)]
    pub upstream: bool,
}

impl UpdateArgs {
    #[must_use]
    pub const fn mode(&self) -> UpdateMode {
        if self.upstream {
            UpdateMode::Upstream
        } else {
            UpdateMode::Origin
        }
    }
}

pub fn run(ctx: &AppContext, args: &UpdateArgs) -> Result<()> {
    let settings = ctx.settings()?;
    let sync = ctx.sync_context(&settings);

    let bar = spinner(
        format!("Updating {}", settings.managed_dir.display()),
        ctx.robot_mode,
    );
    let result = UpdateWorkflow::new(&sync).run(args.mode());
    bar.finish_and_clear();
    let report = result?;

    if ctx.robot_mode {
        return emit_json(&robot_ok(&report));
    }
    emit_human(render(&report));
    Ok(())
}

fn render(report: &UpdateReport) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.title(&format!(
        "{} Updated {} from {}",
        "✓".green(),
        report.managed_dir.display(),
        report.synced_from
    ));
    if let Some(branch) = &report.branch {
        layout.kv("branch", branch);
    }
    if report.registered_upstream {
        layout.kv("upstream", "registered");
    }
    if let Some(stash) = &report.stash {
        layout.kv("local edits", &format!("reapplied from {stash}"));
    }
    layout.kv("restored", &format_names(&report.restored));
    if !report.kept.is_empty() {
        layout.kv("kept (newer)", &format_names(&report.kept));
    }
    if let Some(snapshot) = &report.snapshot {
        layout.kv("backup", &snapshot.display().to_string());
    }
    if let Some(hint) = &report.push_hint {
        layout.blank();
        layout.push_line(format!("{} {hint}", "note:".yellow()));
    }
    layout
}
