//! skillsync install - Clone the fork into the managed directory

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json, robot_ok, spinner};
use crate::error::Result;
use crate::utils::format_names;
use crate::workflow::{InstallOutcome, InstallReport, InstallWorkflow};

#[derive(Args, Debug)]
pub struct InstallArgs {}

pub fn run(ctx: &AppContext, _args: &InstallArgs) -> Result<()> {
    let settings = ctx.settings()?;
    let sync = ctx.sync_context(&settings);

    let bar = spinner(
        format!("Installing into {}", settings.managed_dir.display()),
        ctx.robot_mode,
    );
    let result = InstallWorkflow::new(&sync).run();
    bar.finish_and_clear();
    let report = result?;

    if ctx.robot_mode {
        return emit_json(&robot_ok(&report));
    }
    emit_human(render(&report));
    Ok(())
}

fn render(report: &InstallReport) -> HumanLayout {
    let mut layout = HumanLayout::new();
    match &report.outcome {
        InstallOutcome::Installed => {
            layout.title(&format!(
                "{} Installed {}",
                "✓".green(),
                report.managed_dir.display()
            ));
        }
        InstallOutcome::Updated { update } => {
            layout.title(&format!(
                "{} Already installed; updated from {}",
                "✓".green(),
                update.synced_from
            ));
        }
    }

    if let Some(origin) = &report.origin {
        layout.kv("origin", origin);
    }
    if let Some(upstream) = &report.upstream {
        layout.kv("upstream", upstream);
    }
    layout.kv("restored", &format_names(&report.restored));
    if !report.kept.is_empty() {
        layout.kv("kept (newer)", &format_names(&report.kept));
    }
    if !report.executables.is_empty() {
        layout.kv("executable", &format_names(&report.executables));
    }
    if let Some(snapshot) = &report.snapshot {
        let label = if report.moved_aside {
            "previous tree"
        } else {
            "backup"
        };
        layout.kv(label, &snapshot.display().to_string());
    }
    layout
}
