//! Update (and check) the requested tools

use anyhow::{bail, Result};
use optup_core::types::{Layout, ToolDescriptor};
use optup_core::HierarchicalConfigLoader;
use optup_update::{
    CheckReport, ProgressBarSink, ProgressSink, TracingProgress, UpdateFailure, UpdateOutcome,
    UpdateReport, Updater,
};
use tracing::debug;

use crate::cli::Cli;
use crate::output;

pub async fn run(args: &Cli) -> Result<()> {
    let loader = HierarchicalConfigLoader::new()?;
    let config = loader.load_runtime_config()?;
    let registry = loader.load_tool_registry()?;
    let tools = registry.select(args.tools.as_slice())?;

    let mut layout = Layout::resolve(&config.layout)?;
    if let Some(root) = &args.install_root {
        layout.install_root = root.clone();
    }
    if let Some(bin) = &args.bin_dir {
        layout.bin_dir = bin.clone();
    }
    debug!("Layout: {:?}", layout);

    let updater = Updater::new(&config, layout)?.with_progress(progress_sink(args));

    if args.check {
        return check(&updater, &tools, args.quiet).await;
    }

    let results = updater.update_all(&tools).await;
    report(&results, args.quiet)
}

fn progress_sink(args: &Cli) -> Box<dyn ProgressSink> {
    if args.quiet || args.no_progress || !console::Term::stderr().is_term() {
        Box::new(TracingProgress)
    } else {
        Box::new(ProgressBarSink::new())
    }
}

/// Print one line per tool; fail if any tool failed
fn report(results: &[Result<UpdateReport, UpdateFailure>], quiet: bool) -> Result<()> {
    let mut failed = 0usize;

    for result in results {
        match result {
            Ok(report) if !quiet => print_outcome(report),
            Ok(_) => {}
            Err(failure) => {
                failed += 1;
                output::error(&failure.to_string());
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} tool(s) failed to update", failed, results.len());
    }
    Ok(())
}

fn print_outcome(report: &UpdateReport) {
    match &report.outcome {
        UpdateOutcome::UpToDate { version } => {
            output::success(&format!(
                "{}: already on the latest version {}",
                report.tool, version
            ));
        }
        UpdateOutcome::Updated {
            from,
            to,
            install_dir,
            link,
        } => {
            output::success(&format!("{}: updated {} -> {}", report.tool, from, to));
            output::kv("installed", &install_dir.display().to_string());
            output::kv("link", &link.display().to_string());
        }
        UpdateOutcome::Synced { checkout } => {
            output::success(&format!(
                "{}: synced {}",
                report.tool,
                checkout.display()
            ));
        }
    }
}

async fn check(updater: &Updater, tools: &[&ToolDescriptor], quiet: bool) -> Result<()> {
    let mut failed = 0usize;

    for tool in tools {
        let spinner = (!quiet).then(|| output::spinner(&format!("Checking {}...", tool.name)));
        let result = updater.check(tool).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        match result {
            Ok(report) if !quiet => print_check(&report),
            Ok(_) => {}
            Err(failure) => {
                failed += 1;
                output::error(&failure.to_string());
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} tool(s) could not be checked", failed, tools.len());
    }
    Ok(())
}

fn print_check(report: &CheckReport) {
    match report {
        CheckReport::Release {
            tool,
            installed,
            latest,
            update_available,
            profile_dir,
        } => {
            if *update_available {
                output::info(&format!(
                    "{}: update available {} -> {}",
                    tool, installed.version, latest.build
                ));
            } else {
                output::success(&format!("{}: up to date ({})", tool, installed.version));
            }
            output::kv("installed in", &installed.dir.display().to_string());
            if let Some(version) = &latest.version {
                output::kv("release", version);
            }
            if let Some(profile) = profile_dir {
                output::kv("profile", profile);
            }
        }
        CheckReport::Git {
            tool,
            checkout,
            present,
        } => {
            if *present {
                output::info(&format!("{}: git checkout at {}", tool, checkout.display()));
            } else {
                output::error(&format!("{}: no checkout at {}", tool, checkout.display()));
            }
        }
    }
}
