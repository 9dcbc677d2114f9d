//! Git-based tools (version managers kept as a git checkout)
//!
//! These tools have no release feed. Updating one means fetching and pulling
//! its checkout in place.

use optup_core::types::ToolDescriptor;
use std::io;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, UpdateError};

/// Fetch and pull the checkout of a git-based tool
pub async fn sync(tool: &ToolDescriptor, checkout: &Path) -> Result<()> {
    if !checkout.is_dir() {
        return Err(UpdateError::NotInstalled {
            tool: tool.name.clone(),
            root: checkout.to_path_buf(),
        });
    }

    let bare = git(checkout, &["rev-parse", "--is-bare-repository"]).await?;
    if bare.trim() == "true" {
        return Err(UpdateError::Git {
            dir: checkout.to_path_buf(),
            reason: "bare repository".to_string(),
        });
    }

    info!("FETCH {}", tool.name);
    git(checkout, &["fetch", "--progress"]).await?;

    info!("PULL {}", tool.name);
    git(checkout, &["pull", "--progress"]).await?;

    Ok(())
}

/// Run a git command in `dir`, returning stdout. Progress output on stderr is logged.
async fn git(dir: &Path, args: &[&str]) -> Result<String> {
    debug!("git {} in {}", args.join(" "), dir.display());

    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .await
        .map_err(|e| UpdateError::Git {
            dir: dir.to_path_buf(),
            reason: if e.kind() == io::ErrorKind::NotFound {
                "git executable not found".to_string()
            } else {
                format!("failed to run git: {}", e)
            },
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        debug!("git: {}", line.trim());
    }

    if !output.status.success() {
        return Err(UpdateError::Git {
            dir: dir.to_path_buf(),
            reason: format!("'git {}' failed: {}", args.join(" "), stderr.trim()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
