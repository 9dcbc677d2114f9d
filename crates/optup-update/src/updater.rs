//! Per-tool update orchestration
//!
//! A release tool moves through
//! `Start -> Probing -> {UpToDate | UpdateNeeded} -> Fetching -> Extracting -> Relinking -> Done`.
//! Any failing step ends the run in `Failed` and skips everything after it.
//! Release metadata is queried once per run and handed down to the steps
//! that need it. Tools are processed strictly one after another; one tool
//! failing does not stop the next from being attempted.

use optup_core::types::{Layout, ReleaseSource, RuntimeConfig, ToolDescriptor, ToolKind};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::download::{ArchiveFetcher, ProgressSink, TracingProgress};
use crate::error::{Stage, UpdateError, UpdateFailure};
use crate::extract::SafeExtractor;
use crate::git;
use crate::link::LinkManager;
use crate::probe::{InstalledVersion, VersionProbe};
use crate::releases::{http_client, ReleaseClient, ReleaseInfo};
use crate::version::{is_newer, VersionId};

/// States of a single tool update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateState {
    Start,
    Probing,
    UpToDate,
    UpdateNeeded,
    Fetching,
    Extracting,
    Relinking,
    Syncing,
    Done,
    Failed(String),
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateState::Failed(reason) => write!(f, "Failed({})", reason),
            other => write!(f, "{:?}", other),
        }
    }
}

/// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Installed build is already the latest; nothing was fetched or written
    UpToDate { version: VersionId },

    /// A newer build was installed and the command link repointed
    Updated {
        from: VersionId,
        to: VersionId,
        install_dir: PathBuf,
        link: PathBuf,
    },

    /// A git-based tool was fetched and pulled
    Synced { checkout: PathBuf },
}

/// Result of a successful tool run
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub tool: String,
    pub outcome: UpdateOutcome,
    /// Every state entered, starting with `Start`
    pub transitions: Vec<UpdateState>,
}

/// Result of a check-only run
#[derive(Debug, Clone)]
pub enum CheckReport {
    Release {
        tool: String,
        installed: InstalledVersion,
        latest: ReleaseInfo,
        update_available: bool,
        profile_dir: Option<String>,
    },
    Git {
        tool: String,
        checkout: PathBuf,
        present: bool,
    },
}

/// Tracks the state sequence of one run
struct Run<'a> {
    tool: &'a str,
    transitions: Vec<UpdateState>,
}

impl<'a> Run<'a> {
    fn new(tool: &'a str) -> Self {
        Self {
            tool,
            transitions: vec![UpdateState::Start],
        }
    }

    fn enter(&mut self, state: UpdateState) {
        debug!("{}: -> {}", self.tool, state);
        self.transitions.push(state);
    }

    fn fail(&mut self, stage: Stage, source: UpdateError) -> UpdateFailure {
        self.enter(UpdateState::Failed(source.to_string()));
        UpdateFailure::new(self.tool, stage, source)
    }

    fn finish(self, outcome: UpdateOutcome) -> UpdateReport {
        UpdateReport {
            tool: self.tool.to_string(),
            outcome,
            transitions: self.transitions,
        }
    }
}

/// Drives probe, compare, fetch, extract and relink for each tool
pub struct Updater {
    layout: Layout,
    probe: VersionProbe,
    fetcher: ArchiveFetcher,
    extractor: SafeExtractor,
    links: LinkManager,
    progress: Box<dyn ProgressSink>,
}

impl Updater {
    /// Create an updater from runtime configuration and a resolved layout
    pub fn new(config: &RuntimeConfig, layout: Layout) -> Result<Self, UpdateError> {
        let client = http_client(&config.network)?;
        let releases = ReleaseClient::new(
            client.clone(),
            config.network.feed_url.clone(),
            config.platform.clone(),
        );
        let fetcher =
            ArchiveFetcher::new(client).with_chunk_size(config.network.download_chunk_size);

        Ok(Self {
            probe: VersionProbe::new(layout.install_root.clone(), releases),
            links: LinkManager::new(layout.bin_dir.clone(), layout.install_root.clone()),
            extractor: SafeExtractor::new(),
            fetcher,
            layout,
            progress: Box::new(TracingProgress),
        })
    }

    /// Replace the progress sink used for downloads
    pub fn with_progress(mut self, progress: Box<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Update each tool in order, continuing past failures
    pub async fn update_all(
        &self,
        tools: &[&ToolDescriptor],
    ) -> Vec<Result<UpdateReport, UpdateFailure>> {
        let mut results = Vec::with_capacity(tools.len());
        for tool in tools {
            info!("Updating {}", tool.name);
            let result = self.update(tool).await;
            if let Err(failure) = &result {
                error!("{}", failure);
            }
            results.push(result);
        }
        results
    }

    /// Update one tool
    pub async fn update(&self, tool: &ToolDescriptor) -> Result<UpdateReport, UpdateFailure> {
        match &tool.kind {
            ToolKind::Release(source) => self.update_release(tool, source).await,
            ToolKind::Git(_) => self.update_git(tool).await,
        }
    }

    /// Probe and compare without fetching or writing anything
    pub async fn check(&self, tool: &ToolDescriptor) -> Result<CheckReport, UpdateFailure> {
        match &tool.kind {
            ToolKind::Release(source) => {
                let (installed, latest) = self
                    .probe_release(tool, source)
                    .await
                    .map_err(|e| UpdateFailure::new(&tool.name, Stage::Probing, e))?;
                let update_available = is_newer(&latest.build, &installed.version);
                let profile_dir = tool.render_profile_dir(&installed.version.major_minor());

                Ok(CheckReport::Release {
                    tool: tool.name.clone(),
                    installed,
                    latest,
                    update_available,
                    profile_dir,
                })
            }
            ToolKind::Git(_) => {
                let checkout = self.git_checkout(tool);
                Ok(CheckReport::Git {
                    tool: tool.name.clone(),
                    present: checkout.is_dir(),
                    checkout,
                })
            }
        }
    }

    async fn update_release(
        &self,
        tool: &ToolDescriptor,
        source: &ReleaseSource,
    ) -> Result<UpdateReport, UpdateFailure> {
        let mut run = Run::new(&tool.name);

        run.enter(UpdateState::Probing);
        let (installed, release) = self
            .probe_release(tool, source)
            .await
            .map_err(|e| run.fail(Stage::Probing, e))?;

        debug!(
            "latest: \"{}\", installed: \"{}\"",
            release.build, installed.version
        );

        if !is_newer(&release.build, &installed.version) {
            info!("Already on the latest version: \"{}\"", release.build);
            run.enter(UpdateState::UpToDate);
            return Ok(run.finish(UpdateOutcome::UpToDate {
                version: installed.version,
            }));
        }

        run.enter(UpdateState::UpdateNeeded);
        info!("Installing version \"{}\"", release.build);

        run.enter(UpdateState::Fetching);
        let archive = self
            .layout
            .download_dir
            .join(release.download.file_name());
        self.fetcher
            .fetch(
                &release.download.url,
                &archive,
                release.download.size,
                self.progress.as_ref(),
            )
            .await
            .map_err(|e| run.fail(Stage::Fetching, e))?;

        run.enter(UpdateState::Extracting);
        let dir_name = self
            .extractor
            .extract(&archive, &self.layout.install_root)
            .map_err(|e| run.fail(Stage::Extracting, e))?;

        run.enter(UpdateState::Relinking);
        let link = self
            .links
            .relink(tool, &dir_name)
            .map_err(|e| run.fail(Stage::Relinking, e))?;

        run.enter(UpdateState::Done);
        info!("{} updated {} -> {}", tool.name, installed.version, release.build);

        Ok(run.finish(UpdateOutcome::Updated {
            from: installed.version,
            to: release.build,
            install_dir: self.layout.install_root.join(&dir_name),
            link,
        }))
    }

    async fn update_git(&self, tool: &ToolDescriptor) -> Result<UpdateReport, UpdateFailure> {
        let mut run = Run::new(&tool.name);
        let checkout = self.git_checkout(tool);

        run.enter(UpdateState::Syncing);
        git::sync(tool, &checkout)
            .await
            .map_err(|e| run.fail(Stage::Syncing, e))?;

        run.enter(UpdateState::Done);
        Ok(run.finish(UpdateOutcome::Synced { checkout }))
    }

    /// Installed version first: a missing installation never costs a feed query
    async fn probe_release(
        &self,
        tool: &ToolDescriptor,
        source: &ReleaseSource,
    ) -> Result<(InstalledVersion, ReleaseInfo), UpdateError> {
        let installed = self.probe.installed(tool)?;
        let latest = self.probe.latest_remote(source).await?;
        Ok((installed, latest))
    }

    fn git_checkout(&self, tool: &ToolDescriptor) -> PathBuf {
        tool.git_checkout(&self.layout.install_root)
            .unwrap_or_else(|| self.layout.install_root.join(&tool.name))
    }
}
