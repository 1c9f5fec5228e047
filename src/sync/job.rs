use super::{
    ActivityDestination, ActivitySource, Decision, DecisionPrompt, SyncError, SyncOptions,
    UploadErrorPolicy,
};
use crate::common::metrics;
use crate::common::types::{ActivityRecord, UploadOutcome};
use function_timer::time;
use tracing::{debug, error, info, warn};

/// Orchestrator states. Authorization and login happen before a job is
/// created, so a job starts out `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Ready,
    PresentingCandidate,
    AwaitingDecision,
    Transferring,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// The user chose to exit before the catalog ran out.
    pub exited_early: bool,
}

pub struct SyncJob<'a> {
    source: &'a dyn ActivitySource,
    destination: &'a dyn ActivityDestination,
    options: SyncOptions,
    state: SyncState,
    report: SyncReport,
}

impl<'a> SyncJob<'a> {
    pub fn new(
        source: &'a dyn ActivitySource,
        destination: &'a dyn ActivityDestination,
        options: SyncOptions,
    ) -> Self {
        Self {
            source,
            destination,
            options,
            state: SyncState::Ready,
            report: SyncReport::default(),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Lists the source's activities and walks them one at a time, asking
    /// `prompt` what to do with each. Transfers run strictly one after another.
    #[time("sync_activities_duration")]
    pub async fn run(&mut self, prompt: &mut dyn DecisionPrompt) -> Result<SyncReport, SyncError> {
        let mut catalog = self.source.list_activities().await?;

        loop {
            let Some(activity) = catalog.next() else {
                info!("No more activities to sync");
                break;
            };

            self.transition(SyncState::PresentingCandidate);
            prompt.present(&activity);

            self.transition(SyncState::AwaitingDecision);
            match prompt.decide() {
                Decision::Exit => {
                    self.report.exited_early = true;
                    break;
                }
                Decision::Skip => {
                    debug!("Skipping activity {}", activity.id);
                    self.report.skipped += 1;
                    metrics::increment_activities_skipped();
                }
                Decision::Upload => {
                    self.transition(SyncState::Transferring);
                    match self.transfer(&activity).await {
                        Ok(_) => {
                            self.report.uploaded += 1;
                            metrics::increment_activities_uploaded();
                        }
                        Err(e) => {
                            self.report.failed += 1;
                            metrics::increment_activities_failed();
                            match self.options.on_upload_error {
                                UploadErrorPolicy::Abort => {
                                    self.transition(SyncState::Done);
                                    return Err(e);
                                }
                                UploadErrorPolicy::Continue => {
                                    error!("Failed to transfer activity {}: {}", activity.id, e);
                                }
                            }
                        }
                    }
                }
            }
        }

        self.transition(SyncState::Done);
        info!(
            "Sync finished: {} uploaded, {} skipped, {} failed",
            self.report.uploaded, self.report.skipped, self.report.failed
        );
        Ok(self.report.clone())
    }

    async fn transfer(&self, activity: &ActivityRecord) -> Result<UploadOutcome, SyncError> {
        let payload = self.source.export(activity.id).await?;
        if payload.is_empty() {
            warn!("Activity {} exported an empty TCX file", activity.id);
        }
        let outcome = self
            .destination
            .upload(&activity.name, self.options.private, &payload)
            .await?;
        Ok(outcome)
    }

    fn transition(&mut self, next: SyncState) {
        debug!("Sync state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
