use crate::{
    error::Result,
    models::GenerationConfig,
    pipeline::{CoverPipeline, RunReport},
};

/// Holds the last completed run for whoever renders results.
///
/// A run only lands here once it has finished, and it replaces the previous
/// one wholesale. A rejected run leaves the previous result in place.
#[derive(Debug, Default)]
pub struct Session {
    last: Option<RunReport>,
    completed_runs: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&RunReport> {
        self.last.as_ref()
    }

    pub fn completed_runs(&self) -> usize {
        self.completed_runs
    }

    pub fn replace(&mut self, report: RunReport) -> &RunReport {
        self.completed_runs += 1;
        self.last.insert(report)
    }

    /// Forget the last result. The run counter keeps counting.
    pub fn clear(&mut self) {
        self.last = None;
    }
}

/// Drives the pipeline on behalf of a front end and keeps its session.
pub struct RunHandler {
    pipeline: CoverPipeline,
    session: Session,
}

impl RunHandler {
    pub fn new(pipeline: CoverPipeline) -> Self {
        Self {
            pipeline,
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub async fn submit(&mut self, config: &GenerationConfig) -> Result<&RunReport> {
        let report = self.pipeline.run(config).await?;
        Ok(self.session.replace(report))
    }
}
