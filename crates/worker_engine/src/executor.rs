use std::borrow::Borrow;

use chrono::Utc;
use worker_logging::{worker_debug, worker_info, JobContext};
use worker_model::{HashedReport, State, Work};

use crate::consumer::{Consumer, HtmlConsumer, JsonConsumer};
use crate::error::JobError;
use crate::hash::ReportHasher;
use crate::reader::{HtmlReader, JsonReader, SourceReader};
use crate::sanitise::ReportSanitiser;

/// Runs one job end to end: read, consume, sanitise, hash.
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, work: &Work) -> Result<State, JobError>;
}

/// Executor pairing a reader with the consumer for the document it yields.
#[derive(Clone)]
pub struct SourceJobExecutor<R, C> {
    reader: R,
    consumer: C,
    sanitiser: ReportSanitiser,
    hasher: ReportHasher,
}

pub type HtmlJobExecutor = SourceJobExecutor<HtmlReader, HtmlConsumer>;
pub type JsonJobExecutor = SourceJobExecutor<JsonReader, JsonConsumer>;

impl<R, C> SourceJobExecutor<R, C>
where
    C: Consumer,
{
    pub fn new(reader: R, consumer: C) -> Self {
        Self {
            reader,
            consumer,
            sanitiser: ReportSanitiser,
            hasher: ReportHasher,
        }
    }

    /// Everything after the read. Records left empty by sanitising are dropped.
    fn process(&self, document: &C::Source, work: &Work) -> Result<State, JobError> {
        let _context = JobContext::enter(work.id.as_str());
        let reports = self.consumer.consume(document, work)?;

        let mut data = Vec::with_capacity(reports.len());
        for report in &reports {
            let clean = self.sanitiser.sanitise(report, &work.source.location);
            if clean.is_empty() {
                worker_debug!("dropping record emptied by sanitising");
                continue;
            }
            let hash = self.hasher.hash(&clean)?;
            data.push(HashedReport {
                report: clean,
                hash,
            });
        }

        worker_info!("produced {} of {} records", data.len(), reports.len());
        Ok(State {
            id: work.id.clone(),
            last_updated: Utc::now(),
            data,
        })
    }
}

#[async_trait::async_trait]
impl<R, C> JobExecutor for SourceJobExecutor<R, C>
where
    R: SourceReader,
    C: Consumer + Send + Sync,
    R::Document: Borrow<C::Source>,
{
    async fn execute(&self, work: &Work) -> Result<State, JobError> {
        {
            let _context = JobContext::enter(work.id.as_str());
            worker_info!("reading {} source {}", work.source.kind, work.source.location);
        }
        let document = self.reader.read(&work.source.location).await?;
        self.process(document.borrow(), work)
    }
}
