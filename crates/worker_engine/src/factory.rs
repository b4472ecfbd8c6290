use std::sync::Arc;

use worker_logging::{worker_warn, JobContext};
use worker_model::{Source, SourceType, State, Work, WorkError};

use crate::consumer::{HtmlConsumer, JsonConsumer};
use crate::error::JobError;
use crate::executor::{JobExecutor, SourceJobExecutor};
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::reader::{HtmlReader, JsonReader};

/// Picks the executor matching a job's declared source type.
#[derive(Clone)]
pub struct JobExecutorFactory {
    html: Arc<dyn JobExecutor>,
    json: Arc<dyn JobExecutor>,
}

impl JobExecutorFactory {
    pub fn new(settings: FetchSettings) -> Self {
        let fetcher: Arc<dyn Fetcher> = Arc::new(ReqwestFetcher::new(settings));
        Self::from_executors(
            Arc::new(SourceJobExecutor::new(
                HtmlReader::new(fetcher.clone()),
                HtmlConsumer::default(),
            )),
            Arc::new(SourceJobExecutor::new(
                JsonReader::new(fetcher),
                JsonConsumer::default(),
            )),
        )
    }

    pub fn from_executors(html: Arc<dyn JobExecutor>, json: Arc<dyn JobExecutor>) -> Self {
        Self { html, json }
    }

    pub fn create(&self, source: &Source) -> Result<Arc<dyn JobExecutor>, JobError> {
        match &source.kind {
            SourceType::Html => Ok(self.html.clone()),
            SourceType::Json => Ok(self.json.clone()),
            SourceType::Other(kind) => Err(JobError::UnhandledSourceType(kind.clone())),
        }
    }

    /// Dispatches and runs `work`, reporting any failure keyed by its id.
    pub async fn execute(&self, work: &Work) -> Result<State, WorkError> {
        let outcome = match self.create(&work.source) {
            Ok(executor) => executor.execute(work).await,
            Err(err) => Err(err),
        };
        outcome.map_err(|err| {
            let _context = JobContext::enter(work.id.as_str());
            worker_warn!("job failed: {}", err);
            err.into_work_error(Some(work.id.clone()))
        })
    }
}

impl Default for JobExecutorFactory {
    fn default() -> Self {
        Self::new(FetchSettings::default())
    }
}
