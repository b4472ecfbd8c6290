use anyhow::{Context, Result};
use futures_util::future::join_all;
use serde_json::Value;
use worker_engine::JobExecutorFactory;
use worker_logging::worker_warn;
use worker_model::{ErrorCode, State, Work, WorkError};

pub type Outcome = Result<State, WorkError>;

/// Parsed input entry: a valid job, or the failure to report for it.
pub type Submission = Result<Work, WorkError>;

/// Reads one job object or a list of them. Entries that are not valid jobs
/// become `INTERNAL` errors keyed by their `id` when one is readable.
pub fn parse_submissions(input: &str) -> Result<Vec<Submission>> {
    let value: Value = serde_json::from_str(input).context("work input is not valid JSON")?;
    let entries = match value {
        Value::Array(items) => items,
        single => vec![single],
    };
    Ok(entries.into_iter().map(parse_work).collect())
}

fn parse_work(entry: Value) -> Submission {
    let id = entry
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string);
    serde_json::from_value(entry).map_err(|err| {
        worker_warn!("rejecting malformed work {:?}: {}", id, err);
        WorkError::new(id, ErrorCode::Internal, format!("malformed work: {err}"))
    })
}

/// Executes every valid submission concurrently; outcomes keep input order.
pub async fn execute_all(factory: &JobExecutorFactory, submissions: Vec<Submission>) -> Vec<Outcome> {
    join_all(submissions.into_iter().map(|submission| async move {
        match submission {
            Ok(work) => factory.execute(&work).await,
            Err(err) => Err(err),
        }
    }))
    .await
}

/// One JSON document per outcome: the state on success, the error otherwise.
pub fn render_outcome(outcome: &Outcome, pretty: bool) -> Result<String> {
    let value = match outcome {
        Ok(state) => serde_json::to_value(state)?,
        Err(err) => serde_json::to_value(err)?,
    };
    let rendered = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use worker_engine::{JobError, JobExecutor};

    struct Echo;

    #[async_trait::async_trait]
    impl JobExecutor for Echo {
        async fn execute(&self, work: &Work) -> std::result::Result<State, JobError> {
            serde_json::from_value(json!({
                "id": work.id,
                "lastUpdated": "2024-01-01T00:00:00Z",
                "data": [{ "description": "d", "hash": "h" }]
            }))
            .map_err(JobError::from)
        }
    }

    fn factory() -> JobExecutorFactory {
        JobExecutorFactory::from_executors(Arc::new(Echo), Arc::new(Echo))
    }

    #[test]
    fn single_object_and_lists_are_accepted() {
        let single = parse_submissions(
            r#"{"id": "a", "source": {"location": "https://x", "type": "html"}}"#,
        )
        .unwrap();
        assert_eq!(single.len(), 1);
        assert!(single[0].is_ok());

        let list = parse_submissions(
            r#"[{"id": "a", "source": {"location": "https://x", "type": "html"}}, {"id": "b"}]"#,
        )
        .unwrap();
        assert_eq!(list.len(), 2);
        let err = list[1].as_ref().unwrap_err();
        assert_eq!(err.id.as_deref(), Some("b"));
        assert_eq!(err.code, ErrorCode::Internal);
    }

    #[test]
    fn invalid_json_input_is_an_error() {
        assert!(parse_submissions("{not json").is_err());
    }

    #[tokio::test]
    async fn outcomes_keep_input_order() {
        let submissions = parse_submissions(
            r#"[
                {"id": "1", "source": {"location": "https://x", "type": "json"}},
                {"id": "2", "source": {"location": "https://x", "type": "rss"}},
                {"id": "3", "source": {"location": "https://x", "type": "html"}}
            ]"#,
        )
        .unwrap();

        let outcomes = execute_all(&factory(), submissions).await;
        assert_eq!(outcomes[0].as_ref().unwrap().id, "1");
        let err = outcomes[1].as_ref().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnhandledSourceType);
        assert_eq!(err.id.as_deref(), Some("2"));
        assert_eq!(outcomes[2].as_ref().unwrap().id, "3");
    }

    #[tokio::test]
    async fn outcomes_render_as_dispatcher_json() {
        let work = parse_submissions(r#"{"id": "9", "source": {"location": "https://x", "type": "html"}}"#)
            .unwrap();
        let outcomes = execute_all(&factory(), work).await;
        let rendered = render_outcome(&outcomes[0], false).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&rendered).unwrap(),
            json!({
                "id": "9",
                "lastUpdated": "2024-01-01T00:00:00Z",
                "data": [{ "description": "d", "hash": "h" }]
            })
        );

        let failure: Outcome = Err(WorkError::new(None, ErrorCode::Internal, "boom"));
        let rendered = render_outcome(&failure, true).unwrap();
        assert!(rendered.contains("\"code\": \"INTERNAL\""));
    }
}
