//! Run orchestration
//!
//! A run takes the streams registered for a scope and feeds each, one after
//! another, through an ETL [`Pipeline`]: the engine extracts a page, the
//! [`SchemaConformer`] trims it and a [`RecordSink`] writes it.

use crate::client::Transport;
use crate::engine::{ExtractionEngine, StreamSummary};
use crate::error::{ExtractError, StreamFailure};
use crate::etl::Pipeline;
use crate::storage::{RecordSink, StreamLoader};
use crate::streams::{StreamDescriptor, StreamRegistry};
use crate::transform::SchemaConformer;
use eyre::Result;
use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum StreamOutcome {
    Succeeded,
    Failed { request: String, error: String },
    /// Not attempted because an earlier failure aborted the run
    Skipped,
}

#[derive(Clone, Debug, Serialize)]
pub struct StreamReport {
    #[serde(flatten)]
    pub summary: StreamSummary,
    pub outcome: StreamOutcome,
}

/// What happened to every selected stream.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunReport {
    pub scope: String,
    pub streams: Vec<StreamReport>,
    /// Set when a failure stopped the run before every stream was tried
    pub aborted: bool,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.streams
            .iter()
            .all(|s| s.outcome == StreamOutcome::Succeeded)
    }

    pub fn failed(&self) -> impl Iterator<Item = &StreamReport> {
        self.streams
            .iter()
            .filter(|s| matches!(s.outcome, StreamOutcome::Failed { .. }))
    }

    pub fn total_records(&self) -> usize {
        self.streams.iter().map(|s| s.summary.records).sum()
    }
}

/// Runs the registered streams of a scope into a sink.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tap_gapi::client::{GapiClient, ReqwestTransport, RetryPolicy, TokenProvider};
/// use tap_gapi::engine::ExtractionEngine;
/// use tap_gapi::storage::SingerSink;
/// use tap_gapi::streams::StreamRegistry;
/// use tap_gapi::tap::TapPipeline;
/// use tap_gapi::TapConfig;
///
/// # async fn example(config: TapConfig) -> eyre::Result<()> {
/// let transport = Arc::new(ReqwestTransport::try_new(Duration::from_secs(300))?);
/// let tokens = Arc::new(TokenProvider::new(transport.clone(), config.credentials()?));
/// let client = GapiClient::new(config.base_url()?, transport, tokens);
/// let engine = ExtractionEngine::new(client, RetryPolicy::default());
///
/// let tap = TapPipeline::new(engine, StreamRegistry::builtin()?);
/// let report = tap.run(&config.scope, &mut SingerSink::stdout()).await?;
/// println!("{} records", report.total_records());
/// # Ok(())
/// # }
/// ```
pub struct TapPipeline<T> {
    engine: ExtractionEngine<T>,
    registry: StreamRegistry,
    selected: Vec<String>,
    all_or_nothing: bool,
}

impl<T: Transport> TapPipeline<T> {
    pub fn new(engine: ExtractionEngine<T>, registry: StreamRegistry) -> Self {
        Self {
            engine,
            registry,
            selected: Vec::new(),
            all_or_nothing: false,
        }
    }

    /// Only run the named streams. Empty means all of the scope.
    pub fn with_streams(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.selected = names.into_iter().map(Into::into).collect();
        self
    }

    /// Stop at the first failing stream
    pub fn all_or_nothing(mut self, enabled: bool) -> Self {
        self.all_or_nothing = enabled;
        self
    }

    pub fn engine(&self) -> &ExtractionEngine<T> {
        &self.engine
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    /// Streams a run of `scope` would extract, in run order.
    ///
    /// # Errors
    /// [`ExtractError::Config`] if a selected name isn't registered for the
    /// scope.
    pub fn select(&self, scope: &str) -> Result<Vec<&StreamDescriptor>, ExtractError> {
        let available = self.registry.streams_for(scope);
        if let Some(unknown) = self
            .selected
            .iter()
            .find(|name| !available.iter().any(|d| d.name() == name.as_str()))
        {
            return Err(ExtractError::Config(format!(
                "stream '{unknown}' is not registered for scope '{scope}'"
            )));
        }

        Ok(available
            .iter()
            .filter(|d| self.selected.is_empty() || self.selected.iter().any(|n| n == d.name()))
            .collect())
    }

    /// Extract every selected stream of `scope` into `sink`.
    ///
    /// A failing stream is recorded in the report and the run moves on to
    /// the next one, unless all-or-nothing is set or the failure is an
    /// authentication or configuration error; those stop the run and mark
    /// the remaining streams skipped.
    ///
    /// # Errors
    /// Selection errors and sink failures. Stream failures are reported, not
    /// returned.
    pub async fn run<S: RecordSink + ?Sized>(&self, scope: &str, sink: &mut S) -> Result<RunReport> {
        let descriptors = self.select(scope)?;
        let mut report = RunReport {
            scope: scope.to_string(),
            ..RunReport::default()
        };

        if descriptors.is_empty() {
            log::warn!("No streams registered for scope {}", scope.bright_black());
            sink.finish()?;
            return Ok(report);
        }
        log::info!(
            "Extracting {} stream(s) for scope {}",
            descriptors.len(),
            scope.bright_black()
        );

        for descriptor in descriptors {
            if report.aborted {
                report.streams.push(StreamReport {
                    summary: StreamSummary {
                        stream: descriptor.name().to_string(),
                        ..StreamSummary::default()
                    },
                    outcome: StreamOutcome::Skipped,
                });
                continue;
            }

            let (summary, failure) = self.run_stream(descriptor, sink).await?;
            let outcome = match failure {
                None => StreamOutcome::Succeeded,
                Some(failure) => {
                    log::error!("{}", failure);
                    if self.all_or_nothing || failure.error.is_run_fatal() {
                        log::error!("Aborting run after failure of {}", descriptor.name().cyan());
                        report.aborted = true;
                    }
                    StreamOutcome::Failed {
                        request: failure.request,
                        error: failure.error.to_string(),
                    }
                }
            };
            report.streams.push(StreamReport { summary, outcome });
        }

        sink.finish()?;

        let failed = report.failed().count();
        if failed == 0 {
            log::info!(
                "Extracted {} record(s) from {} stream(s)",
                report.total_records(),
                report.streams.len()
            );
        } else {
            log::warn!(
                "{} of {} stream(s) failed, {} record(s) extracted",
                failed,
                report.streams.len(),
                report.total_records()
            );
        }
        Ok(report)
    }

    async fn run_stream<S: RecordSink + ?Sized>(
        &self,
        descriptor: &StreamDescriptor,
        sink: &mut S,
    ) -> Result<(StreamSummary, Option<StreamFailure>)> {
        log::info!(
            "Extracting {} from {}",
            descriptor.name().cyan(),
            descriptor.path().bright_black()
        );
        sink.begin_stream(descriptor)?;

        let mut pipeline = Pipeline::new(
            self.engine.start(descriptor),
            SchemaConformer::for_stream(descriptor),
            StreamLoader::new(&mut *sink, descriptor.name()),
        );
        let result = pipeline.run().await;
        let (extraction, _, _) = pipeline.into_parts();
        let summary = extraction.into_summary();

        match result {
            Ok(_) => Ok((summary, None)),
            Err(report) => match report.downcast::<StreamFailure>() {
                Ok(failure) => Ok((summary, Some(failure))),
                // Anything else came from the sink and ends the run
                Err(report) => Err(report),
            },
        }
    }
}
