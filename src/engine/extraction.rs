//! Per-stream extraction state machine
//!
//! ```text
//! START ──fetch──▶ FETCHING ──cursor──▶ FETCHING ──…──▶ DONE
//!                     │                    │
//!                     └──────error─────────┴──────────▶ FAILED
//! ```
//!
//! Pages are pulled one at a time with [`StreamExtraction::next_page`]; the
//! records of a page are handed to the caller and nothing is buffered across
//! calls, so dropping the extraction at any point is safe.

use super::cursor::{PageCursor, PageCursorTracker};
use super::records::{Record, RecordExtractor, parse_body};
use crate::client::{GapiClient, RetryPolicy, Transport};
use crate::error::{ExtractError, StreamFailure};
use crate::etl::Extractor;
use crate::streams::{PaginationMode, StreamDescriptor};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};

/// Query parameter carrying the cursor on follow-up requests
pub const NEXT_TOKEN_PARAM: &str = "nextToken";

/// Runs streams against the GAPI client.
///
/// One engine serves every stream of a run; they all share its client and
/// therefore its cached token.
pub struct ExtractionEngine<T> {
    client: GapiClient<T>,
    retry: RetryPolicy,
}

impl<T: Transport> ExtractionEngine<T> {
    pub fn new(client: GapiClient<T>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn client(&self) -> &GapiClient<T> {
        &self.client
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Begin extracting `descriptor`. No request is made until the first
    /// [`next_page`](StreamExtraction::next_page).
    pub fn start<'a>(&'a self, descriptor: &'a StreamDescriptor) -> StreamExtraction<'a, T> {
        StreamExtraction {
            engine: self,
            descriptor,
            records: RecordExtractor::new(descriptor.records_path().clone()),
            cursors: descriptor
                .last_evaluated_key_path()
                .cloned()
                .map(PageCursorTracker::new),
            state: State::Start,
            summary: StreamSummary::new(descriptor.name()),
        }
    }

    /// Run `descriptor` to completion and collect every record.
    ///
    /// Meant for small streams and tests; [`start`](Self::start) is the
    /// streaming interface.
    pub async fn extract_all(
        &self,
        descriptor: &StreamDescriptor,
    ) -> Result<(Vec<Record>, StreamSummary), StreamFailure> {
        let mut extraction = self.start(descriptor);
        let mut records = Vec::new();
        while let Some(page) = extraction.next_page().await? {
            records.extend(page.records);
        }
        Ok((records, extraction.into_summary()))
    }
}

/// One fetched page.
#[derive(Debug)]
pub struct Page {
    /// 1-based page number within the run
    pub number: usize,
    pub records: Vec<Record>,
    /// Cursor for the following page; `None` on the last page
    pub next_cursor: Option<PageCursor>,
}

/// Counters for one stream run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct StreamSummary {
    pub stream: String,
    pub pages: usize,
    pub records: usize,
    /// HTTP requests issued, retries included
    pub requests: u32,
    /// Cursor of the first page not yet processed; persist it to resume
    #[serde(skip)]
    pub resume_cursor: Option<PageCursor>,
}

impl StreamSummary {
    fn new(stream: &str) -> Self {
        Self {
            stream: stream.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug)]
enum State {
    Start,
    Fetching(PageCursor),
    Done,
    Failed,
}

/// An in-progress extraction of one stream.
pub struct StreamExtraction<'a, T> {
    engine: &'a ExtractionEngine<T>,
    descriptor: &'a StreamDescriptor,
    records: RecordExtractor,
    cursors: Option<PageCursorTracker>,
    state: State,
    summary: StreamSummary,
}

impl<'a, T: Transport> StreamExtraction<'a, T> {
    pub fn descriptor(&self) -> &StreamDescriptor {
        self.descriptor
    }

    pub fn summary(&self) -> &StreamSummary {
        &self.summary
    }

    pub fn into_summary(self) -> StreamSummary {
        self.summary
    }

    /// True once DONE or FAILED.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Done | State::Failed)
    }

    /// Fetch the next page.
    ///
    /// Returns `Ok(None)` once the stream is exhausted (or has failed).
    ///
    /// # Errors
    /// Any non-retryable error, or a transient one that outlived the retry
    /// budget, moves the extraction to FAILED and is returned with the
    /// stream name and the request that failed.
    pub async fn next_page(&mut self) -> Result<Option<Page>, StreamFailure> {
        let cursor = match &self.state {
            State::Start => None,
            State::Fetching(cursor) => Some(cursor.clone()),
            State::Done | State::Failed => return Ok(None),
        };

        match self.fetch(cursor.as_ref()).await {
            Ok(page) => {
                self.summary.pages = page.number;
                self.summary.records += page.records.len();
                self.summary.resume_cursor = page.next_cursor.clone();
                self.state = match &page.next_cursor {
                    Some(next) => State::Fetching(next.clone()),
                    None => State::Done,
                };

                log::debug!(
                    "{}: page {} yielded {} record(s){}",
                    self.descriptor.name(),
                    page.number,
                    page.records.len(),
                    if page.next_cursor.is_some() {
                        ", more to follow"
                    } else {
                        ""
                    }
                );
                if matches!(self.state, State::Done) {
                    log::info!(
                        "{}: {} record(s) in {} page(s)",
                        self.descriptor.name().cyan(),
                        self.summary.records,
                        self.summary.pages
                    );
                }
                Ok(Some(page))
            }
            Err((request, error)) => {
                self.state = State::Failed;
                // The cursor that failed to load is where a rerun would resume
                self.summary.resume_cursor = cursor;
                Err(StreamFailure::new(self.descriptor.name(), request, error))
            }
        }
    }

    /// One FETCHING step: request (with retries), parse, extract, find cursor.
    async fn fetch(&mut self, cursor: Option<&PageCursor>) -> Result<Page, (String, ExtractError)> {
        let descriptor = self.descriptor;
        let client = self.engine.client();

        let mut query = descriptor.default_query().to_vec();
        if let Some(cursor) = cursor {
            let token = cursor
                .to_query_value()
                .map_err(|e| (format!("GET {}", descriptor.path()), e))?;
            query.push((NEXT_TOKEN_PARAM.to_string(), token));
        }

        let url = client
            .url_for(descriptor.path(), &query)
            .map_err(|e| (format!("GET {}", descriptor.path()), e))?;
        let request = format!("GET {url}");

        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let url_ref = &url;
        let body = self
            .engine
            .retry
            .run(descriptor.name(), move || {
                attempts.fetch_add(1, Ordering::SeqCst);
                client.fetch(url_ref)
            })
            .await;
        self.summary.requests += counter.load(Ordering::SeqCst);
        let body = body.map_err(|e| (request.clone(), e))?;

        let document = parse_body(&body).map_err(|e| (request.clone(), e))?;
        let records = self
            .records
            .extract(&document)
            .map_err(|e| (request.clone(), e))?;
        if records.is_empty() {
            if let Some(reason) = self.records.envelope_mismatch(&document) {
                log::warn!("{}: page yielded no records: {reason}", descriptor.name());
            }
        }

        let next_cursor = match (descriptor.pagination_mode(), &self.cursors) {
            (PaginationMode::Cursor, Some(tracker)) => tracker.next_cursor(&document),
            _ => None,
        };

        Ok(Page {
            number: self.summary.pages + 1,
            records,
            next_cursor,
        })
    }
}

impl<T: Transport> Extractor for StreamExtraction<'_, T> {
    type Item = Record;

    /// One page per batch. A failure surfaces as an [`eyre::Report`] wrapping
    /// the [`StreamFailure`], recoverable with `downcast_ref`.
    async fn next_batch(&mut self) -> eyre::Result<Option<Vec<Record>>> {
        Ok(self.next_page().await?.map(|page| page.records))
    }
}
