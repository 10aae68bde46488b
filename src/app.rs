use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::domain::{SearchQuery, SearchSession, SequenceRecord};
use crate::error::KiraError;
use crate::genbank;
use crate::ncbi::NcbiClient;
use crate::plot;
use crate::report;
use crate::store::OutputStore;

#[derive(Debug, Clone, Serialize)]
pub struct SearchSummary {
    pub tax_id: String,
    pub term: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    NoRecords {
        search: SearchSummary,
    },
    Saved {
        search: SearchSummary,
        fetched: usize,
        truncated: bool,
        csv_path: String,
        plot_path: String,
        finished_at: String,
    },
}

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Searching { term: String },
    Found { count: usize },
    Fetching { retmax: usize, count: usize },
    Fetched { records: usize, elapsed: Duration },
    Writing { csv_path: String, plot_path: String },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Searching { term } => write!(f, "phase=Search; term={term}"),
            ProgressEvent::Found { count } => write!(f, "phase=Search; count={count}"),
            ProgressEvent::Fetching { retmax, count } => {
                write!(f, "phase=Fetch; retmax={retmax} of {count}")
            }
            ProgressEvent::Fetched { records, elapsed } => write!(
                f,
                "phase=Fetch; records={records} latency_ms={}",
                elapsed.as_millis()
            ),
            ProgressEvent::Writing {
                csv_path,
                plot_path,
            } => write!(f, "phase=Report; writing {csv_path} and {plot_path}"),
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct App<N: NcbiClient> {
    ncbi: N,
    output: OutputStore,
}

impl<N: NcbiClient> App<N> {
    pub fn new(ncbi: N, output: OutputStore) -> Self {
        Self { ncbi, output }
    }

    /// Search, fetch and report. Nothing is written unless every stage
    /// succeeds; a zero count returns before any fetch.
    pub fn run(
        &self,
        query: &SearchQuery,
        sink: &dyn ProgressSink,
    ) -> Result<RunOutcome, KiraError> {
        let term = query.term();
        sink.event(ProgressEvent::Searching { term: term.clone() });
        let session = self.ncbi.search(query)?;
        tracing::info!(count = session.count, "search complete");
        sink.event(ProgressEvent::Found {
            count: session.count,
        });

        let search = SearchSummary {
            tax_id: query.tax_id.to_string(),
            term,
            count: session.count,
        };
        if session.count == 0 {
            return Ok(RunOutcome::NoRecords { search });
        }

        let records = self.fetch(&session, sink)?;

        let csv_name = OutputStore::csv_name(&query.tax_id);
        let plot_name = OutputStore::plot_name(&query.tax_id);
        let csv_path = self.output.csv_path(&query.tax_id);
        let plot_path = self.output.plot_path(&query.tax_id);
        sink.event(ProgressEvent::Writing {
            csv_path: csv_path.to_string(),
            plot_path: plot_path.to_string(),
        });

        let staging = self.output.stage()?;
        let mut table = report::tabulate(&records, &staging.path(&csv_name))?;
        plot::plot(&mut table, &staging.path(&plot_name))?;
        staging.commit(&[plot_name.as_str(), csv_name.as_str()])?;
        tracing::info!(%csv_path, %plot_path, "report saved");

        Ok(RunOutcome::Saved {
            search,
            fetched: records.len(),
            truncated: session.is_truncated(),
            csv_path: csv_path.to_string(),
            plot_path: plot_path.to_string(),
            finished_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    fn fetch(
        &self,
        session: &SearchSession,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<SequenceRecord>, KiraError> {
        let retmax = session.fetch_limit();
        if session.is_truncated() {
            tracing::warn!(
                count = session.count,
                retmax,
                "fetch capped; remaining matches are not retrieved"
            );
        }
        sink.event(ProgressEvent::Fetching {
            retmax,
            count: session.count,
        });

        let start = Instant::now();
        let text = self.ncbi.fetch_genbank(session, retmax)?;
        let mut records = genbank::parse_records(&text)?;
        records.truncate(retmax);
        sink.event(ProgressEvent::Fetched {
            records: records.len(),
            elapsed: start.elapsed(),
        });
        Ok(records)
    }
}
