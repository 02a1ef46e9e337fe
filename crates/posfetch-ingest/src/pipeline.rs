// SPDX-License-Identifier: Apache-2.0

use crate::convert::convert_success;
use crate::store::DestinationStore;
use crate::IngestError;
use posfetch_client::{classify, render_request, ClientError, ProtocolViolation, Transport};
use posfetch_model::{
    BatchPlan, ConvertedRecord, Credentials, Outcome, PipelineConfig, Posident, ServiceErrorCode,
    Tally,
};
use std::fmt::{Display, Formatter};
use tracing::{error, info};

/// A failure that halts the run. Per-identifier rejections and mapping
/// failures are not errors; they live in the report.
#[derive(Debug)]
pub enum PipelineError {
    /// Transport or protocol failure while processing a batch. Earlier
    /// batches are already committed and stay committed.
    Client { batch: usize, source: ClientError },
    /// Destination-store failure; the failing batch was rolled back.
    Persistence { batch: usize, source: IngestError },
    /// Failure preparing the destination before the first batch.
    Setup(IngestError),
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client { batch, source } => write!(f, "batch {batch}: {source}"),
            Self::Persistence { batch, source } => write!(f, "batch {batch}: {source}"),
            Self::Setup(source) => write!(f, "destination setup: {source}"),
        }
    }
}

impl std::error::Error for PipelineError {}

/// Everything a finished run produced, alongside the counters.
#[derive(Debug, Default)]
pub struct RunReport {
    pub tally: Tally,
    pub committed: Vec<ConvertedRecord>,
    pub rejected: Vec<(Posident, ServiceErrorCode)>,
    pub violations: Vec<ProtocolViolation>,
    pub mapping_failures: Vec<(Posident, String)>,
}

impl RunReport {
    /// Identifiers that never reached the destination, each with the
    /// reason, in processing order within each category.
    #[must_use]
    pub fn rejects(&self) -> Vec<(Posident, String)> {
        let mut out: Vec<(Posident, String)> = Vec::new();
        for (posident, code) in &self.rejected {
            out.push((posident.clone(), code.as_wire_str().to_string()));
        }
        for violation in &self.violations {
            out.push((violation.posident.clone(), violation.raw_code.clone()));
        }
        for (posident, reason) in &self.mapping_failures {
            out.push((posident.clone(), reason.clone()));
        }
        out
    }

    /// Emits the closing counters at informational severity.
    pub fn log_summary(&self) {
        info!(
            submitted = self.tally.total_submitted,
            duplicates_removed = self.tally.duplicates_removed,
            batches = self.tally.batch_count,
            success = self.tally.success,
            invalid = self.tally.invalid_identifier,
            expired = self.tally.expired_identifier,
            not_found = self.tally.subject_not_found,
            violations = self.violations.len(),
            mapping_failures = self.mapping_failures.len(),
            "run finished"
        );
    }
}

/// The sequential batch loop: plan, then for each batch render, send,
/// decode, classify, convert, commit.
pub struct Pipeline<'a> {
    transport: &'a dyn Transport,
    credentials: &'a Credentials,
    config: &'a PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        credentials: &'a Credentials,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            transport,
            credentials,
            config,
        }
    }

    /// Runs the whole pipeline against the given identifiers.
    ///
    /// Batches are strictly sequential. A transport or protocol failure
    /// halts the run with earlier batches intact; a rejected identifier or
    /// an unconvertible record only skips that identifier.
    pub fn run(
        &self,
        posidents: &[Posident],
        store: &mut DestinationStore,
    ) -> Result<RunReport, PipelineError> {
        let plan = BatchPlan::build(posidents, self.config.batch_size);
        let mut report = RunReport::default();
        report.tally.record_plan(
            plan.total_submitted(),
            plan.duplicates_removed(),
            plan.batch_count(),
        );
        info!(
            submitted = plan.total_submitted(),
            unique = plan.unique_count(),
            batches = plan.batch_count(),
            batch_size = plan.batch_size(),
            "run planned"
        );
        if plan.is_empty() {
            return Ok(report);
        }

        store
            .ensure_column(&self.config.external_id_column)
            .map_err(PipelineError::Setup)?;
        let destination_columns = store.columns().map_err(PipelineError::Setup)?;

        for (index, batch) in plan.batches().iter().enumerate() {
            let batch_no = index + 1;
            info!(batch = batch_no, of = plan.batch_count(), size = batch.len(), "dispatching batch");

            let request = render_request(self.credentials, batch);
            let response = self
                .transport
                .round_trip(&request)
                .map_err(|source| PipelineError::Client { batch: batch_no, source })?;
            let records = posfetch_client::decode_response(&response, batch)
                .map_err(|source| PipelineError::Client { batch: batch_no, source })?;
            let classified = classify(records, &mut report.tally);
            report.rejected.extend(classified.rejected);
            report.violations.extend(classified.violations);

            let mut converted = Vec::with_capacity(classified.successes.len());
            for record in classified.successes {
                let Outcome::Success {
                    attributes,
                    external_id,
                } = &record.outcome
                else {
                    continue;
                };
                match convert_success(
                    &record.posident,
                    attributes,
                    external_id,
                    &destination_columns,
                    &self.config.overrides,
                    &self.config.external_id_column,
                ) {
                    Ok(converted_record) => converted.push(converted_record),
                    Err(err) => {
                        error!(posident = %record.posident, %err, "record dropped");
                        report
                            .mapping_failures
                            .push((record.posident.clone(), err.to_string()));
                    }
                }
            }

            if !converted.is_empty() {
                store
                    .commit_batch(&converted)
                    .map_err(|source| PipelineError::Persistence { batch: batch_no, source })?;
                report.committed.extend(converted);
            }
        }

        report.log_summary();
        Ok(report)
    }
}
