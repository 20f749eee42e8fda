//! The table exporter: encodes a request and hands it to a surface.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use abate_common::format::local_wall_clock;

use crate::encode::{artifact_filename, encode_csv, render_document};
use crate::error::{ExportError, ExportResult};
use crate::notifier::Notifier;
use crate::request::ExportRequest;
use crate::surface::{Artifact, DownloadSurface, PrintSurface};

/// Pause between a print window reporting "loaded" and printing.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(250);

/// Capabilities the exporter delivers through.
#[derive(Clone)]
pub struct ExportContext {
    pub download: Arc<dyn DownloadSurface>,
    pub print: Arc<dyn PrintSurface>,
    pub notifier: Arc<dyn Notifier>,
    pub settle_delay: Duration,
}

impl ExportContext {
    pub fn new(
        download: Arc<dyn DownloadSurface>,
        print: Arc<dyn PrintSurface>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            download,
            print,
            notifier,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

/// Stateless exporter; every call is independent.
pub struct TableExporter {
    ctx: ExportContext,
}

impl TableExporter {
    pub fn new(ctx: ExportContext) -> Self {
        Self { ctx }
    }

    /// Encode `request` as CSV and save it through the download surface.
    ///
    /// Failures are shown through the notifier and returned.
    pub fn export_csv(&self, request: &ExportRequest) -> ExportResult<Artifact> {
        let result = self.deliver_csv(request, Utc::now());
        self.report(result)
    }

    /// Render `request` as a printable document and print it.
    pub async fn export_document(&self, request: &ExportRequest) -> ExportResult<Artifact> {
        let result = self.deliver_document(request, Utc::now()).await;
        self.report(result)
    }

    fn deliver_csv(&self, request: &ExportRequest, now: DateTime<Utc>) -> ExportResult<Artifact> {
        let csv = encode_csv(request)?;
        let filename = artifact_filename(request.csv_stem(), now.date_naive(), "csv");
        tracing::debug!(
            filename = %filename,
            rows = request.rows.len(),
            columns = request.columns.len(),
            "Exporting CSV"
        );
        self.ctx.download.save(&filename, csv.as_bytes())
    }

    async fn deliver_document(
        &self,
        request: &ExportRequest,
        now: DateTime<Utc>,
    ) -> ExportResult<Artifact> {
        let document = render_document(request, &local_wall_clock(&now))?;
        let filename = artifact_filename(request.document_stem(), now.date_naive(), "html");

        let mut window = self
            .ctx
            .print
            .open()
            .await
            .ok_or(ExportError::SurfaceUnavailable)?;
        tracing::debug!(filename = %filename, rows = request.rows.len(), "Printing document");

        let printed = match window.load(&filename, &document).await {
            Ok(()) => {
                tokio::time::sleep(self.ctx.settle_delay).await;
                window.print().await
            }
            Err(e) => Err(e),
        };
        window.close().await;
        printed
    }

    fn report(&self, result: ExportResult<Artifact>) -> ExportResult<Artifact> {
        if let Err(e) = &result {
            tracing::debug!(error = %e, "Export failed");
            self.ctx.notifier.notify(&e.to_string());
        }
        result
    }
}
