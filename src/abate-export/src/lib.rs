//! Table export for the Abatedouro console.
//!
//! Turns a dataset plus column descriptors into a CSV download or a
//! printable HTML document. Encoding is pure ([`encode_csv`],
//! [`render_document`]); delivery goes through the capability traits in
//! [`surface`] and failures are reported through a [`Notifier`].

mod column;
mod encode;
mod error;
mod exporter;
mod notifier;
mod request;
pub mod surface;

pub use column::{ColumnSpec, Formatter, Row, stringify};
pub use encode::{PRODUCT_NAME, artifact_filename, encode_csv, escape_html, render_document};
pub use error::{ExportError, ExportResult};
pub use exporter::{DEFAULT_SETTLE_DELAY, ExportContext, TableExporter};
pub use notifier::{LogNotifier, Notifier};
pub use request::{DEFAULT_CSV_STEM, DEFAULT_DOCUMENT_STEM, DEFAULT_TITLE, ExportRequest};
pub use surface::{
    Artifact, DirectoryDownload, DownloadSurface, HtmlFilePrintSurface, PrintSurface, PrintWindow,
};
