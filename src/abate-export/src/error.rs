//! Export error types.

use std::path::PathBuf;

/// Reasons an export produced no artifact.
///
/// The `Display` text is what the user is shown.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Não há dados para exportar")]
    EmptyDataset,

    #[error(
        "Não foi possível abrir a janela de impressão. Verifique se o bloqueador de pop-ups está desabilitado."
    )]
    SurfaceUnavailable,

    #[error("Coluna duplicada na exportação: {0}")]
    DuplicateColumn(String),

    #[error("Nome de arquivo inválido: {0}")]
    InvalidFilename(String),

    #[error("Falha ao gravar {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
