//! Application context: every long-lived object, built once at start-up.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use abate_common::{AppDirs, ConsoleConfig};
use abate_export::{
    DirectoryDownload, ExportContext, HtmlFilePrintSurface, Notifier, TableExporter,
};
use abate_session::{
    FileRedirectSlot, HttpIdentityService, IdentityService, NavigationGuard, Navigator,
    RouteTable, SessionCookieFile, SessionGate,
};

use crate::styled_output::StderrNotifier;

/// Configuration plus the wired-up session and export components.
pub struct AppContext {
    pub config: ConsoleConfig,
    pub dirs: AppDirs,
    pub gate: Arc<SessionGate>,
    pub navigator: Navigator,
    pub exporter: TableExporter,
}

impl AppContext {
    /// Resolve the app directories, load config and build the context.
    pub fn load() -> Result<Self> {
        let dirs = AppDirs::new().context("could not determine the home directory")?;
        let mut config = ConsoleConfig::load(dirs.config_file())?;
        config.apply_env_overrides()?;
        Self::build(config, dirs)
    }

    /// Build against the HTTP backend named by `config`.
    pub fn build(config: ConsoleConfig, dirs: AppDirs) -> Result<Self> {
        dirs.ensure()
            .with_context(|| format!("failed to create {}", dirs.home.display()))?;
        let identity = HttpIdentityService::from_config(&config)?
            .with_cookie_file(SessionCookieFile::new(dirs.session_cookie_file()));
        tracing::debug!(
            environment = %config.environment,
            api = identity.base_url(),
            "Using identity backend"
        );
        Ok(Self::with_parts(
            config,
            dirs,
            Arc::new(identity),
            Arc::new(StderrNotifier),
        ))
    }

    /// Build around an arbitrary identity service and notifier.
    pub fn with_parts(
        config: ConsoleConfig,
        dirs: AppDirs,
        identity: Arc<dyn IdentityService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let gate = Arc::new(SessionGate::new(identity));
        let slot = Arc::new(FileRedirectSlot::new(dirs.redirect_slot_file()));
        let guard = NavigationGuard::new(gate.clone(), slot).with_timings(config.guard);
        let navigator = Navigator::new(RouteTable::console(), guard);

        let export_dir = export_dir(&config, &dirs);
        let exporter = TableExporter::new(
            ExportContext::new(
                Arc::new(DirectoryDownload::new(&export_dir)),
                Arc::new(HtmlFilePrintSurface::new(&export_dir)),
                notifier,
            )
            .with_settle_delay(config.export.print_settle_delay()),
        );

        Self {
            config,
            dirs,
            gate,
            navigator,
            exporter,
        }
    }

    pub fn export_dir(&self) -> PathBuf {
        export_dir(&self.config, &self.dirs)
    }
}

fn export_dir(config: &ConsoleConfig, dirs: &AppDirs) -> PathBuf {
    config
        .export
        .dir
        .clone()
        .unwrap_or_else(|| dirs.exports_dir.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use abate_export::{ColumnSpec, ExportRequest, LogNotifier};
    use abate_session::{
        ApiMessage, Credentials, IdentityError, IdentityRecord, Registration, ServiceResponse,
    };
    use async_trait::async_trait;

    /// Backend that knows nobody.
    struct Anonymous;

    #[async_trait]
    impl IdentityService for Anonymous {
        async fn who_am_i(&self) -> Result<ServiceResponse<IdentityRecord>, IdentityError> {
            Ok(ServiceResponse::new(401, None))
        }

        async fn login(
            &self,
            _credentials: &Credentials,
        ) -> Result<ServiceResponse<ApiMessage>, IdentityError> {
            Ok(ServiceResponse::new(401, None))
        }

        async fn logout(&self) -> Result<ServiceResponse<ApiMessage>, IdentityError> {
            Ok(ServiceResponse::new(200, None))
        }

        async fn register(
            &self,
            _registration: &Registration,
        ) -> Result<ServiceResponse<ApiMessage>, IdentityError> {
            Ok(ServiceResponse::new(201, None))
        }
    }

    fn context(home: &std::path::Path, config: ConsoleConfig) -> AppContext {
        let dirs = AppDirs::rooted_at(home);
        dirs.ensure().unwrap();
        AppContext::with_parts(config, dirs, Arc::new(Anonymous), Arc::new(LogNotifier))
    }

    #[tokio::test]
    async fn test_guest_bounce_is_remembered_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path(), ConsoleConfig::default());

        let landed = ctx.navigator.navigate("/produtos").await.unwrap();
        assert_eq!(landed.path, "/");
        let saved = std::fs::read_to_string(ctx.dirs.redirect_slot_file()).unwrap();
        assert_eq!(saved, "/home/produtos");
    }

    #[test]
    fn test_export_dir_follows_config() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path(), ConsoleConfig::default());
        assert_eq!(ctx.export_dir(), tmp.path().join("exports"));

        let mut config = ConsoleConfig::default();
        config.export.dir = Some(tmp.path().join("relatorios"));
        let ctx = context(tmp.path(), config);

        let request = ExportRequest::new(
            vec![ColumnSpec::new("lote", "Lote")],
            vec![serde_json::from_str(r#"{"lote": "L-07"}"#).unwrap()],
        );
        let artifact = ctx.exporter.export_csv(&request).unwrap();
        assert!(artifact.location.unwrap().starts_with(tmp.path().join("relatorios")));
    }
}
