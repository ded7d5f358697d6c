use std::sync::Arc;

use auth_oauth::{
    ServiceAccountKey, ServiceAccountTokenSource, TokenSource,
    CLOUD_PLATFORM_SCOPE, SPREADSHEETS_SCOPE,
};
use database_layer::{
    ChartRepository, GoogleSheetsBackend, InMemoryTabularBackend, RepositorySettings,
    SheetsConfig, TabularBackend,
};
use error_common::{ChartError, DataSanitizer, Result};
use note_generation_service::{create_provider, GenerationConfig, SoapGenerator};
use serde::Serialize;
use tracing::{info, warn};
use voice_recognition_service::{VoiceConfig, VoiceService};

use crate::config::ServerConfig;
use crate::storage::FileStore;

/// Which Google integrations were configured at startup, without any secrets
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegrationStatus {
    #[serde(skip)]
    pub spreadsheet_id: Option<String>,
    pub credential_source: Option<&'static str>,
    pub client_email: Option<String>,
    pub credentials_error: Option<String>,
    pub gemini_key_present: bool,
}

impl IntegrationStatus {
    /// `abcdef...wxyz`; short ids are shown as `***`
    pub fn spreadsheet_id_preview(&self) -> Option<String> {
        self.spreadsheet_id.as_deref().map(|id| {
            let chars: Vec<char> = id.chars().collect();
            if chars.len() <= 10 {
                return "***".to_string();
            }
            let head: String = chars.iter().take(6).collect();
            let tail: String = chars.iter().skip(chars.len() - 4).collect();
            format!("{}...{}", head, tail)
        })
    }
}

/// Main VetChart server state
#[derive(Clone)]
pub struct VetChartServer {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Animal and record store
    pub repository: Arc<ChartRepository>,
    /// Uploaded photos and audio
    pub file_store: Arc<FileStore>,
    /// Transcription collaborator, when configured
    pub voice: Option<Arc<VoiceService>>,
    /// SOAP generation collaborator, when configured
    pub notes: Option<Arc<SoapGenerator>>,
    pub integrations: Arc<IntegrationStatus>,
}

impl VetChartServer {
    /// Build every component from the environment.
    ///
    /// Missing Google credentials or spreadsheet id put the repository in
    /// local-only mode; missing collaborator settings leave that collaborator out.
    pub async fn from_env() -> Result<Self> {
        let config = ServerConfig::from_env();
        let file_store = FileStore::new(&config.upload_dir);
        file_store.initialize().await.map_err(|e| {
            ChartError::ConfigError(format!(
                "Cannot create upload directory {}: {}",
                config.upload_dir.display(),
                e
            ))
        })?;

        let mut integrations = IntegrationStatus {
            gemini_key_present: note_generation_service::api_key_from_env().is_some(),
            ..IntegrationStatus::default()
        };

        let credentials = match ServiceAccountKey::from_env_with_source() {
            Ok((key, source)) => {
                integrations.credential_source = Some(source.as_str());
                integrations.client_email = Some(key.client_email.clone());
                info!(client_email = %key.client_email, source = source.as_str(), "Loaded Google service account");
                Some(key)
            }
            Err(e) => {
                let message = DataSanitizer::new().sanitize_for_logging(&e.to_string());
                warn!(error = %message, "Google service account not available");
                integrations.credentials_error = Some(message);
                None
            }
        };

        let mut settings = RepositorySettings::from_env();
        let sheets = SheetsConfig::from_env().ok();
        integrations.spreadsheet_id = sheets.as_ref().map(|s| s.spreadsheet_id.clone());

        let backend: Arc<dyn TabularBackend> = match (&sheets, &credentials, settings.local_only) {
            (Some(sheets), Some(key), false) => {
                let tokens = Arc::new(ServiceAccountTokenSource::new(key.clone(), &[SPREADSHEETS_SCOPE]));
                Arc::new(GoogleSheetsBackend::new(sheets.clone(), tokens))
            }
            _ => {
                if !settings.local_only {
                    warn!("SPREADSHEET_ID or Google credentials missing; running in local-only mode");
                }
                settings.local_only = true;
                Arc::new(InMemoryTabularBackend::new())
            }
        };
        let repository = Arc::new(ChartRepository::new(backend, settings));

        let voice = build_voice(credentials.as_ref());
        let notes = build_notes();

        Ok(Self::with_components(
            config,
            repository,
            file_store,
            voice,
            notes,
            integrations,
        ))
    }

    /// Assemble a server from ready-made parts
    pub fn with_components(
        config: ServerConfig,
        repository: Arc<ChartRepository>,
        file_store: FileStore,
        voice: Option<Arc<VoiceService>>,
        notes: Option<Arc<SoapGenerator>>,
        integrations: IntegrationStatus,
    ) -> Self {
        Self {
            config: Arc::new(config),
            repository,
            file_store: Arc::new(file_store),
            voice,
            notes,
            integrations: Arc::new(integrations),
        }
    }

    /// `"sheets"` when mirrored to a spreadsheet, `"local"` otherwise
    pub fn storage_mode(&self) -> &'static str {
        if self.repository.settings().local_only {
            "local"
        } else {
            "sheets"
        }
    }

    /// Populate the index from the remote store once; failures leave it empty
    pub async fn initial_load(&self) {
        if self.repository.settings().local_only {
            info!("Local-only mode; skipping initial spreadsheet load");
            return;
        }
        match self.repository.load_from_remote().await {
            Ok(summary) => info!(
                animals = summary.animals,
                records = summary.records,
                skipped_rows = summary.skipped_rows,
                "Initial load complete"
            ),
            Err(e) => warn!(error = %e, code = e.code(), "Initial load failed; starting with an empty index"),
        }
    }
}

fn build_voice(key: Option<&ServiceAccountKey>) -> Option<Arc<VoiceService>> {
    let config = match VoiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Transcription disabled");
            return None;
        }
    };
    let tokens = key.map(|key| {
        Arc::new(ServiceAccountTokenSource::new(key.clone(), &[CLOUD_PLATFORM_SCOPE])) as Arc<dyn TokenSource>
    });
    match VoiceService::new(config, tokens) {
        Ok(service) => Some(Arc::new(service)),
        Err(e) => {
            warn!(error = %e, "Transcription disabled");
            None
        }
    }
}

fn build_notes() -> Option<Arc<SoapGenerator>> {
    match GenerationConfig::from_env() {
        Ok(config) => {
            info!(model = %config.model, "SOAP generation enabled");
            Some(Arc::new(SoapGenerator::new(create_provider(&config))))
        }
        Err(e) => {
            warn!(error = %e, "SOAP generation disabled");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreadsheet_id_preview() {
        let status = IntegrationStatus {
            spreadsheet_id: Some("1AbCdEfGhIjKlMnOpQrStUvWxYz".to_string()),
            ..IntegrationStatus::default()
        };
        assert_eq!(status.spreadsheet_id_preview().as_deref(), Some("1AbCdE...WxYz"));

        let short = IntegrationStatus {
            spreadsheet_id: Some("abc".to_string()),
            ..IntegrationStatus::default()
        };
        assert_eq!(short.spreadsheet_id_preview().as_deref(), Some("***"));
        assert_eq!(IntegrationStatus::default().spreadsheet_id_preview(), None);
    }
}
