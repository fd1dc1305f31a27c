//! Configuration management infrastructure.
//!
//! Two layers: [`SignConfig`] carries the per-operation options a caller
//! passes to `sign`/`cosign`/`countersign` (the CAdES "extra params"), while
//! [`CadesConfiguration`] holds persisted defaults managed by
//! [`ConfigManager`].

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::domain::constants;
use crate::domain::crypto::{CipherAlgorithm, DigestAlgorithm};
use crate::domain::types::EnvelopeKind;
use crate::infra::error::{CadesError, CadesResult};

/// Whether the signed content is embedded in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignMode {
    /// Content is left out (`eContent` absent).
    Explicit,
    /// Content is embedded.
    #[default]
    Implicit,
}

impl FromStr for SignMode {
    type Err = CadesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explicit" => Ok(SignMode::Explicit),
            "implicit" => Ok(SignMode::Implicit),
            other => Err(CadesError::Configuration(format!(
                "Invalid signature mode: {other}"
            ))),
        }
    }
}

/// Per-operation signing options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignConfig {
    pub mode: SignMode,
    /// Policy document URI, carried as the SPuri qualifier.
    pub policy_identifier: Option<String>,
    /// Policy OID, bare or as `urn:oid:` URN.
    pub policy_qualifier: Option<String>,
    /// Base64 hash of the policy document.
    pub policy_identifier_hash: Option<String>,
    pub policy_identifier_hash_algorithm: Option<String>,
    /// Set when the content passed in is already a digest of this algorithm.
    pub precalculated_hash_algorithm: Option<String>,
    pub signing_certificate_v2: bool,
    pub include_signing_time: bool,
    /// Fixed signing time; the current time is used when unset.
    #[serde(skip)]
    pub signing_time: Option<SystemTime>,
}

impl Default for SignConfig {
    fn default() -> Self {
        Self {
            mode: SignMode::Implicit,
            policy_identifier: None,
            policy_qualifier: None,
            policy_identifier_hash: None,
            policy_identifier_hash_algorithm: None,
            precalculated_hash_algorithm: None,
            signing_certificate_v2: false,
            include_signing_time: true,
            signing_time: None,
        }
    }
}

impl SignConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `key=value` style properties using the camelCase names.
    /// Unknown keys are ignored.
    pub fn from_properties<I, K, V>(properties: I) -> CadesResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in properties {
            if !config.set_property(key.as_ref(), value.as_ref())? {
                log::debug!("Ignoring unknown signing property: {}", key.as_ref());
            }
        }
        Ok(config)
    }

    /// Set one option by its camelCase name. Returns `false` for unknown keys.
    pub fn set_property(&mut self, key: &str, value: &str) -> CadesResult<bool> {
        match key {
            "mode" => self.mode = value.parse()?,
            "policyIdentifier" => self.policy_identifier = non_empty(value),
            "policyQualifier" => self.policy_qualifier = non_empty(value),
            "policyIdentifierHash" => self.policy_identifier_hash = non_empty(value),
            "policyIdentifierHashAlgorithm" => {
                self.policy_identifier_hash_algorithm = non_empty(value);
            }
            "precalculatedHashAlgorithm" => self.precalculated_hash_algorithm = non_empty(value),
            "signingCertificateV2" => self.signing_certificate_v2 = parse_bool(key, value)?,
            "includeSigningTime" => self.include_signing_time = parse_bool(key, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SignMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, identifier: Option<&str>, qualifier: &str) -> Self {
        self.policy_identifier = identifier.map(str::to_string);
        self.policy_qualifier = Some(qualifier.to_string());
        self
    }

    #[must_use]
    pub fn with_policy_hash(mut self, hash_base64: &str, algorithm: &str) -> Self {
        self.policy_identifier_hash = Some(hash_base64.to_string());
        self.policy_identifier_hash_algorithm = Some(algorithm.to_string());
        self
    }

    #[must_use]
    pub fn with_precalculated_hash(mut self, algorithm: &str) -> Self {
        self.precalculated_hash_algorithm = Some(algorithm.to_string());
        self
    }

    #[must_use]
    pub fn with_signing_certificate_v2(mut self, enabled: bool) -> Self {
        self.signing_certificate_v2 = enabled;
        self
    }

    #[must_use]
    pub fn with_signing_time(mut self, at: SystemTime) -> Self {
        self.signing_time = Some(at);
        self.include_signing_time = true;
        self
    }

    #[must_use]
    pub fn without_signing_time(mut self) -> Self {
        self.include_signing_time = false;
        self
    }

    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.mode == SignMode::Explicit
    }

    /// Algorithm of a pre-computed digest, when one is declared.
    pub fn precalculated_digest(&self) -> CadesResult<Option<DigestAlgorithm>> {
        self.precalculated_hash_algorithm
            .as_deref()
            .map(DigestAlgorithm::from_hint)
            .transpose()
    }

    /// Time to stamp into the signing-time attribute, if enabled.
    #[must_use]
    pub fn effective_signing_time(&self) -> Option<SystemTime> {
        self.include_signing_time
            .then(|| self.signing_time.unwrap_or_else(SystemTime::now))
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_bool(key: &str, value: &str) -> CadesResult<bool> {
    value.trim().to_ascii_lowercase().parse().map_err(|_| {
        CadesError::Configuration(format!("Invalid boolean value for {key}: {value}"))
    })
}

/// Persisted defaults for a [`crate::CadesSigner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadesConfiguration {
    /// Signature algorithm used when callers do not name one.
    pub default_algorithm: String,
    pub cipher: CipherAlgorithm,
    /// `Data`, `DigestedData`, `EnvelopedData` or `SignedAndEnvelopedData`.
    pub default_envelope_type: String,
    /// Inner content type OID attested by signers.
    pub content_type_oid: String,
    /// Suffix placed before `.csig` by `signed_name`.
    pub signed_name_suffix: String,
    pub sign: SignConfig,
}

impl Default for CadesConfiguration {
    fn default() -> Self {
        Self {
            default_algorithm: constants::DEFAULT_SIGNATURE_ALGORITHM.to_string(),
            cipher: CipherAlgorithm::default(),
            default_envelope_type: "EnvelopedData".to_string(),
            content_type_oid: "1.2.840.113549.1.7.1".to_string(),
            signed_name_suffix: String::new(),
            sign: SignConfig::default(),
        }
    }
}

impl CadesConfiguration {
    pub fn envelope_kind(&self) -> CadesResult<EnvelopeKind> {
        self.default_envelope_type.parse().map_err(|_| {
            CadesError::Configuration(format!(
                "Invalid default envelope type: {}",
                self.default_envelope_type
            ))
        })
    }

    pub fn content_type(&self) -> CadesResult<der::asn1::ObjectIdentifier> {
        der::asn1::ObjectIdentifier::new(self.content_type_oid.trim()).map_err(|_| {
            CadesError::Configuration(format!(
                "Invalid content type OID: {}",
                self.content_type_oid
            ))
        })
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    pub fn new() -> CadesResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> CadesResult<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("cades-signer").join("config.toml"))
        } else {
            Ok(PathBuf::from("cades-signer-config.toml"))
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create_default(&self) -> CadesResult<CadesConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = CadesConfiguration::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load configuration from file
    pub fn load(&self) -> CadesResult<CadesConfiguration> {
        log::info!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            CadesError::Configuration(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        let config: CadesConfiguration = toml::from_str(&content)
            .map_err(|e| CadesError::Configuration(format!("Failed to parse config file: {e}")))?;

        self.validate_config(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &CadesConfiguration) -> CadesResult<()> {
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CadesError::Configuration(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| CadesError::Configuration(format!("Failed to serialize config: {e}")))?;

        fs::write(&self.config_path, content).map_err(|e| {
            CadesError::Configuration(format!(
                "Failed to write config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    fn validate_config(&self, config: &CadesConfiguration) -> CadesResult<()> {
        DigestAlgorithm::from_hint(&config.default_algorithm).map_err(|_| {
            CadesError::Configuration(format!(
                "Invalid default algorithm: {}",
                config.default_algorithm
            ))
        })?;
        config.envelope_kind()?;
        config.content_type()?;
        if let Some(alg) = &config.sign.precalculated_hash_algorithm {
            DigestAlgorithm::from_hint(alg).map_err(|_| {
                CadesError::Configuration(format!("Invalid precalculated hash algorithm: {alg}"))
            })?;
        }
        Ok(())
    }

    /// Update a specific configuration value
    pub fn update_value(&self, key: &str, value: &str) -> CadesResult<()> {
        let mut config = self.load()?;

        match key {
            "default_algorithm" => config.default_algorithm = value.to_string(),
            "cipher" => config.cipher = value.parse()?,
            "default_envelope_type" => config.default_envelope_type = value.to_string(),
            "content_type_oid" => config.content_type_oid = value.to_string(),
            "signed_name_suffix" => config.signed_name_suffix = value.to_string(),
            _ => {
                // Remaining keys address the signing options by their camelCase names.
                if !config.sign.set_property(key, value)? {
                    return Err(CadesError::Configuration(format!(
                        "Unknown configuration key: {key}"
                    )));
                }
            }
        }

        self.validate_config(&config)?;
        self.save(&config)
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Export configuration as a portable format
    pub fn export_config(&self, format: ExportFormat) -> CadesResult<String> {
        let config = self.load()?;

        match format {
            ExportFormat::Toml => toml::to_string_pretty(&config)
                .map_err(|e| CadesError::Configuration(format!("TOML export failed: {e}"))),
            ExportFormat::Json => serde_json::to_string_pretty(&config)
                .map_err(|e| CadesError::Configuration(format!("JSON export failed: {e}"))),
            ExportFormat::Yaml => serde_yaml::to_string(&config)
                .map_err(|e| CadesError::Configuration(format!("YAML export failed: {e}"))),
        }
    }

    /// Import configuration from a string
    pub fn import_config(&self, content: &str, format: ExportFormat) -> CadesResult<()> {
        let config: CadesConfiguration = match format {
            ExportFormat::Toml => toml::from_str(content)
                .map_err(|e| CadesError::Configuration(format!("TOML import failed: {e}")))?,
            ExportFormat::Json => serde_json::from_str(content)
                .map_err(|e| CadesError::Configuration(format!("JSON import failed: {e}")))?,
            ExportFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| CadesError::Configuration(format!("YAML import failed: {e}")))?,
        };

        self.validate_config(&config)?;
        self.save(&config)
    }
}

/// Configuration export/import formats
#[derive(Debug, Clone, Copy)]
pub enum ExportFormat {
    Toml,
    Json,
    Yaml,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_configuration() {
        let config = CadesConfiguration::default();
        assert_eq!(config.cipher, CipherAlgorithm::Aes128Cbc);
        assert_eq!(config.envelope_kind().unwrap(), EnvelopeKind::EnvelopedData);
        assert_eq!(config.sign.mode, SignMode::Implicit);
        assert!(config.sign.include_signing_time);
        assert!(!config.sign.signing_certificate_v2);
    }

    #[test]
    fn sign_config_from_properties() {
        let config = SignConfig::from_properties([
            ("mode", "Explicit"),
            ("policyQualifier", "urn:oid:1.2.3"),
            ("signingCertificateV2", "true"),
            ("somethingElse", "ignored"),
        ])
        .unwrap();
        assert!(config.is_explicit());
        assert_eq!(config.policy_qualifier.as_deref(), Some("urn:oid:1.2.3"));
        assert!(config.signing_certificate_v2);

        let err = SignConfig::from_properties([("mode", "sideways")]).unwrap_err();
        assert!(matches!(err, CadesError::Configuration(_)));
    }

    #[test]
    fn sign_config_deserializes_camel_case() {
        let config: SignConfig = serde_json::from_str(
            r#"{"mode":"explicit","precalculatedHashAlgorithm":"SHA-256","includeSigningTime":false}"#,
        )
        .unwrap();
        assert!(config.is_explicit());
        assert_eq!(
            config.precalculated_digest().unwrap(),
            Some(DigestAlgorithm::Sha256)
        );
        assert!(config.effective_signing_time().is_none());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.toml");
        let manager = ConfigManager::with_path(&config_path);

        let mut config = CadesConfiguration::default();
        config.cipher = CipherAlgorithm::Aes256Cbc;
        config.sign.mode = SignMode::Explicit;
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.cipher, CipherAlgorithm::Aes256Cbc);
        assert_eq!(loaded.sign.mode, SignMode::Explicit);
    }

    #[test]
    fn update_value_reaches_sign_options() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));
        manager.load_or_create_default().unwrap();

        manager.update_value("cipher", "aes-192").unwrap();
        manager.update_value("signingCertificateV2", "true").unwrap();
        let loaded = manager.load().unwrap();
        assert_eq!(loaded.cipher, CipherAlgorithm::Aes192Cbc);
        assert!(loaded.sign.signing_certificate_v2);

        assert!(manager.update_value("no_such_key", "1").is_err());
    }

    #[test]
    fn test_config_export_import() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));
        manager.save(&CadesConfiguration::default()).unwrap();

        let json = manager.export_config(ExportFormat::Json).unwrap();
        assert!(json.contains("default_envelope_type"));
        let yaml = manager.export_config(ExportFormat::Yaml).unwrap();

        let other = ConfigManager::with_path(temp_dir.path().join("imported.toml"));
        other.import_config(&yaml, ExportFormat::Yaml).unwrap();
        assert_eq!(other.load().unwrap(), CadesConfiguration::default());
    }

    #[test]
    fn invalid_imports_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));
        let bad = r#"default_envelope_type = "AuthenticatedData""#;
        let err = manager.import_config(bad, ExportFormat::Toml).unwrap_err();
        assert!(matches!(err, CadesError::Configuration(_)));
    }
}
