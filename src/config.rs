//! Configuration types for paystub processing.
//!
//! All processing behaviour is controlled through [`ProcessingConfig`], built
//! via its [`ProcessingConfigBuilder`] or loaded from a JSON settings file.
//! The config is immutable once built and shared across batch workers; the
//! category mapping table sits behind an [`Arc`] so cloning a config per
//! document is cheap.

use crate::defaults;
use crate::error::PaystubError;
use crate::pipeline::categorize::{normalize_label, MappingTable};
use crate::progress::ProgressCallback;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Date formats tried, in order, for every header date.
pub const DEFAULT_DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%Y-%m-%d", "%m/%d/%y"];

/// Account used when neither a mapping rule nor an override names one.
pub const DEFAULT_ACCOUNT: &str = "Primary Checking";

/// Configuration for processing one or more paystubs.
///
/// # Example
/// ```rust
/// use paystub2csv::ProcessingConfig;
/// use rust_decimal::Decimal;
///
/// let config = ProcessingConfig::builder()
///     .tolerance(Decimal::new(5, 2))
///     .concurrency(8)
///     .account_override("Savings Acct", "Emergency Fund")
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 8);
/// ```
#[derive(Clone)]
pub struct ProcessingConfig {
    /// Largest |gross − net − deductions| still considered balanced. Default: 0.01.
    pub tolerance: Decimal,

    /// Documents processed at once by the batch entry points. Default: 4.
    ///
    /// Extraction is serialised on the pdfium lock, so values beyond the core
    /// count only help the parsing stages.
    pub concurrency: usize,

    /// PDF user password for encrypted paystubs.
    pub password: Option<String>,

    /// Explicit path to the pdfium shared library. Falls back to
    /// `PDFIUM_LIB_PATH`, then to the system loader.
    pub pdfium_library: Option<PathBuf>,

    /// Documents with more pages than this are rejected. Default: 20.
    pub max_pages: usize,

    /// Label → category rules.
    pub mappings: Arc<MappingTable>,

    /// Default: "Primary Checking".
    pub default_account: String,

    /// Account name per normalised label, used for deposit lines such as
    /// "Savings Acct". Keys are stored normalised.
    pub account_overrides: BTreeMap<String, String>,

    /// chrono format strings tried in order for header dates.
    pub date_formats: Vec<String>,

    /// Fill the Original Description column with the raw stub line. Default: false.
    pub include_original_text: bool,

    /// Fill the Labels column (`RSU,Payroll,Pay-YYYY-MM`). Default: false.
    pub emit_labels: bool,

    /// Earnings and deductions carry a trailing year-to-date column. Default: true.
    pub ytd_columns: bool,

    /// Receives batch progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            tolerance: Decimal::new(1, 2),
            concurrency: 4,
            password: None,
            pdfium_library: None,
            max_pages: 20,
            mappings: Arc::new(defaults::default_mapping_table()),
            default_account: DEFAULT_ACCOUNT.to_string(),
            account_overrides: BTreeMap::new(),
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            include_original_text: false,
            emit_labels: false,
            ytd_columns: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ProcessingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingConfig")
            .field("tolerance", &self.tolerance)
            .field("concurrency", &self.concurrency)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library", &self.pdfium_library)
            .field("max_pages", &self.max_pages)
            .field("mapping_rules", &self.mappings.rule_count())
            .field("default_account", &self.default_account)
            .field("account_overrides", &self.account_overrides)
            .field("date_formats", &self.date_formats)
            .field("include_original_text", &self.include_original_text)
            .field("emit_labels", &self.emit_labels)
            .field("ytd_columns", &self.ytd_columns)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ProcessingConfig {
    /// Create a new builder for `ProcessingConfig`.
    pub fn builder() -> ProcessingConfigBuilder {
        ProcessingConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load a JSON settings file. Every key is optional; missing keys keep
    /// their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PaystubError> {
        Self::builder_from_json_file(path)?.build()
    }

    /// Parse JSON settings from a string.
    pub fn from_json_str(json: &str) -> Result<Self, PaystubError> {
        Self::builder_from_json_str(json)?.build()
    }

    /// Like [`from_json_file`](Self::from_json_file) but returns the builder
    /// so callers (the CLI) can layer overrides before validation.
    pub fn builder_from_json_file(
        path: impl AsRef<Path>,
    ) -> Result<ProcessingConfigBuilder, PaystubError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PaystubError::ConfigLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let file: ConfigFile =
            serde_json::from_str(&text).map_err(|e| PaystubError::ConfigLoad {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        Ok(file.into_builder())
    }

    pub fn builder_from_json_str(json: &str) -> Result<ProcessingConfigBuilder, PaystubError> {
        let file: ConfigFile = serde_json::from_str(json)
            .map_err(|e| PaystubError::InvalidConfig(format!("settings JSON: {e}")))?;
        Ok(file.into_builder())
    }

    /// Account for a normalised label, or the default account.
    pub fn account_for(&self, normalized_label: &str) -> &str {
        self.account_overrides
            .get(normalized_label)
            .map(String::as_str)
            .unwrap_or(&self.default_account)
    }
}

/// Builder for [`ProcessingConfig`].
#[derive(Debug)]
pub struct ProcessingConfigBuilder {
    config: ProcessingConfig,
}

impl ProcessingConfigBuilder {
    pub fn tolerance(mut self, tolerance: Decimal) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    pub fn mappings(mut self, table: MappingTable) -> Self {
        self.config.mappings = Arc::new(table);
        self
    }

    pub fn default_account(mut self, account: impl Into<String>) -> Self {
        self.config.default_account = account.into();
        self
    }

    /// Route items with this label to a named account.
    pub fn account_override(mut self, label: &str, account: impl Into<String>) -> Self {
        self.config
            .account_overrides
            .insert(normalize_label(label), account.into());
        self
    }

    pub fn date_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.date_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn include_original_text(mut self, v: bool) -> Self {
        self.config.include_original_text = v;
        self
    }

    pub fn emit_labels(mut self, v: bool) -> Self {
        self.config.emit_labels = v;
        self
    }

    pub fn ytd_columns(mut self, v: bool) -> Self {
        self.config.ytd_columns = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessingConfig, PaystubError> {
        let c = &self.config;
        if c.tolerance.is_sign_negative() && !c.tolerance.is_zero() {
            return Err(PaystubError::InvalidConfig(format!(
                "tolerance must be ≥ 0, got {}",
                c.tolerance
            )));
        }
        if c.concurrency == 0 {
            return Err(PaystubError::InvalidConfig("concurrency must be ≥ 1".into()));
        }
        if c.max_pages == 0 {
            return Err(PaystubError::InvalidConfig("max_pages must be ≥ 1".into()));
        }
        if c.date_formats.is_empty() {
            return Err(PaystubError::InvalidConfig(
                "at least one date format is required".into(),
            ));
        }
        if c.default_account.trim().is_empty() {
            return Err(PaystubError::InvalidConfig(
                "default_account must not be empty".into(),
            ));
        }
        c.mappings.validate()?;
        Ok(self.config)
    }
}

// ── Settings file ────────────────────────────────────────────────────────

/// On-disk shape of a settings file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    tolerance: Option<Decimal>,
    concurrency: Option<usize>,
    max_pages: Option<usize>,
    default_account: Option<String>,
    account_overrides: BTreeMap<String, String>,
    date_formats: Option<Vec<String>>,
    include_original_text: Option<bool>,
    emit_labels: Option<bool>,
    ytd_columns: Option<bool>,
    mappings: Option<MappingTable>,
}

impl ConfigFile {
    fn into_builder(self) -> ProcessingConfigBuilder {
        let mut b = ProcessingConfig::builder();
        if let Some(t) = self.tolerance {
            b = b.tolerance(t);
        }
        if let Some(n) = self.concurrency {
            b.config.concurrency = n;
        }
        if let Some(n) = self.max_pages {
            b = b.max_pages(n);
        }
        if let Some(a) = self.default_account {
            b = b.default_account(a);
        }
        for (label, account) in self.account_overrides {
            b = b.account_override(&label, account);
        }
        if let Some(f) = self.date_formats {
            b = b.date_formats(f);
        }
        if let Some(v) = self.include_original_text {
            b = b.include_original_text(v);
        }
        if let Some(v) = self.emit_labels {
            b = b.emit_labels(v);
        }
        if let Some(v) = self.ytd_columns {
            b = b.ytd_columns(v);
        }
        if let Some(m) = self.mappings {
            b = b.mappings(m);
        }
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn defaults_are_documented_values() {
        let c = ProcessingConfig::default();
        assert_eq!(c.tolerance, dec!(0.01));
        assert_eq!(c.concurrency, 4);
        assert_eq!(c.max_pages, 20);
        assert_eq!(c.default_account, "Primary Checking");
        assert!(c.ytd_columns);
        assert!(!c.include_original_text);
        assert!(!c.emit_labels);
        assert!(c.mappings.rule_count() > 0);
    }

    #[test]
    fn builder_rejects_negative_tolerance() {
        let err = ProcessingConfig::builder()
            .tolerance(dec!(-0.01))
            .build()
            .unwrap_err();
        assert!(matches!(err, PaystubError::InvalidConfig(_)));
    }

    #[test]
    fn builder_clamps_concurrency() {
        let c = ProcessingConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn override_keys_are_normalised() {
        let c = ProcessingConfig::builder()
            .account_override("  Savings   ACCT ", "Emergency Fund")
            .build()
            .unwrap();
        assert_eq!(c.account_for("savings acct"), "Emergency Fund");
        assert_eq!(c.account_for("checking acct"), "Primary Checking");
    }

    #[test]
    fn json_settings_override_defaults() {
        let c = ProcessingConfig::from_json_str(
            r#"{
                "tolerance": "0.05",
                "max_pages": 5,
                "emit_labels": true,
                "account_overrides": { "Savings Acct": "Savings" }
            }"#,
        )
        .unwrap();
        assert_eq!(c.tolerance, dec!(0.05));
        assert_eq!(c.max_pages, 5);
        assert!(c.emit_labels);
        assert_eq!(c.account_for("savings acct"), "Savings");
        assert_eq!(c.concurrency, 4);
    }

    #[test]
    fn json_zero_concurrency_is_rejected() {
        let err = ProcessingConfig::from_json_str(r#"{ "concurrency": 0 }"#).unwrap_err();
        assert!(matches!(err, PaystubError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ProcessingConfig::from_json_str(r#"{ "tolerence": "0.05" }"#).unwrap_err();
        assert!(err.to_string().contains("tolerence"), "got: {err}");
    }

    #[test]
    fn file_loading_reports_path() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        let err = ProcessingConfig::from_json_file(f.path()).unwrap_err();
        match err {
            PaystubError::ConfigLoad { path, .. } => assert_eq!(path, f.path()),
            other => panic!("unexpected {other:?}"),
        }

        let missing = ProcessingConfig::from_json_file("/nonexistent/settings.json").unwrap_err();
        assert!(matches!(missing, PaystubError::ConfigLoad { .. }));
    }
}
