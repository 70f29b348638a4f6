use crate::settings::{
    error::SettingsError,
    filter::FilterRule,
    raw::RawSettings,
    validated::{Settings, ValidateLevel},
};
use connectors::{file::csv::settings::CsvSettings, market::http::Credentials};
use engine_core::retry::{
    DEFAULT_RETRY_INTERVAL, DEFAULT_THROTTLE_INTERVAL, DEFAULT_TIMEOUT, RetryPolicy,
};
use model::records::field::{FieldMap, StoreKind};
use std::time::Duration;
use tracing::{info, warn};

const MAX_RETRIES: i64 = 10;
const MAX_RETRY_INTERVAL_MS: i64 = 60_000;
const MAX_THROTTLE_INTERVAL_MS: i64 = 10_000;
const MAX_TIMEOUT_MS: i64 = 600_000;
const DEFAULT_MIN_BONUS: f64 = 0.0;
const DEFAULT_MAX_BONUS: f64 = 10.0;

/// Turns [`RawSettings`] into [`Settings`], collecting every problem.
#[derive(Debug, Default)]
pub struct SettingsValidator;

impl SettingsValidator {
    pub fn new() -> Self {
        SettingsValidator
    }

    pub fn validate(&self, raw: RawSettings) -> Result<Settings, SettingsError> {
        let mut errors: Vec<String> = Vec::new();

        let credentials = self.validate_credentials(&raw, &mut errors);
        let (min_bonus, max_bonus) = self.validate_bonus_range(&raw, &mut errors);
        let validate_level = self.validate_level(&raw, &mut errors);
        let (results_fields, reference_fields) = self.validate_fields(&raw, &mut errors);
        let filter = self.validate_filter(&raw, &mut errors);
        let retry = self.validate_retry(&raw, &mut errors);
        let throttle_interval = Duration::from_millis(range_ms(
            "throttleInterval",
            raw.throttle_interval,
            0,
            MAX_THROTTLE_INTERVAL_MS,
            DEFAULT_THROTTLE_INTERVAL,
            &mut errors,
        ));
        let csv = self.validate_csv(&raw, &mut errors);

        non_empty_if_present("HITId", raw.hit_id.as_deref(), &mut errors);
        non_empty_if_present(
            "QualificationTypeId",
            raw.qualification_type_id.as_deref(),
            &mut errors,
        );

        if !errors.is_empty() {
            return Err(SettingsError::ValidationFailed(errors));
        }

        let settings = Settings {
            credentials,
            sandbox: raw.sandbox.unwrap_or(false),
            endpoint: raw.endpoint,
            dry_run: raw.dry.unwrap_or(false),
            hit_id: raw.hit_id,
            qualification_type_id: raw.qualification_type_id,
            min_bonus,
            max_bonus,
            validate_level,
            results_fields,
            reference_fields,
            fields_case_insensitive: raw.fields_case_insensitive.unwrap_or(false),
            auto_approve: raw.auto_approve.unwrap_or(false),
            filter,
            retry,
            throttle_interval,
            csv,
        };

        self.log_validated_settings(&settings);
        Ok(settings)
    }

    fn validate_credentials(&self, raw: &RawSettings, errors: &mut Vec<String>) -> Credentials {
        let access = raw.access.clone().unwrap_or_default();
        let secret = raw.secret.clone().unwrap_or_default();
        if access.trim().is_empty() {
            errors.push("access is required and must not be empty".to_string());
        }
        if secret.trim().is_empty() {
            errors.push("secret is required and must not be empty".to_string());
        }
        Credentials { access, secret }
    }

    fn validate_bonus_range(&self, raw: &RawSettings, errors: &mut Vec<String>) -> (f64, f64) {
        let min = raw.min_bonus.unwrap_or(DEFAULT_MIN_BONUS);
        let max = raw.max_bonus.unwrap_or(DEFAULT_MAX_BONUS);
        if !min.is_finite() || !max.is_finite() || min < 0.0 {
            errors.push(format!(
                "minBonus/maxBonus must be finite and non-negative, got {min}/{max}"
            ));
        } else if min > max {
            errors.push(format!("minBonus ({min}) must not exceed maxBonus ({max})"));
        }
        (min, max)
    }

    fn validate_level(&self, raw: &RawSettings, errors: &mut Vec<String>) -> ValidateLevel {
        let level = raw.validate_level.unwrap_or(1);
        ValidateLevel::from_level(level).unwrap_or_else(|| {
            errors.push(format!("validateLevel must be 0, 1 or 2, got {level}"));
            ValidateLevel::Standard
        })
    }

    fn validate_fields(&self, raw: &RawSettings, errors: &mut Vec<String>) -> (FieldMap, FieldMap) {
        let results = FieldMap::for_kind(StoreKind::Results)
            .with_overrides(&raw.fields)
            .unwrap_or_else(|err| {
                errors.push(format!("fields: {err}"));
                FieldMap::for_kind(StoreKind::Results)
            });
        // The reference map fails on the same overrides; report them once.
        let reference = FieldMap::for_kind(StoreKind::Reference)
            .with_overrides(&raw.fields)
            .unwrap_or_else(|_| FieldMap::for_kind(StoreKind::Reference));
        (results, reference)
    }

    fn validate_filter(&self, raw: &RawSettings, errors: &mut Vec<String>) -> Option<FilterRule> {
        let rule = raw.filter.as_ref()?;
        match FilterRule::from_raw(rule) {
            Ok(rule) => Some(rule),
            Err(err) => {
                errors.push(err);
                None
            }
        }
    }

    fn validate_retry(&self, raw: &RawSettings, errors: &mut Vec<String>) -> RetryPolicy {
        let max_retries = match raw.n_retries {
            None => 0,
            Some(n) if (0..=MAX_RETRIES).contains(&n) => n as u32,
            Some(n) => {
                errors.push(format!("nRetries must be within 0..={MAX_RETRIES}, got {n}"));
                0
            }
        };
        let retry_interval = range_ms(
            "retryInterval",
            raw.retry_interval,
            0,
            MAX_RETRY_INTERVAL_MS,
            DEFAULT_RETRY_INTERVAL,
            errors,
        );
        let timeout = range_ms(
            "timeout",
            raw.timeout,
            1,
            MAX_TIMEOUT_MS,
            DEFAULT_TIMEOUT,
            errors,
        );

        if max_retries > 0 && retry_interval == 0 {
            warn!("nRetries is set with a zero retryInterval; retries will be immediate");
        }

        RetryPolicy::new(
            max_retries,
            Duration::from_millis(retry_interval),
            Duration::from_millis(timeout),
        )
    }

    fn validate_csv(&self, raw: &RawSettings, errors: &mut Vec<String>) -> CsvSettings {
        let defaults = CsvSettings::default();
        let Some(csv) = raw.csv.as_ref() else {
            return defaults;
        };

        let delimiter = csv.delimiter.unwrap_or(defaults.delimiter);
        let quote = csv.quote.unwrap_or(defaults.quote);
        for (name, c) in [("csv.delimiter", delimiter), ("csv.quote", quote)] {
            if !c.is_ascii() {
                errors.push(format!("{name} must be a single ASCII character, got {c:?}"));
            }
        }
        if delimiter == quote {
            errors.push("csv.delimiter and csv.quote must differ".to_string());
        }

        CsvSettings::new(delimiter, quote, csv.header.unwrap_or(defaults.has_headers))
    }

    fn log_validated_settings(&self, settings: &Settings) {
        info!("=== Validated Settings ===");
        info!("  Sandbox: {}", settings.sandbox);
        info!("  Dry Run: {}", settings.dry_run);
        info!("  HITId: {:?}", settings.hit_id);
        info!("  Bonus Range: {}..={}", settings.min_bonus, settings.max_bonus);
        info!("  Validate Level: {:?}", settings.validate_level);
        info!("  Retries: {}", settings.retry.max_retries);
        info!("  Retry Interval: {:?}", settings.retry.retry_interval);
        info!("  Timeout: {:?}", settings.retry.timeout);
        info!("  Throttle Interval: {:?}", settings.throttle_interval);
        info!("=========================");
    }
}

fn range_ms(
    name: &str,
    value: Option<i64>,
    min: i64,
    max: i64,
    default: Duration,
    errors: &mut Vec<String>,
) -> u64 {
    match value {
        None => default.as_millis() as u64,
        Some(v) if (min..=max).contains(&v) => v as u64,
        Some(v) => {
            errors.push(format!("{name} must be within {min}..={max} ms, got {v}"));
            default.as_millis() as u64
        }
    }
}

fn non_empty_if_present(name: &str, value: Option<&str>, errors: &mut Vec<String>) {
    if value.is_some_and(str::is_empty) {
        errors.push(format!("{name} must not be empty when set"));
    }
}
