//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for structural
//! errors such as empty target lists, malformed URLs, bad HTTP methods,
//! missing queue topics, and out-of-range retry / rate-limit policy
//! values. Returns a list of [`ValidationError`] values with per-field
//! suggestions.
//!
//! A descriptor with an unrecognized `type` is *not* a validation
//! error: it parses, validates, and is skipped with a warning when the
//! dispatch table is built.

use url::Url;

use super::model::{Config, TargetDescriptor};
use crate::error::ValidationError;

pub const VALID_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// Validate a single destination URL. Returns `Ok(())` or a human-readable error.
pub fn validate_target_url(url: &str) -> Result<(), String> {
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

/// Validate an HTTP method string. Returns `Ok(())` or a human-readable error.
pub fn validate_method(method: &str) -> Result<(), String> {
    let upper = method.to_uppercase();
    if VALID_METHODS.contains(&upper.as_str()) {
        Ok(())
    } else {
        Err(format!("'{method}' is not a valid HTTP method"))
    }
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.sources.is_empty() {
        errors.push(ValidationError {
            scope: "(root)".into(),
            field: "sources".into(),
            message: "at least one source must be defined".into(),
            suggestion: None,
        });
        return Err(errors);
    }

    for (source, source_cfg) in &config.sources {
        if source_cfg.targets.is_empty() {
            errors.push(ValidationError {
                scope: format!("sources.{source}"),
                field: "targets".into(),
                message: "at least one target must be defined".into(),
                suggestion: None,
            });
            continue;
        }

        let mut seen_names = std::collections::HashSet::new();

        for (i, target) in source_cfg.targets.iter().enumerate() {
            let scope = if target.name.is_empty() {
                format!("sources.{source}.targets[{i}]")
            } else {
                format!("sources.{source}.{}", target.name)
            };

            if target.name.is_empty() {
                errors.push(ValidationError {
                    scope: scope.clone(),
                    field: "name".into(),
                    message: "target name cannot be empty".into(),
                    suggestion: None,
                });
            } else if !seen_names.insert(&target.name) {
                errors.push(ValidationError {
                    scope: scope.clone(),
                    field: "name".into(),
                    message: "duplicate target name within this source".into(),
                    suggestion: None,
                });
            }

            match target.kind.to_lowercase().as_str() {
                "http" => validate_http_target(&scope, target, &mut errors),
                "rabbitmq" => validate_queue_target(&scope, target, &mut errors),
                // Unknown types are skipped at build time, not rejected here
                _ => {}
            }

            validate_policies(&scope, target, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_http_target(scope: &str, target: &TargetDescriptor, errors: &mut Vec<ValidationError>) {
    if target.urls.is_empty() {
        errors.push(ValidationError {
            scope: scope.to_string(),
            field: "urls".into(),
            message: "http targets need at least one destination URL".into(),
            suggestion: None,
        });
    }

    for url in &target.urls {
        if let Err(msg) = validate_target_url(url) {
            errors.push(ValidationError {
                scope: scope.to_string(),
                field: "urls".into(),
                message: msg,
                suggestion: None,
            });
        }
    }

    if let Err(msg) = validate_method(&target.method) {
        errors.push(ValidationError {
            scope: scope.to_string(),
            field: "method".into(),
            message: msg,
            suggestion: None,
        });
    }
}

fn validate_queue_target(scope: &str, target: &TargetDescriptor, errors: &mut Vec<ValidationError>) {
    if target.topic.as_deref().unwrap_or("").is_empty() {
        errors.push(ValidationError {
            scope: scope.to_string(),
            field: "topic".into(),
            message: "rabbitmq targets need a topic".into(),
            suggestion: None,
        });
    }
}

fn validate_policies(scope: &str, target: &TargetDescriptor, errors: &mut Vec<ValidationError>) {
    if let Some(ref retry) = target.retry {
        if retry.max_attempts == 0 {
            errors.push(ValidationError {
                scope: scope.to_string(),
                field: "retry.max_attempts".into(),
                message: "must be at least 1".into(),
                suggestion: None,
            });
        }
        if !(retry.backoff_factor >= 0.0) {
            errors.push(ValidationError {
                scope: scope.to_string(),
                field: "retry.backoff_factor".into(),
                message: "must be a non-negative number".into(),
                suggestion: None,
            });
        }
        for status in &retry.status_forcelist {
            if !(100..=599).contains(status) {
                errors.push(ValidationError {
                    scope: scope.to_string(),
                    field: "retry.status_forcelist".into(),
                    message: format!("{status} is not an HTTP status code"),
                    suggestion: None,
                });
            }
        }
    }

    if let Some(ref ratelimit) = target.ratelimit {
        if !(ratelimit.default_wait >= 0.0) {
            errors.push(ValidationError {
                scope: scope.to_string(),
                field: "ratelimit.default_wait".into(),
                message: "must be a non-negative number of seconds".into(),
                suggestion: None,
            });
        }
        if !(ratelimit.max_wait >= ratelimit.default_wait) {
            errors.push(ValidationError {
                scope: scope.to_string(),
                field: "ratelimit.max_wait".into(),
                message: "must be at least default_wait".into(),
                suggestion: None,
            });
        }
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let mut lines = vec![format!(
        "  {} sources, {} targets\n",
        config.sources.len(),
        config.total_targets()
    )];

    let mut sources: Vec<_> = config.sources.iter().collect();
    sources.sort_by_key(|(name, _)| name.as_str());

    for (source, source_cfg) in sources {
        lines.push(format!(
            "  {source}  -> {} targets",
            source_cfg.targets.len()
        ));
        for target in &source_cfg.targets {
            let destination = match target.kind.as_str() {
                "http" => format!("{} {}", target.method, target.urls.join(", ")),
                "rabbitmq" => format!("topic {}", target.topic.as_deref().unwrap_or("?")),
                other => format!("unknown type '{other}' (will be skipped)"),
            };
            lines.push(format!("    {} [{}]: {destination}", target.name, target.kind));
        }
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{
        Defaults, RateLimitConfig, RetryConfig, SourceConfig, TargetDescriptor,
    };
    use std::collections::HashMap;

    fn http_target(name: &str, url: &str) -> TargetDescriptor {
        TargetDescriptor {
            name: name.into(),
            kind: "http".into(),
            method: "POST".into(),
            urls: vec![url.into()],
            headers: HashMap::new(),
            timeout: None,
            auth: None,
            retry: None,
            ratelimit: None,
            topic: None,
        }
    }

    fn config_with(targets: Vec<TargetDescriptor>) -> Config {
        let mut sources = HashMap::new();
        sources.insert("orders".to_string(), SourceConfig { targets });
        Config {
            defaults: Defaults::default(),
            sources,
        }
    }

    #[test]
    fn minimal_http_config_is_valid() {
        let config = config_with(vec![http_target("billing", "http://localhost:8080/hook")]);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn empty_sources_rejected() {
        let config = Config {
            defaults: Defaults::default(),
            sources: HashMap::new(),
        };
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "sources");
    }

    #[test]
    fn empty_target_list_rejected() {
        let config = config_with(vec![]);
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors[0].field, "targets");
    }

    #[test]
    fn http_target_without_urls_rejected() {
        let mut target = http_target("billing", "http://localhost/hook");
        target.urls.clear();
        let errors = validate(&config_with(vec![target])).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "urls"));
    }

    #[test]
    fn bad_scheme_rejected() {
        let target = http_target("billing", "ftp://example.com/drop");
        let errors = validate(&config_with(vec![target])).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("scheme")));
    }

    #[test]
    fn bad_method_rejected() {
        let mut target = http_target("billing", "http://localhost/hook");
        target.method = "FETCH".into();
        let errors = validate(&config_with(vec![target])).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "method"));
    }

    #[test]
    fn queue_target_needs_topic() {
        let target = TargetDescriptor {
            name: "audit".into(),
            kind: "rabbitmq".into(),
            method: "POST".into(),
            urls: vec![],
            headers: HashMap::new(),
            timeout: None,
            auth: None,
            retry: None,
            ratelimit: None,
            topic: None,
        };
        let errors = validate(&config_with(vec![target])).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "topic"));
    }

    #[test]
    fn unknown_target_type_passes_validation() {
        let mut target = http_target("mystery", "http://localhost/hook");
        target.kind = "carrier_pigeon".into();
        target.urls.clear();
        assert!(validate(&config_with(vec![target])).is_ok());
    }

    #[test]
    fn duplicate_target_names_rejected() {
        let config = config_with(vec![
            http_target("billing", "http://a.example/hook"),
            http_target("billing", "http://b.example/hook"),
        ]);
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("duplicate")));
    }

    #[test]
    fn zero_max_attempts_rejected() {
        let mut target = http_target("billing", "http://localhost/hook");
        target.retry = Some(RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        });
        let errors = validate(&config_with(vec![target])).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "retry.max_attempts"));
    }

    #[test]
    fn max_wait_below_default_wait_rejected() {
        let mut target = http_target("billing", "http://localhost/hook");
        target.ratelimit = Some(RateLimitConfig {
            default_wait: 5.0,
            max_wait: 1.0,
            ..RateLimitConfig::default()
        });
        let errors = validate(&config_with(vec![target])).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "ratelimit.max_wait"));
    }
}
