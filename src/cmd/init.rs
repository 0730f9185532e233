//! `outpost init` — generate a starter configuration file.
//!
//! Creates a YAML, JSON, or TOML config file with either minimal
//! or fully documented templates.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::error::OutpostError;

pub fn execute(args: &InitArgs) -> Result<(), OutpostError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("outpost.{}", args.format.extension())));

    if output.exists() {
        return Err(OutpostError::FileExists { path: output });
    }

    let content = match (&args.format, args.full) {
        (ConfigFormat::Yaml, false) => YAML_MINIMAL,
        (ConfigFormat::Yaml, true) => YAML_FULL,
        (ConfigFormat::Json, false) => JSON_MINIMAL,
        (ConfigFormat::Json, true) => JSON_FULL,
        (ConfigFormat::Toml, false) => TOML_MINIMAL,
        (ConfigFormat::Toml, true) => TOML_FULL,
    };

    std::fs::write(&output, content)?;
    println!("Created {}", output.display());
    Ok(())
}

const YAML_MINIMAL: &str = r#"# Outpost config

sources:
  example:
    targets:
      - name: "example-hook"
        type: http
        urls:
          - "http://localhost:8080/hook"
"#;

const YAML_FULL: &str = r#"# Outpost config
#
# All values shown are defaults. Uncomment and modify as needed.

# Global defaults applied to all targets unless overridden
defaults:
  # timeout: 5000                  # Request timeout in ms

sources:
  # Simple: one source, one webhook
  example:
    targets:
      - name: "example-hook"
        type: http
        urls:
          - "http://localhost:8080/hook"

  # Full: all options shown
  # orders:
  #   targets:
  #     - name: "billing-hook"
  #       type: http
  #       method: POST               # Default: POST
  #       timeout: 10000             # Override defaults.timeout for this target
  #       urls:
  #         - "https://billing.internal/events"
  #         - "https://audit.internal/events"
  #       headers:
  #         x-origin: "outpost"
  #       auth:
  #         strategy: bearer         # bearer | api_key | basic | none
  #         token: "secret-token"
  #         # key: "x-api-key"       # api_key header name
  #         # value: "secret"        # api_key value
  #         # username: "user"       # basic auth
  #         # password: "pass"
  #       retry:
  #         max_attempts: 3
  #         backoff_factor: 1.0
  #         status_forcelist: [500, 502, 503, 504]
  #       ratelimit:
  #         strategy: header         # header | response
  #         default_wait: 0.5        # Seconds when no signal is present
  #         max_wait: 60.0           # Cap for any computed wait
  #         headers:
  #           retry_after: ["retry-after"]
  #           reset: ["x-ratelimit-reset", "ratelimit-reset"]
  #           limit: []              # Requests-per-second headers
  #         json_fields:
  #           retry_after: ["retry_after"]
  #           reset: ["rate_limit_reset"]
  #
  #     - name: "orders-queue"
  #       type: rabbitmq
  #       topic: "events.orders"
"#;

const JSON_MINIMAL: &str = r#"{
  "sources": {
    "example": {
      "targets": [
        {
          "name": "example-hook",
          "type": "http",
          "urls": ["http://localhost:8080/hook"]
        }
      ]
    }
  }
}
"#;

const JSON_FULL: &str = r#"{
  "defaults": {
    "timeout": 5000
  },
  "sources": {
    "example": {
      "targets": [
        {
          "name": "example-hook",
          "type": "http",
          "method": "POST",
          "urls": ["http://localhost:8080/hook"],
          "headers": {
            "x-origin": "outpost"
          },
          "retry": {
            "max_attempts": 3,
            "backoff_factor": 1.0,
            "status_forcelist": [500, 502, 503, 504]
          },
          "ratelimit": {
            "strategy": "header",
            "default_wait": 0.5,
            "max_wait": 60.0
          }
        },
        {
          "name": "example-queue",
          "type": "rabbitmq",
          "topic": "events.example"
        }
      ]
    }
  }
}
"#;

const TOML_MINIMAL: &str = r#"# Outpost config

[[sources.example.targets]]
name = "example-hook"
type = "http"
urls = ["http://localhost:8080/hook"]
"#;

const TOML_FULL: &str = r#"# Outpost config
#
# All values shown are defaults. Uncomment and modify as needed.

[defaults]
# timeout = 5000

[[sources.example.targets]]
name = "example-hook"
type = "http"
# method = "POST"
# timeout = 5000
urls = ["http://localhost:8080/hook"]

# [sources.example.targets.headers]
# x-origin = "outpost"

# [sources.example.targets.auth]
# strategy = "bearer"          # bearer | api_key | basic | none
# token = "secret-token"

[sources.example.targets.retry]
max_attempts = 3
backoff_factor = 1.0
status_forcelist = [500, 502, 503, 504]

[sources.example.targets.ratelimit]
strategy = "header"            # header | response
default_wait = 0.5
max_wait = 60.0

# [[sources.example.targets]]
# name = "example-queue"
# type = "rabbitmq"
# topic = "events.example"
"#;
