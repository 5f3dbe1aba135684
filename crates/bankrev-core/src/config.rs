use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to a value that cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to a value that cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// config. Decoupled from the real environment so it can be tested with a
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_flag(&or_default(var, default)).ok_or_else(|| {
            invalid(
                var,
                "expected one of true/false, 1/0, yes/no, on/off".to_string(),
            )
        })
    };

    let log_level = or_default("BANKREV_LOG_LEVEL", "info");
    let targets_path = PathBuf::from(or_default(
        "BANKREV_TARGETS_PATH",
        "./config/targets.yaml",
    ));
    let output_dir = PathBuf::from(or_default("BANKREV_OUTPUT_DIR", "data/raw"));
    let webdriver_url = or_default("BANKREV_WEBDRIVER_URL", "http://localhost:9515");
    let headless = parse_bool("BANKREV_HEADLESS", "true")?;
    let wait_time_secs = parse_u64("BANKREV_WAIT_TIME_SECS", "15")?;

    // Unset or empty means "no cap".
    let max_branches_per_org = match lookup("BANKREV_MAX_BRANCHES_PER_ORG") {
        Ok(raw) if !raw.trim().is_empty() => Some(
            raw.trim()
                .parse::<usize>()
                .map_err(|e| invalid("BANKREV_MAX_BRANCHES_PER_ORG", e.to_string()))?,
        ),
        _ => None,
    };

    let branch_delay_ms = parse_u64("BANKREV_BRANCH_DELAY_MS", "5000")?;
    let locality_delay_ms = parse_u64("BANKREV_LOCALITY_DELAY_MS", "3000")?;
    let organization_delay_ms = parse_u64("BANKREV_ORGANIZATION_DELAY_MS", "10000")?;
    let progress_saves = parse_bool("BANKREV_PROGRESS_SAVES", "false")?;

    Ok(AppConfig {
        log_level,
        targets_path,
        output_dir,
        webdriver_url,
        headless,
        wait_time_secs,
        max_branches_per_org,
        branch_delay_ms,
        locality_delay_ms,
        organization_delay_ms,
        progress_saves,
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
