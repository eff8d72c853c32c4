use super::types::{Config, KNOWN_PROVIDERS, MAX_SEARCH_FOR_DAYS};
use super::ConfigError;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    let subtitles = &config.subtitles;
    if subtitles.languages.is_empty() {
        return Err(invalid("subtitles.languages must list at least one language"));
    }
    if subtitles.languages.iter().any(|l| l.trim().is_empty()) {
        return Err(invalid("subtitles.languages cannot contain an empty tag"));
    }
    if subtitles.providers.is_empty() {
        return Err(invalid("subtitles.providers must list at least one provider"));
    }
    for (i, provider) in subtitles.providers.iter().enumerate() {
        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "subtitles.providers: unknown provider '{}' (known: {})",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }
        if subtitles.providers[..i].contains(provider) {
            return Err(ConfigError::ValidationError(format!(
                "subtitles.providers lists '{}' more than once",
                provider
            )));
        }
    }
    if subtitles.search_interval_hours == 0 {
        return Err(invalid("subtitles.search_interval_hours must be greater than 0"));
    }
    if subtitles.search_for_days > MAX_SEARCH_FOR_DAYS {
        return Err(ConfigError::ValidationError(format!(
            "subtitles.search_for_days cannot exceed {}",
            MAX_SEARCH_FOR_DAYS
        )));
    }
    if subtitles.desired_movie_score < subtitles.min_movie_score {
        return Err(invalid(
            "subtitles.desired_movie_score cannot be below min_movie_score",
        ));
    }
    if subtitles.desired_episode_score < subtitles.min_episode_score {
        return Err(invalid(
            "subtitles.desired_episode_score cannot be below min_episode_score",
        ));
    }

    if let Some(opensubtitles) = &config.opensubtitles {
        if opensubtitles.api_key.is_empty() {
            return Err(invalid("opensubtitles.api_key cannot be empty"));
        }
    }
    if let Some(sonarr) = &config.sonarr {
        if sonarr.url.is_empty() {
            return Err(invalid("sonarr.url cannot be empty"));
        }
    }
    if let Some(couchpotato) = &config.couchpotato {
        if couchpotato.url.is_empty() {
            return Err(invalid("couchpotato.url cannot be empty"));
        }
        if couchpotato.poll_attempts == 0 {
            return Err(invalid("couchpotato.poll_attempts must be at least 1"));
        }
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn config(toml: &str) -> Config {
        load_config_from_str(toml).unwrap()
    }

    fn assert_invalid(toml: &str) {
        let result = validate_config(&config(toml));
        assert!(
            matches!(result, Err(ConfigError::ValidationError(_))),
            "expected validation error for:\n{}",
            toml
        );
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        assert_invalid("[server]\nport = 0");
    }

    #[test]
    fn test_validate_languages() {
        assert_invalid("[subtitles]\nlanguages = []");
        assert_invalid("[subtitles]\nlanguages = [\"en\", \" \"]");
    }

    #[test]
    fn test_validate_interval() {
        assert_invalid("[subtitles]\nsearch_interval_hours = 0");
    }

    #[test]
    fn test_validate_search_for_days_bound() {
        assert_invalid("[subtitles]\nsearch_for_days = 4294967295");
        assert_invalid(&format!("[subtitles]\nsearch_for_days = {}", MAX_SEARCH_FOR_DAYS + 1));
        assert!(validate_config(&config(&format!(
            "[subtitles]\nsearch_for_days = {}",
            MAX_SEARCH_FOR_DAYS
        )))
        .is_ok());
        assert!(validate_config(&config("[subtitles]\nsearch_for_days = 0")).is_ok());
    }

    #[test]
    fn test_validate_providers() {
        assert_invalid("[subtitles]\nproviders = []");
        assert_invalid("[subtitles]\nproviders = [\"podnapisi\"]");
        assert_invalid("[subtitles]\nproviders = [\"opensubtitles\", \"opensubtitles\"]");
        assert!(validate_config(&config("[subtitles]\nproviders = [\"opensubtitles\"]")).is_ok());
    }

    #[test]
    fn test_validate_desired_not_below_minimum() {
        assert_invalid("[subtitles]\nmin_movie_score = 50\ndesired_movie_score = 40");
        assert_invalid("[subtitles]\nmin_episode_score = 250");
        assert!(validate_config(&config(
            "[subtitles]\nmin_movie_score = 40\ndesired_movie_score = 40"
        ))
        .is_ok());
    }

    #[test]
    fn test_validate_managers() {
        assert_invalid("[sonarr]\nurl = \"\"\napi_key = \"k\"");
        assert_invalid("[couchpotato]\nurl = \"http://cp\"\napi_key = \"k\"\npoll_attempts = 0");
        assert_invalid("[opensubtitles]\napi_key = \"\"");
    }
}
