use std::env;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Absent means the service runs on the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub upload_dir: PathBuf,
    pub cors_origin: String,
    pub max_request_body_bytes: usize,
    pub max_resume_bytes: usize,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: 5,
            upload_dir: PathBuf::from("./storage/resumes"),
            cors_origin: "http://localhost:3000".to_string(),
            max_request_body_bytes: 25 * 1024 * 1024,
            max_resume_bytes: 10 * 1024 * 1024,
            bind_addr: "0.0.0.0:8000".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            database_max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            cors_origin: env::var("CORS_ALLOWED_ORIGIN").unwrap_or(defaults.cors_origin),
            max_request_body_bytes: parse_megabytes("MAX_REQUEST_BODY_MB", 25)?,
            max_resume_bytes: parse_megabytes("MAX_RESUME_MB", 10)?,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            name,
            expected: "number",
            value,
        }),
        Err(_) => Ok(default),
    }
}

/// Size limit given in megabytes, returned in bytes.
fn parse_megabytes(name: &'static str, default_mb: usize) -> Result<usize, ConfigError> {
    let megabytes = parse_var(name, default_mb)?;
    megabytes
        .checked_mul(1024 * 1024)
        .ok_or_else(|| ConfigError::Invalid {
            name,
            expected: "size in megabytes",
            value: megabytes.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_when_unset() {
        let value: u32 = parse_var("RECRUITMENT_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn parse_var_rejects_garbage() {
        env::set_var("RECRUITMENT_TEST_BAD_NUMBER", "lots");
        let err = parse_var::<usize>("RECRUITMENT_TEST_BAD_NUMBER", 1).unwrap_err();
        assert!(err.to_string().contains("RECRUITMENT_TEST_BAD_NUMBER"));
        env::remove_var("RECRUITMENT_TEST_BAD_NUMBER");
    }

    #[test]
    fn megabytes_convert_to_bytes() {
        env::set_var("RECRUITMENT_TEST_LIMIT_MB", "3");
        let bytes = parse_megabytes("RECRUITMENT_TEST_LIMIT_MB", 1).unwrap();
        assert_eq!(bytes, 3 * 1024 * 1024);
        env::remove_var("RECRUITMENT_TEST_LIMIT_MB");
    }

    #[test]
    fn oversized_megabyte_limit_is_an_error() {
        env::set_var("RECRUITMENT_TEST_HUGE_MB", usize::MAX.to_string());
        let err = parse_megabytes("RECRUITMENT_TEST_HUGE_MB", 10).unwrap_err();
        assert!(err.to_string().contains("RECRUITMENT_TEST_HUGE_MB"));
        env::remove_var("RECRUITMENT_TEST_HUGE_MB");
    }
}
