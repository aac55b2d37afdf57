use super::CliError;
use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub(super) fn read_json_request<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read request '{}'", path.display()))?;
    serde_json::from_str(&source).map_err(|error| {
        CliError::Request(format!("invalid request '{}': {error}", path.display()))
    })
}

pub(super) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON output")?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::read_json_request;
    use crate::cli::CliError;
    use serde::Deserialize;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize)]
    struct Sample {
        values: Vec<f64>,
    }

    #[test]
    fn reads_well_formed_request() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("sample.json");
        fs::write(&path, r#"{ "values": [1.0, 2.0] }"#).expect("request should be written");

        let sample: Sample = read_json_request(&path).expect("request should parse");
        assert_eq!(sample.values, vec![1.0, 2.0]);
    }

    #[test]
    fn malformed_request_is_reported_as_request_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("sample.json");
        fs::write(&path, "{ not json").expect("request should be written");

        let error = read_json_request::<Sample>(&path).expect_err("request should not parse");
        assert!(matches!(error, CliError::Request(_)));
    }

    #[test]
    fn missing_request_is_an_internal_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = read_json_request::<Sample>(&temp.path().join("absent.json"))
            .expect_err("missing file should fail");
        assert!(matches!(error, CliError::Internal(_)));
    }
}
