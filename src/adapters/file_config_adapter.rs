//! INI file configuration adapter.
//!
//! Section and key names are case-insensitive; values are trimmed.

use crate::domain::error::TrendscoreError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrendscoreError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| TrendscoreError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TrendscoreError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TrendscoreError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn sections(&self) -> Vec<String> {
        let mut sections = self.config.sections();
        sections.sort();
        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[data]
path = /srv/prices
exchange = NSE

[benchmark]
code = NIFTY

[scan]
codes = INFY, TCS
threshold = 70
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_string("data", "path"), Some("/srv/prices".to_string()));
        assert_eq!(adapter.get_string("benchmark", "code"), Some("NIFTY".to_string()));
        assert_eq!(adapter.get_string("scan", "codes"), Some("INFY, TCS".to_string()));
        assert_eq!(adapter.get_string("scan", "threshold"), Some("70".to_string()));
        assert_eq!(adapter.sections(), vec!["benchmark", "data", "scan"]);
    }

    #[test]
    fn names_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Data]
Exchange = NSE
").unwrap();
        assert_eq!(adapter.get_string("data", "exchange"), Some("NSE".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[data]
exchange = NSE
").unwrap();
        assert_eq!(adapter.get_string("data", "path"), None);
        assert_eq!(adapter.get_string("benchmark", "code"), None);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[analysis]\nas_of = 2024-06-28\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("analysis", "as_of"),
            Some("2024-06-28".to_string())
        );
    }

    #[test]
    fn from_file_missing_file_is_a_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/trendscore.ini").unwrap_err();
        match err {
            TrendscoreError::ConfigParse { file, .. } => assert!(file.ends_with("trendscore.ini")),
            other => panic!("expected ConfigParse, got {other:?}"),
        }
    }
}
