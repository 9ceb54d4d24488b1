//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// Section names, lowercased and sorted.
    pub fn sections(&self) -> Vec<String> {
        let mut sections = self.config.sections();
        sections.sort();
        sections
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
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
    fn from_string_parses_config() {
        let content = r#"
[weights]
technical = 0.4
sentiment = 0.3

[thresholds]
buy = 0.5
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("weights", "technical"),
            Some("0.4".to_string())
        );
        assert_eq!(adapter.get_string("thresholds", "buy"), Some("0.5".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[weights]\ntechnical = 0.4\n").unwrap();
        assert_eq!(adapter.get_string("weights", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Weights]\nTechnical = 0.7\n").unwrap();
        assert_eq!(
            adapter.get_string("weights", "technical"),
            Some("0.7".to_string())
        );
    }

    #[test]
    fn sections_are_listed() {
        let adapter =
            FileConfigAdapter::from_string("[thresholds]\nbuy = 0.5\n[regime]\nwindow_size = 5\n")
                .unwrap();
        assert_eq!(adapter.sections(), vec!["regime", "thresholds"]);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[confidence]\nmin_floor = 0.25\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("confidence", "min_floor"),
            Some("0.25".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }
}
