//! Handler for the `config` command group.

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::domain::Family;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Settings;
use crate::infrastructure::config::ConfigStore;

/// Execute `config init`.
pub fn execute_init(settings: &Settings, force: bool) -> Result<()> {
    let store = ConfigStore::new(&settings.config_dir);
    let written = store.ensure_defaults(force)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "config.init",
            "dir": store.dir().display().to_string(),
            "written": written.iter().map(|f| f.config_file()).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    output::section("Config Initialized");
    output::field("Directory", store.dir().display());
    if written.is_empty() {
        output::note("Every family already has a document (use --force to overwrite)");
    }
    for family in written {
        output::success(&format!("Wrote {}", family.config_file()));
    }
    output::hint("edit the documents, then run `stackwatch config validate`");
    Ok(())
}

/// Execute `config validate`.
///
/// Every family is checked even after a failure; the first failure is returned.
pub fn execute_validate(settings: &Settings) -> Result<()> {
    let store = ConfigStore::new(&settings.config_dir);
    let mut first_error: Option<ConfigError> = None;
    let mut report = Vec::new();

    output::section("Config Validation");
    output::field("Directory", store.dir().display());
    for family in Family::ALL {
        match store.check(family) {
            Ok(instances) => {
                output::success(&format!("{} ({instances} instance(s))", family.config_file()));
                report.push(json!({ "family": family, "valid": true, "instances": instances }));
            }
            Err(e) => {
                output::error(&format!("{}: {e}", family.config_file()));
                report.push(json!({ "family": family, "valid": false, "error": e.to_string() }));
                first_error.get_or_insert(e);
            }
        }
    }

    if output::is_json() {
        output::json_output(json!({ "command": "config.validate", "families": report }));
    }
    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn settings(dir: &std::path::Path) -> Settings {
        Settings {
            config_dir: dir.to_path_buf(),
            ..Settings::default()
        }
    }

    #[test]
    fn init_writes_every_family_then_validates() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());

        execute_init(&settings, false).unwrap();
        for family in Family::ALL {
            assert!(dir.path().join(family.config_file()).exists());
        }
        execute_validate(&settings).unwrap();
    }

    #[test]
    fn init_keeps_existing_documents_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let path = dir.path().join(Family::Kafka.config_file());
        fs::write(&path, "# mine\n").unwrap();

        execute_init(&settings, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# mine\n");

        execute_init(&settings, true).unwrap();
        assert_ne!(fs::read_to_string(&path).unwrap(), "# mine\n");
    }

    #[test]
    fn validate_reports_invalid_family() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        fs::write(
            dir.path().join(Family::Kafka.config_file()),
            "[kafka]\nname = \"main\"\nbrokers = []\n",
        )
        .unwrap();

        assert!(execute_validate(&settings).is_err());
    }
}
