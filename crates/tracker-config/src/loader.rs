//! Multi-file configuration loading.
//!
//! A root file may name other files in `include`; their top-level sections
//! are merged into the root. A section may be defined by only one file.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// Loads a root configuration file plus the files it names in `include`.
///
/// Included files may not include further files; only the root's directive
/// is honoured.
pub struct ConfigLoader {
	/// Directory relative include paths are resolved against.
	root_dir: PathBuf,
	/// Canonical paths read so far.
	seen: HashSet<PathBuf>,
	/// File that defined each top-level section.
	owners: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(root_dir: impl AsRef<Path>) -> Self {
		Self {
			root_dir: root_dir.as_ref().to_path_buf(),
			seen: HashSet::new(),
			owners: HashMap::new(),
		}
	}

	/// Loads `entry` and everything it includes into a validated [`Config`].
	pub async fn load_config(&mut self, entry: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let entry = self.locate(entry.as_ref())?;
		let (text, mut root) = self.read_table(&entry).await?;

		let includes = match root.remove("include") {
			None => return text.parse(),
			Some(value) => include_paths(value)?,
		};

		self.claim_sections(&root, &entry)?;
		for include in includes {
			let path = self.locate(&include)?;
			let (_, table) = self.read_table(&path).await?;
			if table.contains_key("include") {
				return Err(ConfigError::Validation(format!(
					"Nested include in {} is not supported",
					path.display()
				)));
			}
			self.claim_sections(&table, &path)?;
			root.extend(table);
		}

		// Re-serialize so FromStr runs the same validation as a single file.
		let merged = toml::to_string(&root)
			.map_err(|e| ConfigError::Parse(format!("Failed to serialize combined config: {}", e)))?;
		merged.parse()
	}

	/// Reads one file, resolving environment variables, and parses it as a
	/// table. Each file may be read once per load.
	async fn read_table(&mut self, path: &Path) -> Result<(String, Table), ConfigError> {
		let canonical = path.canonicalize().map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;
		if !self.seen.insert(canonical) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				path.display()
			)));
		}

		let text = resolve_env_vars(&tokio::fs::read_to_string(path).await?)?;
		let table: Table = toml::from_str(&text)?;
		Ok((text, table))
	}

	/// Records `path` as the owner of each section in `table`.
	fn claim_sections(&mut self, table: &Table, path: &Path) -> Result<(), ConfigError> {
		for section in table.keys() {
			if let Some(owner) = self.owners.get(section) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}. \
					Each top-level section must be unique across all configuration files.",
					section,
					owner.display(),
					path.display()
				)));
			}
			self.owners.insert(section.clone(), path.to_path_buf());
		}
		Ok(())
	}

	fn locate(&self, path: &Path) -> Result<PathBuf, ConfigError> {
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.root_dir.join(path)
		};
		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}
		Ok(resolved)
	}
}

/// `include` accepts one path or a list of paths.
fn include_paths(value: Value) -> Result<Vec<PathBuf>, ConfigError> {
	match value {
		Value::String(path) => Ok(vec![PathBuf::from(path)]),
		Value::Array(items) => items
			.into_iter()
			.map(|item| match item {
				Value::String(path) => Ok(PathBuf::from(path)),
				_ => Err(ConfigError::Validation(
					"Include array must contain only strings".into(),
				)),
			})
			.collect(),
		_ => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	const TRACKER: &str = r#"
[tracker]
id = "fleet-test"
client_url = "https://po.example.com"
"#;

	const BACKENDS: &str = r#"
[storage]
primary = "file"
[storage.implementations.file]
storage_path = "./data"

[notifications]
primary = "log"
[notifications.implementations.log]
"#;

	const AUTH: &str = r#"
[auth]
token_secret = "0123456789abcdef0123"
cookie_secure = true
"#;

	#[tokio::test]
	async fn test_single_file_config() {
		let temp_dir = TempDir::new().unwrap();
		let config_path = temp_dir.path().join("config.toml");
		fs::write(&config_path, format!("{}{}{}", TRACKER, BACKENDS, AUTH)).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config(&config_path).await.unwrap();

		assert_eq!(config.tracker.id, "fleet-test");
		assert!(config.auth.cookie_secure);
	}

	#[tokio::test]
	async fn test_config_with_includes() {
		let temp_dir = TempDir::new().unwrap();

		let main_config = format!("include = [\"backends.toml\", \"auth.toml\"]\n{}", TRACKER);
		fs::write(temp_dir.path().join("main.toml"), main_config).unwrap();
		fs::write(temp_dir.path().join("backends.toml"), BACKENDS).unwrap();
		fs::write(temp_dir.path().join("auth.toml"), AUTH).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config("main.toml").await.unwrap();

		assert_eq!(config.tracker.client_url, "https://po.example.com");
		assert_eq!(config.storage.primary, "file");
		assert_eq!(config.notifications.primary, "log");
	}

	#[tokio::test]
	async fn test_single_include_string() {
		let temp_dir = TempDir::new().unwrap();

		let main_config = format!("include = \"rest.toml\"\n{}", TRACKER);
		fs::write(temp_dir.path().join("main.toml"), main_config).unwrap();
		fs::write(temp_dir.path().join("rest.toml"), format!("{}{}", BACKENDS, AUTH)).unwrap();

		let config = crate::Config::from_file(
			temp_dir.path().join("main.toml").to_str().unwrap(),
		)
		.await
		.unwrap();
		assert_eq!(config.tracker.id, "fleet-test");
	}

	#[tokio::test]
	async fn test_duplicate_section_error() {
		let temp_dir = TempDir::new().unwrap();

		let main_config = format!("include = [\"duplicate.toml\"]\n{}", TRACKER);
		fs::write(temp_dir.path().join("main.toml"), main_config).unwrap();
		fs::write(temp_dir.path().join("duplicate.toml"), TRACKER).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error_msg = loader.load_config("main.toml").await.unwrap_err().to_string();
		assert!(error_msg.contains("Duplicate section 'tracker'"));
	}

	#[tokio::test]
	async fn test_self_include_detection() {
		let temp_dir = TempDir::new().unwrap();

		let config = format!("include = [\"self.toml\"]\n{}", TRACKER);
		fs::write(temp_dir.path().join("self.toml"), config).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error_msg = loader.load_config("self.toml").await.unwrap_err().to_string();
		assert!(error_msg.contains("already loaded"));
	}

	#[tokio::test]
	async fn test_missing_include() {
		let temp_dir = TempDir::new().unwrap();
		let main_config = format!("include = [\"nope.toml\"]\n{}", TRACKER);
		fs::write(temp_dir.path().join("main.toml"), main_config).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error_msg = loader.load_config("main.toml").await.unwrap_err().to_string();
		assert!(error_msg.contains("Configuration file not found"));
	}

	#[tokio::test]
	async fn test_nested_include_rejected() {
		let temp_dir = TempDir::new().unwrap();
		let main_config = format!("include = [\"backends.toml\"]\n{}", TRACKER);
		fs::write(temp_dir.path().join("main.toml"), main_config).unwrap();
		let nested = format!("include = [\"auth.toml\"]\n{}", BACKENDS);
		fs::write(temp_dir.path().join("backends.toml"), nested).unwrap();
		fs::write(temp_dir.path().join("auth.toml"), AUTH).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error_msg = loader.load_config("main.toml").await.unwrap_err().to_string();
		assert!(error_msg.contains("Nested include"));
	}
}
