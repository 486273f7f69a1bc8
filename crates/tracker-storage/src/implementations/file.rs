//! File-based storage backend.
//!
//! Each record lives in its own file under `{storage_path}/{namespace}/`,
//! prefixed with a fixed-size header carrying its expiry time.

use crate::{split_key, StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracker_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, StorageKey, ValidationError,
};

fn unix_now() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}

#[allow(clippy::doc_nested_refdefs)]
/// Fixed-size file header for TTL support.
///
/// Binary layout (64 bytes total):
/// - [0-3]: Magic bytes "TRKS"
/// - [4-5]: Version (u16, little-endian)
/// - [6-13]: Expiration timestamp (u64, little-endian, Unix seconds, 0 = never)
/// - [14-63]: Reserved
#[derive(Debug, Clone)]
struct FileHeader {
	version: u16,
	expires_at: u64,
}

impl FileHeader {
	const MAGIC: &'static [u8; 4] = b"TRKS";
	const VERSION: u16 = 1;
	const SIZE: usize = 64;

	fn new(ttl: Duration) -> Self {
		let expires_at = if ttl.is_zero() {
			0
		} else {
			unix_now().saturating_add(ttl.as_secs().max(1))
		};

		Self {
			version: Self::VERSION,
			expires_at,
		}
	}

	fn serialize(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
		bytes[6..14].copy_from_slice(&self.expires_at.to_le_bytes());
		bytes
	}

	fn deserialize(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE {
			return Err(StorageError::Backend("File too small for header".into()));
		}
		if &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Unrecognized file format".into()));
		}

		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported file version: {}",
				version
			)));
		}

		let mut expires_bytes = [0u8; 8];
		expires_bytes.copy_from_slice(&bytes[6..14]);

		Ok(Self {
			version,
			expires_at: u64::from_le_bytes(expires_bytes),
		})
	}

	fn is_expired(&self) -> bool {
		self.expires_at != 0 && unix_now() >= self.expires_at
	}
}

/// Default TTLs per namespace, applied when a write carries no TTL.
#[derive(Debug, Clone, Default)]
pub struct TtlConfig {
	ttls: HashMap<StorageKey, Duration>,
}

impl TtlConfig {
	/// Reads `ttl_{namespace}` keys (seconds) from the backend table.
	fn from_config(config: &toml::Value) -> Self {
		let mut ttls = HashMap::new();

		if let Some(table) = config.as_table() {
			for storage_key in StorageKey::all() {
				let config_key = format!("ttl_{}", storage_key.as_str());
				if let Some(ttl_value) = table
					.get(&config_key)
					.and_then(|v| v.as_integer())
					.map(|v| v.max(0) as u64)
				{
					ttls.insert(storage_key, Duration::from_secs(ttl_value));
				}
			}
		}

		Self { ttls }
	}

	fn get_ttl(&self, storage_key: StorageKey) -> Duration {
		self.ttls
			.get(&storage_key)
			.copied()
			.unwrap_or(Duration::ZERO)
	}
}

/// File-based storage implementation.
///
/// Writes go to a temporary file that is renamed into place, so a reader
/// never observes a half-written record.
pub struct FileStorage {
	base_path: PathBuf,
	ttl_config: TtlConfig,
}

impl FileStorage {
	pub fn new(base_path: PathBuf, ttl_config: TtlConfig) -> Self {
		Self {
			base_path,
			ttl_config,
		}
	}

	fn sanitize(part: &str) -> String {
		part.replace(['/', '\\', ':', '.'], "_")
	}

	fn namespace_dir(&self, namespace: &str) -> PathBuf {
		if namespace.is_empty() {
			self.base_path.clone()
		} else {
			self.base_path.join(Self::sanitize(namespace))
		}
	}

	fn get_file_path(&self, key: &str) -> PathBuf {
		let (namespace, id) = split_key(key);
		self.namespace_dir(namespace)
			.join(format!("{}.bin", Self::sanitize(id)))
	}

	fn get_ttl_for_key(&self, key: &str) -> Duration {
		split_key(key)
			.0
			.parse::<StorageKey>()
			.map(|sk| self.ttl_config.get_ttl(sk))
			.unwrap_or(Duration::ZERO)
	}

	/// Reads a record file, returning `None` if it is missing or expired.
	async fn read_live(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
		let data = match fs::read(path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let header = FileHeader::deserialize(&data)?;
		if header.is_expired() {
			return Ok(None);
		}
		Ok(Some(data[FileHeader::SIZE..].to_vec()))
	}

	async fn bin_files(dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
		let mut entries = match fs::read_dir(dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut files = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() == Some(std::ffi::OsStr::new("bin")) {
				files.push(path);
			}
		}
		Ok(files)
	}

	/// Removes all expired files from every namespace directory.
	async fn cleanup_expired_files(&self) -> Result<usize, StorageError> {
		let mut removed = 0;
		for storage_key in StorageKey::all() {
			let dir = self.namespace_dir(storage_key.as_str());
			for path in Self::bin_files(&dir).await? {
				let data = match fs::read(&path).await {
					Ok(data) => data,
					Err(e) => {
						tracing::debug!("Skipping file {:?}: could not be read: {}", path, e);
						continue;
					},
				};
				match FileHeader::deserialize(&data) {
					Ok(header) if header.is_expired() => {
						if let Err(e) = fs::remove_file(&path).await {
							tracing::warn!("Failed to remove expired file {:?}: {}", path, e);
						} else {
							removed += 1;
						}
					},
					Ok(_) => {},
					Err(e) => tracing::debug!("Skipping file {:?}: {}", path, e),
				}
			}
		}
		Ok(removed)
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		Self::read_live(&self.get_file_path(key))
			.await?
			.ok_or(StorageError::NotFound)
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let path = self.get_file_path(key);
		let dir = path
			.parent()
			.map(Path::to_path_buf)
			.ok_or_else(|| StorageError::Backend(format!("No parent for {}", path.display())))?;
		fs::create_dir_all(&dir)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let ttl = ttl.unwrap_or_else(|| self.get_ttl_for_key(key));
		let header = FileHeader::new(ttl);

		let mut file_data = Vec::with_capacity(FileHeader::SIZE + value.len());
		file_data.extend_from_slice(&header.serialize());
		file_data.extend_from_slice(&value);

		// One uniquely named temp file per write, renamed over the record.
		tokio::task::spawn_blocking(move || -> std::io::Result<()> {
			let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
			temp.write_all(&file_data)?;
			temp.persist(&path).map_err(|e| e.error)?;
			Ok(())
		})
		.await
		.map_err(|e| StorageError::Backend(e.to_string()))?
		.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		match fs::remove_file(self.get_file_path(key)).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Ok(Self::read_live(&self.get_file_path(key)).await?.is_some())
	}

	async fn list(&self, namespace: &str) -> Result<Vec<Vec<u8>>, StorageError> {
		let mut values = Vec::new();
		for path in Self::bin_files(&self.namespace_dir(namespace)).await? {
			if let Some(value) = Self::read_live(&path).await? {
				values.push(value);
			}
		}
		Ok(values)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		self.cleanup_expired_files().await
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let mut optional_fields = vec![Field::new("storage_path", FieldType::String)];

		for storage_key in StorageKey::all() {
			optional_fields.push(Field::new(
				format!("ttl_{}", storage_key.as_str()),
				FieldType::Integer {
					min: Some(0),
					max: None,
				},
			));
		}

		Schema::new(vec![], optional_fields).validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
/// - `ttl_{namespace}`: default TTL in seconds for a namespace (default: 0, never)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage")
		.to_string();

	Ok(Box::new(FileStorage::new(
		PathBuf::from(storage_path),
		TtlConfig::from_config(config),
	)))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}
