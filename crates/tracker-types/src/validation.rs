//! Schema validation for backend configuration tables.
//!
//! Every pluggable backend (storage, notifications) receives its own raw TOML
//! table. Backends describe the keys they accept with a [`Schema`] and the
//! builder rejects bad tables before any backend is constructed.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// Error that occurs when a required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// Error that occurs when a field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// Error that occurs when field type is incorrect.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Represents the type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// A string value.
	String,
	/// A string restricted to a fixed set of values.
	OneOf(Vec<&'static str>),
	/// An integer value with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	/// A boolean value.
	Boolean,
	/// An array of values, all of the same type.
	Array(Box<FieldType>),
	/// A nested table with its own schema.
	Table(Schema),
}

/// Custom check run after the type check passes; returns an error message.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field in a configuration schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	/// Creates a new field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator to this field.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		validate_field_type(&self.name, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Required and optional fields accepted by a configuration table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	/// Creates a new schema with required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML table against this schema.
	///
	/// Required fields must be present; optional fields are only checked when
	/// present. Unknown keys are ignored so backends can share a table.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

fn mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

/// Qualifies the field named in a nested table's error with its parent.
fn nested(parent: &str, err: ValidationError) -> ValidationError {
	let qualify = |field: String| format!("{}.{}", parent, field);
	match err {
		ValidationError::MissingField(field) => ValidationError::MissingField(qualify(field)),
		ValidationError::InvalidValue { field, message } => ValidationError::InvalidValue {
			field: qualify(field),
			message,
		},
		ValidationError::TypeMismatch {
			field,
			expected,
			actual,
		} => ValidationError::TypeMismatch {
			field: qualify(field),
			expected,
			actual,
		},
	}
}

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(mismatch(field_name, "string", value));
			}
		},
		FieldType::OneOf(allowed) => {
			let s = value
				.as_str()
				.ok_or_else(|| mismatch(field_name, "string", value))?;
			if !allowed.contains(&s) {
				return Err(ValidationError::InvalidValue {
					field: field_name.to_string(),
					message: format!("'{}' is not one of [{}]", s, allowed.join(", ")),
				});
			}
		},
		FieldType::Integer { min, max } => {
			let n = value
				.as_integer()
				.ok_or_else(|| mismatch(field_name, "integer", value))?;
			let out_of_range = match (min, max) {
				(Some(lo), _) if n < *lo => Some(format!("Value {} is less than minimum {}", n, lo)),
				(_, Some(hi)) if n > *hi => {
					Some(format!("Value {} is greater than maximum {}", n, hi))
				},
				_ => None,
			};
			if let Some(message) = out_of_range {
				return Err(ValidationError::InvalidValue {
					field: field_name.to_string(),
					message,
				});
			}
		},
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(mismatch(field_name, "boolean", value));
			}
		},
		FieldType::Array(inner_type) => {
			let array = value
				.as_array()
				.ok_or_else(|| mismatch(field_name, "array", value))?;

			for (i, item) in array.iter().enumerate() {
				validate_field_type(&format!("{}[{}]", field_name, i), item, inner_type)?;
			}
		},
		FieldType::Table(schema) => {
			schema
				.validate(value)
				.map_err(|e| nested(field_name, e))?;
		},
	}

	Ok(())
}

/// A configuration schema that can validate a backend's TOML table.
pub trait ConfigSchema: Send + Sync {
	/// Validates a TOML configuration value against this schema.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
