//! Schema validation of raw configuration tables.
//!
//! Runs against the parsed `toml::Value` before it is deserialized into
//! [`crate::types::RoutesConfig`], so errors name the offending key instead
//! of surfacing as a serde message.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),

	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },

	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

impl ValidationError {
	/// Prefixes the field path, used when descending into nested tables.
	fn nested(self, parent: &str) -> Self {
		match self {
			Self::MissingField(f) => Self::MissingField(format!("{}.{}", parent, f)),
			Self::InvalidValue { field, message } => Self::InvalidValue {
				field: format!("{}.{}", parent, field),
				message,
			},
			Self::TypeMismatch {
				field,
				expected,
				actual,
			} => Self::TypeMismatch {
				field: format!("{}.{}", parent, field),
				expected,
				actual,
			},
		}
	}
}

#[derive(Debug)]
pub enum FieldType {
	String,
	Integer { min: Option<i64>, max: Option<i64> },
	Boolean,
	Array(Box<FieldType>),
	Table(Schema),
}

pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

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
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

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

/// Required and optional fields of one table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

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

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	let mismatch = |expected: &str| ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	};

	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(mismatch("string"));
			}
		}
		FieldType::Integer { min, max } => {
			let int_val = value.as_integer().ok_or_else(|| mismatch("integer"))?;

			if let Some(min_val) = min {
				if int_val < *min_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is less than minimum {}", int_val, min_val),
					});
				}
			}

			if let Some(max_val) = max {
				if int_val > *max_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is greater than maximum {}", int_val, max_val),
					});
				}
			}
		}
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(mismatch("boolean"));
			}
		}
		FieldType::Array(inner_type) => {
			let array = value.as_array().ok_or_else(|| mismatch("array"))?;

			for (i, item) in array.iter().enumerate() {
				validate_field_type(&format!("{}[{}]", field_name, i), item, inner_type)?;
			}
		}
		FieldType::Table(schema) => {
			schema.validate(value).map_err(|e| e.nested(field_name))?;
		}
	}

	Ok(())
}

/// Accepts `0x` followed by exactly 40 hex characters.
pub fn validate_address(value: &toml::Value) -> Result<(), String> {
	let s = value.as_str().ok_or("expected a string")?;
	let hex_part = s
		.strip_prefix("0x")
		.ok_or_else(|| format!("'{}' must start with 0x", s))?;

	if hex_part.len() != 40 {
		return Err(format!("'{}' must be 20 bytes (40 hex characters)", s));
	}
	hex::decode(hex_part).map_err(|_| format!("'{}' is not valid hex", s))?;

	Ok(())
}

pub fn validate_address_list(value: &toml::Value) -> Result<(), String> {
	let items = value.as_array().ok_or("expected an array")?;
	items.iter().try_for_each(validate_address)
}

pub fn validate_http_url(value: &toml::Value) -> Result<(), String> {
	let s = value.as_str().ok_or("expected a string")?;
	if s.starts_with("http://") || s.starts_with("https://") {
		Ok(())
	} else {
		Err(format!("'{}' must be an http(s) URL", s))
	}
}

/// Schema for a `[chains.<id>]` table.
pub fn chain_schema() -> Schema {
	Schema::new(
		vec![
			Field::new("rpc_url", FieldType::String).with_validator(validate_http_url),
			Field::new("intent_source", FieldType::String).with_validator(validate_address),
			Field::new("inbox", FieldType::String).with_validator(validate_address),
		],
		vec![
			Field::new("name", FieldType::String),
			Field::new("hyper_prover", FieldType::String).with_validator(validate_address),
			Field::new("meta_prover", FieldType::String).with_validator(validate_address),
			Field::new("permit2", FieldType::String).with_validator(validate_address),
			Field::new("stablecoins", FieldType::Array(Box::new(FieldType::String)))
				.with_validator(validate_address_list),
		],
	)
}

/// Schema for the `[quoting]` table.
pub fn quoting_schema() -> Schema {
	Schema::new(
		vec![],
		vec![
			Field::new("base_url", FieldType::String).with_validator(validate_http_url),
			Field::new("quotes_path", FieldType::String),
			Field::new("reverse_quotes_path", FieldType::String),
			Field::new("gasless_path", FieldType::String),
			Field::new(
				"max_attempts",
				FieldType::Integer {
					min: Some(1),
					max: Some(20),
				},
			),
			Field::new(
				"retry_delay_ms",
				FieldType::Integer {
					min: Some(0),
					max: None,
				},
			),
			Field::new(
				"timeout_secs",
				FieldType::Integer {
					min: Some(1),
					max: None,
				},
			),
		],
	)
}
