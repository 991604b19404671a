// Runtime shape validation for untyped JSON payloads
//
// Server responses are checked field by field before serde ever sees them,
// so a malformed payload is rejected with a diagnostic naming the first
// offending field instead of a generic deserialization error.

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Tracing target for field diagnostics.
pub const DIAGNOSTIC_TARGET: &str = "portal_api::validate";

/// Primitive JSON kinds a field can be checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    String,
    Boolean,
    Array,
}

impl FieldKind {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Why a single field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationReason {
    #[error("input is missing")]
    InputMissing,

    #[error("property is missing")]
    PropertyMissing,

    #[error("expected {expected}, got {actual}")]
    WrongType {
        expected: FieldKind,
        actual: &'static str,
    },
}

/// A failed field check. `type_name` is the dotted path of the object that
/// held the field (e.g. `EventData.volunteers[0]`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unable to validate {type_name}.{property}: {reason}")]
pub struct ValidationError {
    pub type_name: String,
    pub property: String,
    pub reason: ValidationReason,
}

impl ValidationError {
    fn new(type_name: &str, property: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            type_name: type_name.to_owned(),
            property: property.into(),
            reason,
        }
    }

    /// Emit this error as a diagnostic.
    pub(crate) fn report(&self) {
        warn!(
            target: DIAGNOSTIC_TARGET,
            type_name = %self.type_name,
            property = %self.property,
            "{self}"
        );
    }
}

/// Check one property of `input` without emitting anything.
///
/// Returns the property value on success so callers can descend into it.
pub fn check_field<'a>(
    input: Option<&'a Value>,
    type_name: &str,
    property: &str,
    kind: FieldKind,
) -> Result<&'a Value, ValidationError> {
    let Some(input) = input.filter(|v| !v.is_null()) else {
        return Err(ValidationError::new(
            type_name,
            property,
            ValidationReason::InputMissing,
        ));
    };

    let Some(value) = input.get(property) else {
        return Err(ValidationError::new(
            type_name,
            property,
            ValidationReason::PropertyMissing,
        ));
    };

    if kind.matches(value) {
        Ok(value)
    } else {
        Err(ValidationError::new(
            type_name,
            property,
            ValidationReason::WrongType {
                expected: kind,
                actual: json_type_name(value),
            },
        ))
    }
}

/// Check one property of `input`, emitting a diagnostic on failure.
pub fn validate_field(
    input: Option<&Value>,
    type_name: &str,
    property: &str,
    kind: FieldKind,
) -> bool {
    match check_field(input, type_name, property, kind) {
        Ok(_) => true,
        Err(e) => {
            e.report();
            false
        }
    }
}

// ── Declarative shapes ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Element {
    Kind(FieldKind),
    Shape(fn() -> Shape),
}

#[derive(Debug, Clone, Copy)]
enum Rule {
    Kind(FieldKind),
    ArrayOf(Element),
}

#[derive(Debug, Clone)]
struct FieldRule {
    name: &'static str,
    rule: Rule,
    required: bool,
}

/// The expected structure of a JSON object.
///
/// Fields are checked in declaration order and validation stops at the
/// first failure, so a rejected payload yields exactly one diagnostic.
///
/// ```
/// use portal_api::{FieldKind, Shape};
///
/// let shape = Shape::new("Floor")
///     .field("id", FieldKind::Number)
///     .field("name", FieldKind::String);
/// assert!(shape.check(&serde_json::json!({ "id": 1, "name": "Ground" })).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Shape {
    type_name: &'static str,
    fields: Vec<FieldRule>,
}

impl Shape {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// A required field of a primitive kind.
    pub fn field(self, name: &'static str, kind: FieldKind) -> Self {
        self.push(name, Rule::Kind(kind), true)
    }

    /// A field that may be absent or `null`, but must match `kind` when set.
    pub fn optional(self, name: &'static str, kind: FieldKind) -> Self {
        self.push(name, Rule::Kind(kind), false)
    }

    /// A required array whose elements all match `kind`.
    pub fn array_of_kind(self, name: &'static str, kind: FieldKind) -> Self {
        self.push(name, Rule::ArrayOf(Element::Kind(kind)), true)
    }

    /// A required array whose elements are objects of the given shape.
    pub fn array_of(self, name: &'static str, element: fn() -> Shape) -> Self {
        self.push(name, Rule::ArrayOf(Element::Shape(element)), true)
    }

    fn push(mut self, name: &'static str, rule: Rule, required: bool) -> Self {
        self.fields.push(FieldRule {
            name,
            rule,
            required,
        });
        self
    }

    /// Check `input` against this shape without emitting anything.
    pub fn check(&self, input: &Value) -> Result<(), ValidationError> {
        self.check_at(Some(input), self.type_name)
    }

    /// Check `input` against this shape, emitting a diagnostic for the
    /// first failing field.
    pub fn validate(&self, input: &Value) -> bool {
        match self.check(input) {
            Ok(()) => true,
            Err(e) => {
                e.report();
                false
            }
        }
    }

    fn check_at(&self, input: Option<&Value>, path: &str) -> Result<(), ValidationError> {
        for field in &self.fields {
            if !field.required {
                let is_object = input.is_some_and(Value::is_object);
                let set = input
                    .and_then(|v| v.get(field.name))
                    .is_some_and(|v| !v.is_null());
                if is_object && !set {
                    continue;
                }
            }

            let kind = match field.rule {
                Rule::Kind(kind) => kind,
                Rule::ArrayOf(_) => FieldKind::Array,
            };
            let value = check_field(input, path, field.name, kind)?;

            if let Rule::ArrayOf(element) = field.rule {
                let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
                check_elements(items, element, path, field.name)?;
            }
        }
        Ok(())
    }
}

fn check_elements(
    items: &[Value],
    element: Element,
    path: &str,
    field: &str,
) -> Result<(), ValidationError> {
    for (index, item) in items.iter().enumerate() {
        match element {
            Element::Kind(kind) => {
                if !kind.matches(item) {
                    return Err(ValidationError::new(
                        path,
                        format!("{field}[{index}]"),
                        ValidationReason::WrongType {
                            expected: kind,
                            actual: json_type_name(item),
                        },
                    ));
                }
            }
            Element::Shape(shape) => {
                let nested = format!("{path}.{field}[{index}]");
                shape().check_at(Some(item), &nested)?;
            }
        }
    }
    Ok(())
}
