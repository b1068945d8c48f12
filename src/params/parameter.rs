use crate::types::{ParamDirection, SqlDataType, SqlValue};

/// A single named command parameter.
///
/// The name always carries the binder prefix (`@id`, `:id`, ...); the
/// collection that owns the parameter applies the prefix on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlParameter {
    name: String,
    value: SqlValue,
    data_type: Option<SqlDataType>,
    direction: ParamDirection,
    size: Option<usize>,
    precision: Option<u8>,
    scale: Option<u8>,
    nullable: bool,
}

impl SqlParameter {
    /// Create an input parameter with just a name and value.
    pub fn new(name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            nullable: value.is_null(),
            value,
            data_type: None,
            direction: ParamDirection::Input,
            size: None,
            precision: None,
            scale: None,
        }
    }

    #[must_use]
    pub fn with_data_type(mut self, data_type: SqlDataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    #[must_use]
    pub fn with_direction(mut self, direction: ParamDirection) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_precision_scale(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &SqlValue {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<SqlValue>) {
        self.value = value.into();
    }

    #[must_use]
    pub fn data_type(&self) -> Option<SqlDataType> {
        self.data_type
    }

    pub fn set_data_type(&mut self, data_type: Option<SqlDataType>) {
        self.data_type = data_type;
    }

    #[must_use]
    pub fn direction(&self) -> ParamDirection {
        self.direction
    }

    #[must_use]
    pub fn size(&self) -> Option<usize> {
        self.size
    }

    #[must_use]
    pub fn precision(&self) -> Option<u8> {
        self.precision
    }

    #[must_use]
    pub fn scale(&self) -> Option<u8> {
        self.scale
    }

    #[must_use]
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    /// Whether the backend writes a value into this parameter.
    #[must_use]
    pub fn is_output(&self) -> bool {
        matches!(
            self.direction,
            ParamDirection::Output | ParamDirection::InputOutput | ParamDirection::ReturnValue
        )
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }
}
