use rusqlite::types::Value;

use crate::error::SqlConnectorError;
use crate::types::{ParamConverter, RowValues};

/// Wire class a parameter is bound as.
///
/// Every parameter is classified explicitly before binding: booleans, integers and nulls
/// bind as integers, floats as doubles, everything textual as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Double,
    Text,
}

impl ParamKind {
    /// One-letter type code (`i`, `d`, `s`).
    #[must_use]
    pub fn code(self) -> char {
        match self {
            ParamKind::Int => 'i',
            ParamKind::Double => 'd',
            ParamKind::Text => 's',
        }
    }
}

/// Classify a single value and convert it to a rusqlite `Value`.
///
/// # Errors
///
/// Returns `SqlConnectorError::ParameterError` for blobs, which have no bind class here.
pub fn classify(value: &RowValues) -> Result<(ParamKind, Value), SqlConnectorError> {
    let typed = match value {
        RowValues::Null => (ParamKind::Int, Value::Null),
        RowValues::Bool(b) => (ParamKind::Int, Value::Integer(i64::from(*b))),
        RowValues::Int(i) => (ParamKind::Int, Value::Integer(*i)),
        RowValues::Float(f) => (ParamKind::Double, Value::Real(*f)),
        RowValues::Blob(_) => {
            return Err(SqlConnectorError::ParameterError(
                "blob parameters are not supported by the sqlite backend".to_string(),
            ));
        }
        // Text, timestamps and JSON all bind as strings.
        other => match other.stringified() {
            Some(s) => (ParamKind::Text, Value::Text(s)),
            None => (ParamKind::Text, Value::Null),
        },
    };
    Ok(typed)
}

/// Classified parameters for one statement.
#[derive(Debug, Clone, Default)]
pub struct Params {
    kinds: Vec<ParamKind>,
    values: Vec<Value>,
}

impl Params {
    /// Classify every parameter.
    ///
    /// # Errors
    ///
    /// Returns `SqlConnectorError::ParameterError` if any parameter cannot be bound.
    pub fn convert(params: &[RowValues]) -> Result<Self, SqlConnectorError> {
        let mut out = Params {
            kinds: Vec::with_capacity(params.len()),
            values: Vec::with_capacity(params.len()),
        };
        for p in params {
            let (kind, value) = classify(p)?;
            out.kinds.push(kind);
            out.values.push(value);
        }
        Ok(out)
    }

    /// Type codes in bind order, e.g. `"iis"`.
    #[must_use]
    pub fn type_codes(&self) -> String {
        self.kinds.iter().map(|k| k.code()).collect()
    }

    #[must_use]
    pub fn kinds(&self) -> &[ParamKind] {
        &self.kinds
    }

    #[must_use]
    pub fn as_values(&self) -> &[Value] {
        &self.values
    }
}

impl ParamConverter<'_> for Params {
    type Converted = Params;

    fn convert_sql_params(params: &[RowValues]) -> Result<Self::Converted, SqlConnectorError> {
        Self::convert(params)
    }
}
