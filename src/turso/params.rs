use crate::error::SqlConnectorError;
use crate::types::{ParamConverter, RowValues};

/// Positional Turso parameters for one statement.
///
/// The library binds every value natively, blobs included. Timestamps and JSON have no
/// native type and travel as text, the same as on the sqlite backend.
#[derive(Debug, Clone, Default)]
pub struct Params(pub Vec<turso::Value>);

fn row_value_to_turso_value(value: &RowValues) -> turso::Value {
    match value {
        RowValues::Int(i) => turso::Value::Integer(*i),
        RowValues::Float(f) => turso::Value::Real(*f),
        RowValues::Bool(b) => turso::Value::Integer(i64::from(*b)),
        RowValues::Null => turso::Value::Null,
        RowValues::Blob(bytes) => turso::Value::Blob(bytes.clone()),
        other => other
            .stringified()
            .map_or(turso::Value::Null, turso::Value::Text),
    }
}

impl Params {
    #[must_use]
    pub fn convert(params: &[RowValues]) -> Self {
        Params(params.iter().map(row_value_to_turso_value).collect())
    }

    /// Owned positional params for one run of a statement.
    #[must_use]
    pub fn to_positional(&self) -> turso::params::Params {
        turso::params::Params::Positional(self.0.clone())
    }
}

impl ParamConverter<'_> for Params {
    type Converted = Params;

    fn convert_sql_params(params: &[RowValues]) -> Result<Self::Converted, SqlConnectorError> {
        Ok(Self::convert(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blobs_and_text_like_values_convert() {
        let params = Params::convert(&[
            RowValues::Blob(vec![9, 8]),
            RowValues::Bool(false),
            RowValues::JSON(json!([1, 2])),
        ]);
        assert!(matches!(&params.0[0], turso::Value::Blob(b) if b == &vec![9, 8]));
        assert!(matches!(params.0[1], turso::Value::Integer(0)));
        assert!(matches!(&params.0[2], turso::Value::Text(s) if s == "[1,2]"));
    }
}
