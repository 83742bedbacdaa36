use libsql::Value;

use crate::error::SqlCompatError;
use crate::types::{ParamConverter, RowValues};

/// Container for libsql parameters
#[derive(Debug, Clone)]
pub struct Params(pub Vec<Value>);

impl Params {
    /// Get a reference to the underlying parameter array
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    /// Convert to owned vector for use with libsql API
    #[must_use]
    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl ParamConverter for Params {
    fn convert_sql_params(params: &[RowValues]) -> Result<Self, SqlCompatError> {
        let libsql_params = params
            .iter()
            .map(|param| match param {
                RowValues::Int(i) => Value::Integer(*i),
                RowValues::Float(f) => Value::Real(*f),
                RowValues::Text(s) => Value::Text(s.clone()),
                RowValues::Bool(b) => Value::Integer(i64::from(*b)),
                RowValues::Timestamp(dt) => Value::Text(RowValues::timestamp_text(dt)),
                RowValues::Null => Value::Null,
                RowValues::JSON(jval) => Value::Text(jval.to_string()),
                RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
            })
            .collect();
        Ok(Params(libsql_params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bools_bind_as_integers() {
        let params =
            Params::convert_sql_params(&[RowValues::Bool(false), RowValues::from("x")]).unwrap();
        assert!(matches!(params.as_slice()[0], Value::Integer(0)));
        assert!(matches!(&params.as_slice()[1], Value::Text(s) if s == "x"));
    }
}
