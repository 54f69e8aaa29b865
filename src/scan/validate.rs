//! Raw JSON batch → typed rows + feature matrix.

use super::{ScanRow, Timestamp};
use crate::error::ValidationError;
use ndarray::Array2;
use serde_json::Value;

/// Output of [`validate`]: rows in input order and their feature matrix.
///
/// Columns are latitude, longitude and, when every row carries an epoch
/// number, the timestamp.
#[derive(Debug, Clone)]
pub struct ValidatedBatch {
    pub rows: Vec<ScanRow>,
    pub features: Array2<f64>,
}

impl ValidatedBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn batch_ids(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.batch_id.as_str())
    }

    /// True when the timestamp was usable as a feature column.
    pub fn has_time_feature(&self) -> bool {
        self.features.ncols() == 3
    }
}

fn coerce_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|x| x.is_finite())
}

fn parse_coordinate(
    v: &Value,
    index: usize,
    field: &'static str,
    bound: f64,
) -> Result<f64, ValidationError> {
    let value = coerce_number(v).ok_or(ValidationError::NotNumeric { index, field })?;
    if value.abs() > bound {
        return Err(ValidationError::OutOfRange { index, field, value });
    }
    Ok(value)
}

fn parse_row(index: usize, raw: &Value) -> Result<ScanRow, ValidationError> {
    let fields = raw.as_array().ok_or(ValidationError::NotARow { index })?;
    if fields.len() < 4 {
        return Err(ValidationError::TooFewFields {
            index,
            found: fields.len(),
        });
    }

    let batch_id = match &fields[0] {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err(ValidationError::InvalidIdentifier { index }),
    };
    let latitude = parse_coordinate(&fields[1], index, "latitude", 90.0)?;
    let longitude = parse_coordinate(&fields[2], index, "longitude", 180.0)?;
    let timestamp = match &fields[3] {
        Value::Number(n) => Timestamp::Epoch(n.clone()),
        Value::String(s) => Timestamp::Text(s.clone()),
        _ => return Err(ValidationError::InvalidTimestamp { index }),
    };

    Ok(ScanRow {
        batch_id,
        latitude,
        longitude,
        timestamp,
    })
}

/// Check a raw batch. `None` and `null` mean the caller sent nothing.
pub fn validate(raw: Option<&Value>) -> Result<ValidatedBatch, ValidationError> {
    let rows = match raw {
        None | Some(Value::Null) => return Err(ValidationError::EmptyBatch),
        Some(Value::Array(rows)) => rows,
        Some(_) => return Err(ValidationError::NotABatch),
    };
    if rows.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }

    let rows = rows
        .iter()
        .enumerate()
        .map(|(i, r)| parse_row(i, r))
        .collect::<Result<Vec<_>, _>>()?;

    let times: Option<Vec<f64>> = rows.iter().map(|r| r.timestamp.as_feature()).collect();
    let features = match times {
        Some(times) => Array2::from_shape_fn((rows.len(), 3), |(i, j)| match j {
            0 => rows[i].latitude,
            1 => rows[i].longitude,
            _ => times[i],
        }),
        None => Array2::from_shape_fn((rows.len(), 2), |(i, j)| {
            if j == 0 {
                rows[i].latitude
            } else {
                rows[i].longitude
            }
        }),
    };

    Ok(ValidatedBatch { rows, features })
}
