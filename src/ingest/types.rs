//! Inbound payload types
//!
//! Devices are loosely typed: numeric fields arrive as JSON numbers or
//! strings, and any field may be missing. Deserialization never rejects
//! a malformed numeric value; it coerces to NaN and the reading is
//! stored anyway.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Raw sensor reading as submitted by a device
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorPayload {
    #[serde(default)]
    pub device_id: String,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    pub temperature: f64,
    #[serde(default = "nan", deserialize_with = "lenient_f64")]
    pub humidity: f64,
    /// RFC 3339 timestamp; ingestion time is used when absent or invalid
    #[serde(default)]
    pub timestamp: Option<String>,
}

fn nan() -> f64 {
    f64::NAN
}

/// Accept numbers, numeric strings, or anything else as NaN
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_fields_accept_strings() {
        let payload: SensorPayload =
            serde_json::from_str(r#"{"deviceId":"dev1","temperature":"23.5","humidity":"40"}"#)
                .unwrap();
        assert_eq!(payload.temperature, 23.5);
        assert_eq!(payload.humidity, 40.0);
    }

    #[test]
    fn test_numeric_fields_accept_numbers() {
        let payload: SensorPayload =
            serde_json::from_str(r#"{"deviceId":"dev1","temperature":23.5,"humidity":40}"#)
                .unwrap();
        assert_eq!(payload.temperature, 23.5);
        assert_eq!(payload.humidity, 40.0);
    }

    #[test]
    fn test_non_numeric_input_coerces_to_nan() {
        let payload: SensorPayload = serde_json::from_str(
            r#"{"deviceId":"dev1","temperature":"warm","humidity":null}"#,
        )
        .unwrap();
        assert!(payload.temperature.is_nan());
        assert!(payload.humidity.is_nan());
    }

    #[test]
    fn test_missing_fields_default() {
        let payload: SensorPayload = serde_json::from_str(r#"{}"#).unwrap();
        assert!(payload.device_id.is_empty());
        assert!(payload.device_name.is_none());
        assert!(payload.temperature.is_nan());
        assert!(payload.humidity.is_nan());
        assert!(payload.timestamp.is_none());
    }
}
