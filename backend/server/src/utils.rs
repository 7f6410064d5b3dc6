use axum::body::Bytes;
use records::AppointmentStatus;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError::{self, InvalidStatus, MalformedPayload, MissingFields};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusPayload {
    appointment_id: Option<Value>,
    status: Option<Value>,
}

/// Validated body of a status update.
#[derive(Debug, PartialEq, Eq)]
pub struct StatusUpdate {
    pub appointment_id: String,
    pub status: AppointmentStatus,
}

/// Present, string, non-empty. Anything else counts as missing.
fn required(field: Option<Value>) -> Option<String> {
    match field? {
        Value::String(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

pub fn get_status_update(body: &Bytes) -> Result<StatusUpdate, AppError> {
    let payload: StatusPayload = serde_json::from_slice(body).map_err(|_| MalformedPayload)?;

    let (Some(appointment_id), Some(status)) =
        (required(payload.appointment_id), required(payload.status))
    else {
        return Err(MissingFields);
    };

    let status = status.parse().map_err(|_| InvalidStatus)?;

    Ok(StatusUpdate {
        appointment_id,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<StatusUpdate, AppError> {
        get_status_update(&Bytes::from(body.to_string()))
    }

    #[test]
    fn test_valid() {
        assert_eq!(
            parse(r#"{"appointmentId":"abc","status":"cancelled"}"#).unwrap(),
            StatusUpdate {
                appointment_id: "abc".to_string(),
                status: AppointmentStatus::Cancelled,
            }
        );
    }

    #[test]
    fn test_missing_fields() {
        for body in [
            r#"{}"#,
            r#"{"status":"completed"}"#,
            r#"{"appointmentId":"abc"}"#,
            r#"{"appointmentId":"","status":"completed"}"#,
            r#"{"appointmentId":"abc","status":""}"#,
            r#"{"appointmentId":null,"status":"completed"}"#,
        ] {
            assert!(matches!(parse(body), Err(MissingFields)), "{body}");
        }
    }

    #[test]
    fn test_invalid_status_for_any_id() {
        for id in ["abc", "x", "00000000-0000-0000-0000-000000000000"] {
            for status in ["done", "Completed", "pending", " scheduled"] {
                let body = format!(r#"{{"appointmentId":"{id}","status":"{status}"}}"#);

                assert!(matches!(parse(&body), Err(InvalidStatus)), "{body}");
            }
        }
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(parse("not json"), Err(MalformedPayload)));
        assert!(matches!(parse("42"), Err(MalformedPayload)));
    }
}
