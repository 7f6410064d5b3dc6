use serde_json::Value;
use tracing::info;

use crate::{
    models::{APPOINTMENTS, AppointmentStatus},
    store::{Document, DocumentStore, StoreError},
};

/// Overwrites the `status` field of one appointment.
///
/// Repeating the same call leaves the same document behind. Unknown ids come
/// back as [`StoreError::NotFound`].
pub async fn update_status(
    store: &dyn DocumentStore,
    appointment_id: &str,
    status: AppointmentStatus,
) -> Result<(), StoreError> {
    let mut fields = Document::new();
    fields.insert("status".to_string(), Value::from(status.as_str()));

    store.update(APPOINTMENTS, appointment_id, fields).await?;

    info!("Appointment {appointment_id} is now {status}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{memory::MemoryStore, models::Appointment, read_record, write_record};

    fn booking() -> Appointment {
        Appointment {
            patient_id: "p1".to_string(),
            doctor_id: "d1".to_string(),
            scheduled_for: Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
            status: AppointmentStatus::Scheduled,
            notes: Some("follow-up".to_string()),
        }
    }

    #[tokio::test]
    async fn test_only_status_changes() {
        let store = MemoryStore::new();
        write_record(&store, APPOINTMENTS, "abc", &booking()).await.unwrap();

        update_status(&store, "abc", AppointmentStatus::Completed)
            .await
            .unwrap();

        let stored: Appointment = read_record(&store, APPOINTMENTS, "abc")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            stored,
            Appointment {
                status: AppointmentStatus::Completed,
                ..booking()
            }
        );
    }

    #[tokio::test]
    async fn test_repeat_is_idempotent() {
        for status in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
        ] {
            let store = MemoryStore::new();
            write_record(&store, APPOINTMENTS, "abc", &booking()).await.unwrap();

            update_status(&store, "abc", status).await.unwrap();
            let once = store.get(APPOINTMENTS, "abc").await.unwrap();

            update_status(&store, "abc", status).await.unwrap();
            let twice = store.get(APPOINTMENTS, "abc").await.unwrap();

            assert_eq!(once, twice);
        }
    }

    #[tokio::test]
    async fn test_unknown_appointment() {
        let store = MemoryStore::new();

        let result = update_status(&store, "ghost", AppointmentStatus::Cancelled).await;

        assert!(matches!(result, Err(StoreError::NotFound { ref id, .. }) if id == "ghost"));
        assert!(store.get(APPOINTMENTS, "ghost").await.unwrap().is_none());
    }
}
