use anyhow::Context;
use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[sqlx(rename = "appointment_date")]
    pub date: String,
    #[sqlx(rename = "appointment_time")]
    pub time: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: String,
    pub time: String,
    pub message: String,
}

#[async_trait]
pub trait AppointmentRepo: Send + Sync {
    /// With `guard_slot`, returns `None` when the (date, time) slot is already
    /// held by another guarded booking.
    async fn book(
        &self,
        appointment: NewAppointment,
        guard_slot: bool,
    ) -> anyhow::Result<Option<Appointment>>;

    async fn list(&self) -> anyhow::Result<Vec<Appointment>>;
}

#[derive(Clone)]
pub struct PgAppointmentRepo {
    db: PgPool,
}

impl PgAppointmentRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AppointmentRepo for PgAppointmentRepo {
    async fn book(
        &self,
        a: NewAppointment,
        guard_slot: bool,
    ) -> anyhow::Result<Option<Appointment>> {
        // The partial unique index only covers guarded rows.
        let sql = if guard_slot {
            r#"
            INSERT INTO appointments
                (id, name, email, phone, appointment_date, appointment_time, message, slot_guarded)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            ON CONFLICT (appointment_date, appointment_time) WHERE slot_guarded DO NOTHING
            RETURNING
                id, name, email, phone, appointment_date, appointment_time, message, created_at
            "#
        } else {
            r#"
            INSERT INTO appointments
                (id, name, email, phone, appointment_date, appointment_time, message, slot_guarded)
            VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE)
            RETURNING
                id, name, email, phone, appointment_date, appointment_time, message, created_at
            "#
        };

        let row = sqlx::query_as::<_, Appointment>(sql)
            .bind(a.id)
            .bind(&a.name)
            .bind(&a.email)
            .bind(&a.phone)
            .bind(&a.date)
            .bind(&a.time)
            .bind(&a.message)
            .fetch_optional(&self.db)
            .await
            .context("insert appointment")?;
        Ok(row)
    }

    async fn list(&self) -> anyhow::Result<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT id, name, email, phone, appointment_date, appointment_time, message, created_at
            FROM appointments
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list appointments")?;
        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use tokio::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryAppointmentRepo {
        // (record, slot_guarded)
        rows: Mutex<Vec<(Appointment, bool)>>,
    }

    #[async_trait]
    impl AppointmentRepo for MemoryAppointmentRepo {
        async fn book(
            &self,
            a: NewAppointment,
            guard_slot: bool,
        ) -> anyhow::Result<Option<Appointment>> {
            let mut rows = self.rows.lock().await;
            let taken = rows
                .iter()
                .any(|(r, guarded)| *guarded && r.date == a.date && r.time == a.time);
            if guard_slot && taken {
                return Ok(None);
            }
            let record = Appointment {
                id: a.id,
                name: a.name,
                email: a.email,
                phone: a.phone,
                date: a.date,
                time: a.time,
                message: a.message,
                created_at: OffsetDateTime::now_utc(),
            };
            rows.push((record.clone(), guard_slot));
            Ok(Some(record))
        }

        async fn list(&self) -> anyhow::Result<Vec<Appointment>> {
            Ok(self.rows.lock().await.iter().map(|(r, _)| r.clone()).collect())
        }
    }
}
