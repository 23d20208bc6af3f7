use crate::board::BoardError;
use async_trait::async_trait;
use campool_requests::models::{RequestStatus, RideRequest};
use campool_requests::repository::RideRequestRepository;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub(crate) struct RequestRow {
    id: Uuid,
    ride_id: Uuid,
    rider_id: Uuid,
    seats_requested: i32,
    message: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

fn parse_status(raw: &str, request_id: Uuid) -> Result<RequestStatus, BoardError> {
    match raw {
        "PENDING" => Ok(RequestStatus::Pending),
        "ACCEPTED" => Ok(RequestStatus::Accepted),
        "DECLINED" => Ok(RequestStatus::Declined),
        other => Err(BoardError::Data(format!(
            "request {} has unknown status {:?}",
            request_id, other
        ))),
    }
}

pub(crate) fn into_request(row: RequestRow) -> Result<RideRequest, BoardError> {
    let seats_requested = u32::try_from(row.seats_requested)
        .map_err(|_| BoardError::Data(format!("request {} has negative seats", row.id)))?;

    Ok(RideRequest {
        status: parse_status(&row.status, row.id)?,
        id: row.id,
        ride_id: row.ride_id,
        rider_id: row.rider_id,
        seats_requested,
        message: row.message,
        created_at: row.created_at,
    })
}

pub struct PostgresRideRequestRepository {
    pool: PgPool,
}

impl PostgresRideRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn fetch_request(&self, id: Uuid) -> Result<Option<RideRequest>, BoardError> {
        let row = sqlx::query_as::<_, RequestRow>("SELECT * FROM ride_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(into_request).transpose()
    }

    pub async fn list_for_ride(&self, ride_id: Uuid) -> Result<Vec<RideRequest>, BoardError> {
        let rows = sqlx::query_as::<_, RequestRow>(
            "SELECT * FROM ride_requests WHERE ride_id = $1 ORDER BY created_at ASC",
        )
        .bind(ride_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(into_request).collect()
    }

    pub async fn list_by_rider(
        &self,
        rider_id: Uuid,
        status: Option<RequestStatus>,
    ) -> Result<Vec<RideRequest>, BoardError> {
        let rows = sqlx::query_as::<_, RequestRow>(
            r#"
            SELECT * FROM ride_requests
            WHERE rider_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(rider_id)
        .bind(status.map(|s| s.to_string()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(into_request).collect()
    }
}

#[async_trait]
impl RideRequestRepository for PostgresRideRequestRepository {
    async fn fetch_request(
        &self,
        id: Uuid,
    ) -> Result<Option<RideRequest>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PostgresRideRequestRepository::fetch_request(self, id).await?)
    }

    async fn list_for_ride(
        &self,
        ride_id: Uuid,
    ) -> Result<Vec<RideRequest>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PostgresRideRequestRepository::list_for_ride(self, ride_id).await?)
    }

    async fn list_by_rider(
        &self,
        rider_id: Uuid,
        status: Option<RequestStatus>,
    ) -> Result<Vec<RideRequest>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PostgresRideRequestRepository::list_by_rider(self, rider_id, status).await?)
    }
}

/// Transaction-scoped request writes, used under the ride row lock.
pub struct RequestTxRepository;

impl RequestTxRepository {
    pub async fn fetch_request(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<RideRequest>, BoardError> {
        let row = sqlx::query_as::<_, RequestRow>("SELECT * FROM ride_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        row.map(into_request).transpose()
    }

    pub async fn list_for_ride(
        tx: &mut Transaction<'_, Postgres>,
        ride_id: Uuid,
    ) -> Result<Vec<RideRequest>, BoardError> {
        let rows = sqlx::query_as::<_, RequestRow>(
            "SELECT * FROM ride_requests WHERE ride_id = $1 ORDER BY created_at ASC",
        )
        .bind(ride_id)
        .fetch_all(&mut **tx)
        .await?;

        rows.into_iter().map(into_request).collect()
    }

    pub async fn insert_request(
        tx: &mut Transaction<'_, Postgres>,
        request: &RideRequest,
    ) -> Result<(), BoardError> {
        sqlx::query(
            r#"
            INSERT INTO ride_requests (id, ride_id, rider_id, seats_requested, message, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(request.id)
        .bind(request.ride_id)
        .bind(request.rider_id)
        .bind(request.seats_requested as i32)
        .bind(request.message.as_deref())
        .bind(request.status.to_string())
        .bind(request.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn set_status(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        status: RequestStatus,
    ) -> Result<(), BoardError> {
        sqlx::query("UPDATE ride_requests SET status = $1 WHERE id = $2")
            .bind(status.to_string())
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
