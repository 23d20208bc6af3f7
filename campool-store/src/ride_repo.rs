use crate::board::BoardError;
use async_trait::async_trait;
use campool_rides::models::{Ride, RideRole, RideStatus, Schedule, TripKind};
use campool_rides::recurrence::parse_pattern;
use campool_rides::repository::RideRepository;
use campool_rides::search::RideFilters;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const RIDE_WITH_ACCEPTED: &str = r#"
    SELECT r.*, COALESCE(SUM(q.seats_requested) FILTER (WHERE q.status = 'ACCEPTED'), 0) AS accepted_seats
    FROM rides r
    LEFT JOIN ride_requests q ON q.ride_id = r.id
"#;

#[derive(sqlx::FromRow)]
pub(crate) struct RideRow {
    id: Uuid,
    driver_id: Uuid,
    origin: String,
    destination: String,
    trip_kind: String,
    ride_role: String,
    departure_date: Option<NaiveDate>,
    departure_time: String,
    return_date: Option<NaiveDate>,
    return_time: Option<String>,
    seat_capacity: i32,
    price_per_seat: Option<f64>,
    notes: Option<String>,
    is_recurring: bool,
    recurrence_pattern: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CandidateRow {
    #[sqlx(flatten)]
    ride: RideRow,
    accepted_seats: i64,
}

fn parse_status(raw: &str, ride_id: Uuid) -> Result<RideStatus, BoardError> {
    match raw {
        "ACTIVE" => Ok(RideStatus::Active),
        "FULL" => Ok(RideStatus::Full),
        "CANCELLED" => Ok(RideStatus::Cancelled),
        "COMPLETED" => Ok(RideStatus::Completed),
        other => Err(BoardError::Data(format!(
            "ride {} has unknown status {:?}",
            ride_id, other
        ))),
    }
}

fn parse_trip_kind(raw: &str, ride_id: Uuid) -> Result<TripKind, BoardError> {
    match raw {
        "ONE_WAY" => Ok(TripKind::OneWay),
        "ROUND_TRIP" => Ok(TripKind::RoundTrip),
        other => Err(BoardError::Data(format!(
            "ride {} has unknown trip kind {:?}",
            ride_id, other
        ))),
    }
}

fn parse_ride_role(raw: &str, ride_id: Uuid) -> Result<RideRole, BoardError> {
    match raw {
        "DRIVER" => Ok(RideRole::Driver),
        "RIDER" => Ok(RideRole::Rider),
        other => Err(BoardError::Data(format!(
            "ride {} has unknown role {:?}",
            ride_id, other
        ))),
    }
}

/// Row-to-domain conversion. The stored recurrence text is parsed and
/// validated here, once, so the engine only ever sees the tagged schedule.
pub(crate) fn into_ride(row: RideRow) -> Result<Ride, BoardError> {
    let schedule = if row.is_recurring {
        let raw = row.recurrence_pattern.as_deref().ok_or_else(|| {
            BoardError::Data(format!("ride {} is recurring without a pattern", row.id))
        })?;
        Schedule::Recurring(parse_pattern(raw)?)
    } else {
        let date = row.departure_date.ok_or_else(|| {
            BoardError::Data(format!("ride {} has no departure date", row.id))
        })?;
        Schedule::Once { date }
    };

    let seat_capacity = u32::try_from(row.seat_capacity)
        .map_err(|_| BoardError::Data(format!("ride {} has negative capacity", row.id)))?;

    Ok(Ride {
        trip_kind: parse_trip_kind(&row.trip_kind, row.id)?,
        ride_role: parse_ride_role(&row.ride_role, row.id)?,
        status: parse_status(&row.status, row.id)?,
        id: row.id,
        driver_id: row.driver_id,
        origin: row.origin,
        destination: row.destination,
        schedule,
        departure_time: row.departure_time,
        return_date: row.return_date,
        return_time: row.return_time,
        seat_capacity,
        price_per_seat: row.price_per_seat,
        notes: row.notes,
        created_at: row.created_at,
    })
}

fn accepted_total(raw: i64, ride_id: Uuid) -> Result<u32, BoardError> {
    u32::try_from(raw)
        .map_err(|_| BoardError::Data(format!("ride {} has negative accepted total", ride_id)))
}

pub struct PostgresRideRepository {
    pool: PgPool,
}

impl PostgresRideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn fetch_ride(&self, id: Uuid) -> Result<Option<(Ride, u32)>, BoardError> {
        let sql = format!("{} WHERE r.id = $1 GROUP BY r.id", RIDE_WITH_ACCEPTED);
        let row = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let accepted = accepted_total(row.accepted_seats, row.ride.id)?;
                Ok(Some((into_ride(row.ride)?, accepted)))
            }
            None => Ok(None),
        }
    }

    /// ACTIVE rides matching the substring filters. Date and recurrence
    /// matching stay in the engine; rows with corrupt stored patterns are
    /// skipped with a warning rather than failing the whole search.
    pub async fn search_candidates(
        &self,
        filters: &RideFilters,
    ) -> Result<Vec<(Ride, u32)>, BoardError> {
        let sql = format!(
            r#"{}
            WHERE r.status = 'ACTIVE'
              AND ($1::text IS NULL OR r.origin ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR r.destination ILIKE '%' || $2 || '%')
            GROUP BY r.id
            "#,
            RIDE_WITH_ACCEPTED
        );

        let rows = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(filters.origin_contains.as_deref())
            .bind(filters.destination_contains.as_deref())
            .fetch_all(&self.pool)
            .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            let ride_id = row.ride.id;
            let accepted = accepted_total(row.accepted_seats, ride_id)?;
            match into_ride(row.ride) {
                Ok(ride) => candidates.push((ride, accepted)),
                Err(e) => tracing::warn!("Skipping unreadable ride {}: {}", ride_id, e),
            }
        }
        Ok(candidates)
    }

    pub async fn list_by_driver(&self, driver_id: Uuid) -> Result<Vec<(Ride, u32)>, BoardError> {
        let sql = format!(
            "{} WHERE r.driver_id = $1 GROUP BY r.id ORDER BY r.created_at DESC",
            RIDE_WITH_ACCEPTED
        );
        let rows = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(driver_id)
            .fetch_all(&self.pool)
            .await?;

        let mut rides = Vec::with_capacity(rows.len());
        for row in rows {
            let accepted = accepted_total(row.accepted_seats, row.ride.id)?;
            rides.push((into_ride(row.ride)?, accepted));
        }
        Ok(rides)
    }
}

#[async_trait]
impl RideRepository for PostgresRideRepository {
    async fn fetch_ride(
        &self,
        id: Uuid,
    ) -> Result<Option<(Ride, u32)>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PostgresRideRepository::fetch_ride(self, id).await?)
    }

    async fn search_candidates(
        &self,
        filters: &RideFilters,
    ) -> Result<Vec<(Ride, u32)>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PostgresRideRepository::search_candidates(self, filters).await?)
    }

    async fn list_by_driver(
        &self,
        driver_id: Uuid,
    ) -> Result<Vec<(Ride, u32)>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PostgresRideRepository::list_by_driver(self, driver_id).await?)
    }
}

/// Transaction-scoped ride writes. `submit` and `respond` lock the ride row
/// first so the accepted-seat read and the request write happen atomically
/// per ride.
pub struct RideTxRepository;

impl RideTxRepository {
    pub async fn lock_ride(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Ride>, BoardError> {
        let row = sqlx::query_as::<_, RideRow>("SELECT * FROM rides WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        row.map(into_ride).transpose()
    }

    pub async fn accepted_seats(
        tx: &mut Transaction<'_, Postgres>,
        ride_id: Uuid,
    ) -> Result<u32, BoardError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(seats_requested), 0) FROM ride_requests WHERE ride_id = $1 AND status = 'ACCEPTED'",
        )
        .bind(ride_id)
        .fetch_one(&mut **tx)
        .await?;

        accepted_total(total, ride_id)
    }

    pub async fn insert_ride(
        tx: &mut Transaction<'_, Postgres>,
        ride: &Ride,
    ) -> Result<(), BoardError> {
        let (departure_date, recurrence_pattern) = match &ride.schedule {
            Schedule::Once { date } => (Some(*date), None),
            Schedule::Recurring(pattern) => (
                None,
                Some(serde_json::to_string(pattern).map_err(|e| {
                    BoardError::Data(format!("ride {} pattern serialization: {}", ride.id, e))
                })?),
            ),
        };

        sqlx::query(
            r#"
            INSERT INTO rides (id, driver_id, origin, destination, trip_kind, ride_role,
                               departure_date, departure_time, return_date, return_time,
                               seat_capacity, price_per_seat, notes, is_recurring,
                               recurrence_pattern, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(ride.id)
        .bind(ride.driver_id)
        .bind(&ride.origin)
        .bind(&ride.destination)
        .bind(ride.trip_kind.to_string())
        .bind(ride.ride_role.to_string())
        .bind(departure_date)
        .bind(&ride.departure_time)
        .bind(ride.return_date)
        .bind(ride.return_time.as_deref())
        .bind(ride.seat_capacity as i32)
        .bind(ride.price_per_seat)
        .bind(ride.notes.as_deref())
        .bind(ride.is_recurring())
        .bind(recurrence_pattern)
        .bind(ride.status.to_string())
        .bind(ride.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn set_status(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        status: RideStatus,
    ) -> Result<(), BoardError> {
        sqlx::query("UPDATE rides SET status = $1 WHERE id = $2")
            .bind(status.to_string())
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(is_recurring: bool, pattern: Option<&str>, date: Option<NaiveDate>) -> RideRow {
        RideRow {
            id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            origin: "Plymouth".to_string(),
            destination: "Boston".to_string(),
            trip_kind: "ONE_WAY".to_string(),
            ride_role: "DRIVER".to_string(),
            departure_date: date,
            departure_time: "08:30".to_string(),
            return_date: None,
            return_time: None,
            seat_capacity: 3,
            price_per_seat: Some(10.0),
            notes: None,
            is_recurring,
            recurrence_pattern: pattern.map(str::to_string),
            status: "ACTIVE".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_one_time_row_converts() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let ride = into_ride(row(false, None, Some(date))).unwrap();
        assert_eq!(ride.departure_date(), Some(date));
        assert_eq!(ride.seat_capacity, 3);
        assert_eq!(ride.status, RideStatus::Active);
    }

    #[test]
    fn test_recurring_row_parses_stored_pattern() {
        let ride = into_ride(row(
            true,
            Some(r#"{"days":["monday","friday"],"until":"2024-06-01"}"#),
            None,
        ))
        .unwrap();
        let pattern = ride.recurrence().unwrap();
        assert_eq!(pattern.days.len(), 2);
    }

    #[test]
    fn test_corrupt_rows_are_errors() {
        // Recurring without a pattern.
        assert!(matches!(
            into_ride(row(true, None, None)),
            Err(BoardError::Data(_))
        ));
        // Malformed stored pattern.
        assert!(matches!(
            into_ride(row(true, Some("not json"), None)),
            Err(BoardError::Recurrence(_))
        ));
        // One-time without a date.
        assert!(matches!(
            into_ride(row(false, None, None)),
            Err(BoardError::Data(_))
        ));
        // Unknown status string.
        let mut bad = row(false, None, Some(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()));
        bad.status = "LOST".to_string();
        assert!(matches!(into_ride(bad), Err(BoardError::Data(_))));
    }
}
