//! PostgreSQL audit ledger store.
//!
//! The `audit_events` table is append-only; a database trigger rejects
//! UPDATE and DELETE so the ledger cannot be rewritten through SQL
//! either. `seq` is an identity column assigned at insert, which is the
//! insertion order the verifier replays.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use ledgerline_audit::store::{AuditStore, EventFilter, SealedEvent};
use ledgerline_core::error::{AppError, ErrorKind};
use ledgerline_core::result::AppResult;
use ledgerline_core::types::pagination::{PageRequest, PageResponse};
use ledgerline_entity::audit::{AuditEvent, AuditStats, CountByDay, CountByKey};

/// PostgreSQL-backed implementation of [`AuditStore`].
#[derive(Debug, Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    /// Create a new store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn range_conditions(
        filter: &EventFilter,
        first_idx: u32,
    ) -> (Vec<String>, u32) {
        let mut conditions = Vec::new();
        let mut param_idx = first_idx;

        if filter.actor.is_some() {
            conditions.push(format!("actor = ${param_idx}"));
            param_idx += 1;
        }
        if filter.action.is_some() {
            conditions.push(format!("action = ${param_idx}"));
            param_idx += 1;
        }
        if filter.resource.is_some() {
            conditions.push(format!("resource = ${param_idx}"));
            param_idx += 1;
        }
        if filter.start.is_some() {
            conditions.push(format!("timestamp >= ${param_idx}"));
            param_idx += 1;
        }
        if filter.end.is_some() {
            conditions.push(format!("timestamp <= ${param_idx}"));
            param_idx += 1;
        }

        (conditions, param_idx)
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn last_hash(&self) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT hash FROM audit_events ORDER BY seq DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read last hash", e))
    }

    async fn insert(&self, sealed: &SealedEvent) -> AppResult<AuditEvent> {
        sqlx::query_as::<_, AuditEvent>(
            "INSERT INTO audit_events (timestamp, request_id, actor, action, resource, \
             resource_id, method, path, ip_address, user_agent, request_body, metadata, \
             response_status, previous_hash, hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING *",
        )
        .bind(sealed.event.timestamp)
        .bind(sealed.event.request_id)
        .bind(&sealed.event.actor)
        .bind(&sealed.event.action)
        .bind(&sealed.event.resource)
        .bind(&sealed.event.resource_id)
        .bind(&sealed.event.method)
        .bind(&sealed.event.path)
        .bind(&sealed.event.ip_address)
        .bind(&sealed.event.user_agent)
        .bind(&sealed.event.request_body)
        .bind(&sealed.event.metadata)
        .bind(sealed.event.response_status)
        .bind(&sealed.previous_hash)
        .bind(&sealed.hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert audit event", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AuditEvent>> {
        sqlx::query_as::<_, AuditEvent>("SELECT * FROM audit_events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find audit event", e)
            })
    }

    async fn search(
        &self,
        filter: &EventFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditEvent>> {
        let (conditions, param_idx) = Self::range_conditions(filter, 1);

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM audit_events {where_clause}");
        let select_sql = format!(
            "SELECT * FROM audit_events {where_clause} ORDER BY seq DESC LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );

        // Build dynamic queries
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        let mut select_query = sqlx::query_as::<_, AuditEvent>(&select_sql);

        if let Some(actor) = &filter.actor {
            count_query = count_query.bind(actor.clone());
            select_query = select_query.bind(actor.clone());
        }
        if let Some(action) = &filter.action {
            count_query = count_query.bind(action.clone());
            select_query = select_query.bind(action.clone());
        }
        if let Some(resource) = &filter.resource {
            count_query = count_query.bind(resource.clone());
            select_query = select_query.bind(resource.clone());
        }
        if let Some(start) = filter.start {
            count_query = count_query.bind(start);
            select_query = select_query.bind(start);
        }
        if let Some(end) = filter.end {
            count_query = count_query.bind(end);
            select_query = select_query.bind(end);
        }

        let total = count_query.fetch_one(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count audit events", e)
        })?;

        let events = select_query
            .bind(page.limit as i64)
            .bind(page.offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to search audit events", e)
            })?;

        Ok(PageResponse::new(events, page, total as u64))
    }

    async fn range_ordered(
        &self,
        filter: &EventFilter,
        max_rows: u64,
    ) -> AppResult<Vec<AuditEvent>> {
        let (conditions, param_idx) = Self::range_conditions(filter, 1);

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT * FROM audit_events {where_clause} ORDER BY seq ASC LIMIT ${param_idx}"
        );

        let mut query = sqlx::query_as::<_, AuditEvent>(&sql);
        if let Some(actor) = &filter.actor {
            query = query.bind(actor.clone());
        }
        if let Some(action) = &filter.action {
            query = query.bind(action.clone());
        }
        if let Some(resource) = &filter.resource {
            query = query.bind(resource.clone());
        }
        if let Some(start) = filter.start {
            query = query.bind(start);
        }
        if let Some(end) = filter.end {
            query = query.bind(end);
        }

        query
            .bind(max_rows as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read audit event range", e)
            })
    }

    async fn stats(
        &self,
        since: DateTime<Utc>,
        window_days: u32,
        max_rows: u64,
    ) -> AppResult<AuditStats> {
        let (total_events, success_count, error_count): (i64, i64, i64) = sqlx::query_as(
            "WITH window_events AS (\
             SELECT response_status FROM audit_events \
             WHERE timestamp >= $1 ORDER BY seq ASC LIMIT $2) \
             SELECT COUNT(*), \
             COUNT(*) FILTER (WHERE response_status IS NULL OR response_status < 400), \
             COUNT(*) FILTER (WHERE response_status >= 400) \
             FROM window_events",
        )
        .bind(since)
        .bind(max_rows as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to compute audit totals", e)
        })?;

        let by_actor = self.grouped_counts("actor", since, max_rows).await?;
        let by_action = self.grouped_counts("action", since, max_rows).await?;
        let by_resource = self.grouped_counts("resource", since, max_rows).await?;

        let by_day: Vec<(chrono::NaiveDate, i64)> = sqlx::query_as(
            "WITH window_events AS (\
             SELECT timestamp FROM audit_events \
             WHERE timestamp >= $1 ORDER BY seq ASC LIMIT $2) \
             SELECT (timestamp AT TIME ZONE 'UTC')::date AS day, COUNT(*) \
             FROM window_events \
             GROUP BY day ORDER BY day ASC",
        )
        .bind(since)
        .bind(max_rows as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to compute daily audit counts", e)
        })?;

        Ok(AuditStats {
            window_days,
            total_events,
            by_actor,
            by_action,
            by_resource,
            by_day: by_day
                .into_iter()
                .map(|(day, count)| CountByDay { day, count })
                .collect(),
            success_count,
            error_count,
        })
    }
}

impl PgAuditStore {
    /// Count events grouped by one of the fixed low-cardinality columns.
    ///
    /// `column` is always a string literal from this crate, never client
    /// input, so interpolating it into the SQL text is safe.
    async fn grouped_counts(
        &self,
        column: &'static str,
        since: DateTime<Utc>,
        max_rows: u64,
    ) -> AppResult<Vec<CountByKey>> {
        let sql = format!(
            "WITH window_events AS (\
             SELECT {column} FROM audit_events \
             WHERE timestamp >= $1 ORDER BY seq ASC LIMIT $2) \
             SELECT {column}, COUNT(*) FROM window_events \
             GROUP BY {column} ORDER BY COUNT(*) DESC"
        );
        let rows: Vec<(String, i64)> = sqlx::query_as(&sql)
            .bind(since)
            .bind(max_rows as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to compute audit counts by {column}"),
                    e,
                )
            })?;

        Ok(rows
            .into_iter()
            .map(|(key, count)| CountByKey { key, count })
            .collect())
    }
}
