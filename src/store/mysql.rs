use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use crate::error::StoreError;
use crate::model::{
    agent::{Agent, AgentFields},
    agent_document::{AgentDocument, AgentDocumentFilter},
    change_log::{
        ChangeAction, ChangeLogEntry, ChangeLogFilter, ChangeParts, DocumentChange,
        NewChangeLogEntry,
    },
    report::{NewWorkScheduleReport, WorkScheduleReport},
    schedule::{NewSchedule, ScheduleAggregate, ScheduleFilter, WorkSchedule},
    shift::{NewShift, WorkShift},
};
use crate::store::{AgentStore, ChangeLogStore, ReportStore, ScheduleStore};
use crate::utils::db_utils::{WhereClause, bind_query_as, bind_query_scalar};

/// Store backed by the application's MySQL pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, sql: &str, id: u64) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, bool>(sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }
}

#[derive(FromRow)]
struct ScheduleRow {
    id: u64,
    employee_id: u64,
    pickup_point_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ScheduleRow> for WorkSchedule {
    type Error = StoreError;

    fn try_from(row: ScheduleRow) -> Result<Self, Self::Error> {
        Ok(WorkSchedule {
            id: row.id,
            employee_id: row.employee_id,
            pickup_point_id: row.pickup_point_id,
            start_date: row.start_date,
            end_date: row.end_date,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ChangeLogRow {
    id: u64,
    document_type: String,
    document_id: u64,
    action: String,
    previous_data: Option<Json<Value>>,
    new_data: Option<Json<Value>>,
    actor_id: u64,
    timestamp: DateTime<Utc>,
}

impl TryFrom<ChangeLogRow> for ChangeLogEntry {
    type Error = StoreError;

    fn try_from(row: ChangeLogRow) -> Result<Self, Self::Error> {
        let change = DocumentChange::from_parts(ChangeParts {
            kind: row.document_type.parse()?,
            document_id: row.document_id,
            previous: row.previous_data.map(|j| j.0),
            new: row.new_data.map(|j| j.0),
        })?;
        Ok(ChangeLogEntry {
            id: row.id,
            change,
            action: row.action.parse()?,
            actor_id: row.actor_id,
            timestamp: row.timestamp,
        })
    }
}

#[derive(FromRow)]
struct AgentDocumentRow {
    id: u64,
    agent_id: u64,
    action: String,
    user_id: u64,
    created_at: DateTime<Utc>,
}

impl TryFrom<AgentDocumentRow> for AgentDocument {
    type Error = StoreError;

    fn try_from(row: AgentDocumentRow) -> Result<Self, Self::Error> {
        Ok(AgentDocument {
            id: row.id,
            agent_id: row.agent_id,
            action: row.action.parse()?,
            user_id: row.user_id,
            created_at: row.created_at,
        })
    }
}

const SCHEDULE_COLUMNS: &str =
    "id, employee_id, pickup_point_id, start_date, end_date, status, created_at";
const SHIFT_COLUMNS: &str =
    "id, schedule_id, employee_id, date, start_time, end_time, is_approved";
const AGENT_COLUMNS: &str =
    "id, name, description, email, phone_number, created_at, updated_at";

impl ScheduleStore for MySqlStore {
    async fn employee_exists(&self, employee_id: u64) -> Result<bool, StoreError> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? AND is_active = TRUE)",
            employee_id,
        )
        .await
    }

    async fn pickup_point_exists(&self, pickup_point_id: u64) -> Result<bool, StoreError> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM pickup_points WHERE id = ?)",
            pickup_point_id,
        )
        .await
    }

    async fn insert_schedule(&self, new: &NewSchedule) -> Result<WorkSchedule, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO work_schedules (employee_id, pickup_point_id, start_date, end_date, status)
            VALUES (?, ?, ?, ?, 'draft')
            "#,
        )
        .bind(new.employee_id)
        .bind(new.pickup_point_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.load_schedule(id)
            .await?
            .map(|agg| agg.schedule)
            .ok_or_else(|| StoreError::Corrupt(format!("schedule {id} missing after insert")))
    }

    async fn load_schedule(
        &self,
        schedule_id: u64,
    ) -> Result<Option<ScheduleAggregate>, StoreError> {
        let row = sqlx::query_as::<_, ScheduleRow>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM work_schedules WHERE id = ?"
        ))
        .bind(schedule_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let shifts = sqlx::query_as::<_, WorkShift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM work_shifts WHERE schedule_id = ? \
             ORDER BY date, start_time, id"
        ))
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(ScheduleAggregate {
            schedule: row.try_into()?,
            shifts,
        }))
    }

    async fn list_schedules(
        &self,
        filter: &ScheduleFilter,
    ) -> Result<(Vec<WorkSchedule>, i64), StoreError> {
        let mut clause = WhereClause::new();
        clause.push_opt("employee_id = ?", filter.employee_id);
        clause.push_opt("pickup_point_id = ?", filter.pickup_point_id);
        clause.push_opt("status = ?", filter.status.map(|s| s.to_string()));
        let where_sql = clause.sql();

        let count_sql = format!("SELECT COUNT(*) FROM work_schedules{where_sql}");
        debug!(sql = %count_sql, bindings = ?clause.values, "Counting schedules");
        let total = bind_query_scalar(sqlx::query_scalar::<_, i64>(&count_sql), &clause.values)
            .fetch_one(&self.pool)
            .await?;

        let data_sql = format!(
            "SELECT {SCHEDULE_COLUMNS} FROM work_schedules{where_sql} \
             ORDER BY id DESC LIMIT ? OFFSET ?"
        );
        let rows = bind_query_as(sqlx::query_as::<_, ScheduleRow>(&data_sql), &clause.values)
            .bind(filter.per_page())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        let schedules = rows
            .into_iter()
            .map(WorkSchedule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((schedules, total))
    }

    async fn insert_shift(
        &self,
        schedule_id: u64,
        new: &NewShift,
    ) -> Result<WorkShift, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO work_shifts (schedule_id, employee_id, date, start_time, end_time, is_approved)
            VALUES (?, ?, ?, ?, ?, FALSE)
            "#,
        )
        .bind(schedule_id)
        .bind(new.employee_id)
        .bind(new.date)
        .bind(new.start_time)
        .bind(new.end_time)
        .execute(&self.pool)
        .await?;

        Ok(WorkShift {
            id: result.last_insert_id(),
            schedule_id,
            employee_id: new.employee_id,
            date: new.date,
            start_time: new.start_time,
            end_time: new.end_time,
            is_approved: false,
        })
    }

    async fn update_shift(&self, shift: &WorkShift) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE work_shifts
            SET employee_id = ?, date = ?, start_time = ?, end_time = ?, is_approved = ?
            WHERE id = ? AND schedule_id = ?
            "#,
        )
        .bind(shift.employee_id)
        .bind(shift.date)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.is_approved)
        .bind(shift.id)
        .bind(shift.schedule_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // MySQL reports 0 for an update that changes nothing as well
            let still_there = self
                .exists("SELECT EXISTS(SELECT 1 FROM work_shifts WHERE id = ?)", shift.id)
                .await?;
            if !still_there {
                return Err(StoreError::Corrupt(format!("shift {} vanished", shift.id)));
            }
        }
        Ok(())
    }

    async fn delete_shift(&self, schedule_id: u64, shift_id: u64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM work_shifts WHERE id = ? AND schedule_id = ?")
            .bind(shift_id)
            .bind(schedule_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_decision(&self, aggregate: &ScheduleAggregate) -> Result<(), StoreError> {
        let schedule_id = aggregate.id();
        let mut tx = self.pool.begin().await?;

        for shift in &aggregate.shifts {
            sqlx::query("UPDATE work_shifts SET is_approved = ? WHERE id = ? AND schedule_id = ?")
                .bind(shift.is_approved)
                .bind(shift.id)
                .bind(schedule_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE work_schedules SET status = ? WHERE id = ?")
            .bind(aggregate.status().to_string())
            .bind(schedule_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(schedule_id, status = %aggregate.status(), "Schedule decision saved");
        Ok(())
    }

    async fn delete_schedule(&self, schedule_id: u64) -> Result<bool, StoreError> {
        // work_shifts rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM work_schedules WHERE id = ?")
            .bind(schedule_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn approved_shifts_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WorkShift>, StoreError> {
        let shifts = sqlx::query_as::<_, WorkShift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM work_shifts \
             WHERE employee_id = ? AND is_approved = TRUE AND date BETWEEN ? AND ? \
             ORDER BY date, start_time"
        ))
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(shifts)
    }
}

impl ChangeLogStore for MySqlStore {
    async fn append(&self, entry: &NewChangeLogEntry) -> Result<ChangeLogEntry, StoreError> {
        let parts = entry.change.to_parts()?;
        let result = sqlx::query(
            r#"
            INSERT INTO change_log
                (document_type, document_id, action, previous_data, new_data, actor_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(parts.kind.to_string())
        .bind(parts.document_id)
        .bind(entry.action.to_string())
        .bind(parts.previous.map(Json))
        .bind(parts.new.map(Json))
        .bind(entry.actor_id)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        let row = sqlx::query_as::<_, ChangeLogRow>(
            r#"
            SELECT id, document_type, document_id, action, previous_data, new_data, actor_id, timestamp
            FROM change_log
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn list_entries(
        &self,
        filter: &ChangeLogFilter,
    ) -> Result<(Vec<ChangeLogEntry>, i64), StoreError> {
        let mut clause = WhereClause::new();
        clause.push_opt("document_type = ?", filter.document_type.map(|k| k.to_string()));
        clause.push_opt("document_id = ?", filter.document_id);
        clause.push_opt("actor_id = ?", filter.actor_id);
        let where_sql = clause.sql();

        let count_sql = format!("SELECT COUNT(*) FROM change_log{where_sql}");
        let total = bind_query_scalar(sqlx::query_scalar::<_, i64>(&count_sql), &clause.values)
            .fetch_one(&self.pool)
            .await?;

        let data_sql = format!(
            "SELECT id, document_type, document_id, action, previous_data, new_data, actor_id, timestamp \
             FROM change_log{where_sql} ORDER BY id DESC LIMIT ? OFFSET ?"
        );
        let rows = bind_query_as(sqlx::query_as::<_, ChangeLogRow>(&data_sql), &clause.values)
            .bind(filter.per_page())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        let entries = rows
            .into_iter()
            .map(ChangeLogEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((entries, total))
    }
}

impl ReportStore for MySqlStore {
    async fn insert_report(
        &self,
        report: &NewWorkScheduleReport,
    ) -> Result<WorkScheduleReport, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO work_schedule_reports (employee_id, report_date, total_hours, approved_shifts)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(report.employee_id)
        .bind(report.report_date)
        .bind(report.total_hours)
        .bind(report.approved_shifts)
        .execute(&self.pool)
        .await?;

        let stored = sqlx::query_as::<_, WorkScheduleReport>(
            r#"
            SELECT id, employee_id, report_date, total_hours, approved_shifts, created_at
            FROM work_schedule_reports
            WHERE id = ?
            "#,
        )
        .bind(result.last_insert_id())
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }
}

impl AgentStore for MySqlStore {
    async fn insert_agent(&self, fields: &AgentFields) -> Result<Agent, StoreError> {
        let result = sqlx::query(
            "INSERT INTO agents (name, description, email, phone_number) VALUES (?, ?, ?, ?)",
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.email)
        .bind(&fields.phone_number)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.load_agent(id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("agent {id} missing after insert")))
    }

    async fn load_agent(&self, agent_id: u64) -> Result<Option<Agent>, StoreError> {
        let agent = sqlx::query_as::<_, Agent>(&format!(
            "SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?"
        ))
        .bind(agent_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(agent)
    }

    async fn update_agent(&self, agent_id: u64, fields: &AgentFields) -> Result<Agent, StoreError> {
        sqlx::query(
            "UPDATE agents SET name = ?, description = ?, email = ?, phone_number = ? WHERE id = ?",
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(&fields.email)
        .bind(&fields.phone_number)
        .bind(agent_id)
        .execute(&self.pool)
        .await?;

        self.load_agent(agent_id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("agent {agent_id} vanished")))
    }

    async fn delete_agent(&self, agent_id: u64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM agents WHERE id = ?")
            .bind(agent_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_agents(&self) -> Result<Vec<Agent>, StoreError> {
        let agents = sqlx::query_as::<_, Agent>(&format!(
            "SELECT {AGENT_COLUMNS} FROM agents ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(agents)
    }

    async fn insert_agent_document(
        &self,
        agent_id: u64,
        action: ChangeAction,
        user_id: u64,
    ) -> Result<AgentDocument, StoreError> {
        let result =
            sqlx::query("INSERT INTO agent_documents (agent_id, action, user_id) VALUES (?, ?, ?)")
                .bind(agent_id)
                .bind(action.to_string())
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        let id = result.last_insert_id();
        self.load_agent_document(id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("agent document {id} missing after insert")))
    }

    async fn load_agent_document(
        &self,
        document_id: u64,
    ) -> Result<Option<AgentDocument>, StoreError> {
        let row = sqlx::query_as::<_, AgentDocumentRow>(
            "SELECT id, agent_id, action, user_id, created_at FROM agent_documents WHERE id = ?",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(AgentDocument::try_from).transpose()
    }

    async fn list_agent_documents(
        &self,
        filter: &AgentDocumentFilter,
    ) -> Result<Vec<AgentDocument>, StoreError> {
        let mut clause = WhereClause::new();
        clause.push_opt("agent_id = ?", filter.agent_id);
        clause.push_opt("action = ?", filter.action.map(|a| a.to_string()));

        let sql = format!(
            "SELECT id, agent_id, action, user_id, created_at FROM agent_documents{} ORDER BY id DESC",
            clause.sql()
        );
        let rows = bind_query_as(sqlx::query_as::<_, AgentDocumentRow>(&sql), &clause.values)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(AgentDocument::try_from).collect()
    }
}
