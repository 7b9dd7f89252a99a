//! SQL schema for the Siren SQLite store.
//!
//! Two independent DDL batches: the event store's tables and the audit
//! journal's table. Both are idempotent thanks to `CREATE ... IF NOT EXISTS`,
//! so concurrent first-callers racing on bootstrap are benign. The batches
//! are separate because the two surfaces may be deployed and bootstrapped
//! independently.

/// Event-store DDL: alerts, assignment changes, mapping suggestions.
pub const EVENT_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS alert_events (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type         TEXT NOT NULL,
    severity           TEXT NOT NULL DEFAULT 'info',
    title              TEXT,
    message            TEXT NOT NULL,
    source             TEXT,
    entity_type        TEXT,
    entity_id          TEXT,
    related_project_id TEXT,
    related_task_id    TEXT,
    dedupe_key         TEXT,            -- NULL disables deduplication
    status             TEXT NOT NULL DEFAULT 'open',
    metadata           TEXT NOT NULL DEFAULT '{}',
    acknowledged_by    TEXT,
    acknowledged_at    TEXT,
    created_at         TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

-- Assignment changes are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS assignment_changes (
    id                     INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id                TEXT NOT NULL,
    employee_id            TEXT NOT NULL,
    employee_name          TEXT NOT NULL,
    previous_employee_id   TEXT,
    previous_employee_name TEXT,
    assigned_by            TEXT NOT NULL,
    assignment_source      TEXT NOT NULL DEFAULT 'manual',
    note                   TEXT,
    metadata               TEXT NOT NULL DEFAULT '{}',
    changed_at             TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS mapping_suggestions (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id       TEXT NOT NULL,
    workday_phase_id TEXT,
    hour_entry_id    TEXT,
    task_id          TEXT,
    suggestion_type  TEXT NOT NULL,
    confidence       INTEGER NOT NULL, -- ten-thousandths, 0..=10000
    reason           TEXT,
    source_value     TEXT,
    target_value     TEXT,
    status           TEXT NOT NULL DEFAULT 'pending',
    applied_at       TEXT,
    dismissed_at     TEXT,
    created_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS alert_dedupe_idx     ON alert_events(dedupe_key, status, created_at);
CREATE INDEX IF NOT EXISTS alert_status_idx     ON alert_events(status);
CREATE INDEX IF NOT EXISTS alert_created_idx    ON alert_events(created_at);
CREATE INDEX IF NOT EXISTS assignment_task_idx  ON assignment_changes(task_id, changed_at);
CREATE INDEX IF NOT EXISTS suggestion_proj_idx  ON mapping_suggestions(project_id, status);
";

/// Audit-journal DDL. Append-only; no UPDATE or DELETE is ever issued.
pub const AUDIT_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS audit_log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type  TEXT NOT NULL,
    role_key    TEXT,
    actor_email TEXT,
    project_id  TEXT,
    entity_type TEXT,
    entity_id   TEXT,
    payload     TEXT NOT NULL DEFAULT '{}',
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS audit_role_idx    ON audit_log(role_key, created_at);
CREATE INDEX IF NOT EXISTS audit_created_idx ON audit_log(created_at);
";
