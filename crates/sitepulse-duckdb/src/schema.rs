/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `SITEPULSE_DUCKDB_MEMORY`, default `"1GB"`). Always set it explicitly:
/// the DuckDB default (80% of system RAM) is not acceptable for a server
/// process.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- SETTINGS
-- ===========================================
--   'version' – database schema version
CREATE TABLE IF NOT EXISTS settings (
    key             VARCHAR PRIMARY KEY,
    value           VARCHAR NOT NULL
);

-- ===========================================
-- RAW METRICS (append-only audit log of provider payloads)
-- ===========================================
CREATE TABLE IF NOT EXISTS rawmetrics (
    id              VARCHAR PRIMARY KEY,           -- UUID v4
    integration_id  VARCHAR,                       -- NULL for env-configured syncs
    provider        VARCHAR NOT NULL,              -- 'ga4'
    fetched_at      TIMESTAMP NOT NULL,
    payload         VARCHAR NOT NULL               -- report JSON, verbatim
);
CREATE INDEX IF NOT EXISTS idx_rawmetrics_provider_time
    ON rawmetrics(provider, fetched_at DESC);

-- ===========================================
-- EVENTS (one row per site, page and day fetched)
-- ===========================================
CREATE TABLE IF NOT EXISTS events (
    id                    VARCHAR PRIMARY KEY,     -- UUID v4
    site_id               VARCHAR NOT NULL,
    ts                    TIMESTAMP NOT NULL,      -- UTC midnight of the report day
    page_path             VARCHAR NOT NULL,
    event_name            VARCHAR NOT NULL,
    pageviews             BIGINT NOT NULL DEFAULT 0,
    sessions              BIGINT NOT NULL DEFAULT 0,
    users                 BIGINT NOT NULL DEFAULT 0,
    bounce_rate           DOUBLE NOT NULL DEFAULT 0,
    avg_session_duration  DOUBLE NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_events_site_time
    ON events(site_id, ts);

-- ===========================================
-- AGGREGATES (daily rollup, overwritten by each sync covering the day)
-- ===========================================
CREATE TABLE IF NOT EXISTS aggregates (
    site_id               VARCHAR NOT NULL,
    date_hour             DATE NOT NULL,
    pageviews             BIGINT NOT NULL,
    sessions              BIGINT NOT NULL,
    users                 BIGINT NOT NULL,
    bounce_rate           DOUBLE NOT NULL,
    avg_session_duration  DOUBLE NOT NULL,
    updated_at            TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (site_id, date_hour)
);
"#
    )
}

pub const SCHEMA_VERSION: &str = "1";
