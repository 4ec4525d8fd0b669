/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Week-start dates (always a Monday) carry no time component.
pub type WeekStart = chrono::NaiveDate;
