//! Record schema adapters.

mod postgres_record_schema;
mod static_schema;

pub use self::postgres_record_schema::PostgresRecordSchema;
pub use self::static_schema::StaticRecordSchema;
