//! Row persistence for the entities.
//!
//! Updates write the whole entity state back, so a use case loads an
//! entity, changes it through its methods and hands it over again.

pub mod cart;
pub mod dish;
pub mod order;
pub mod producer;
pub mod report;
pub mod review;
pub mod user;

use sqlx::{
    postgres::{PgArguments, PgRow},
    query::Query,
    Postgres,
};

use crate::error::persistence::PersistenceError;

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

fn decode<T>(row: &PgRow) -> Result<T, PersistenceError>
where
    for<'r> T: TryFrom<&'r PgRow, Error = sqlx::Error>,
{
    Ok(T::try_from(row)?)
}

fn decode_optional<T>(row: Option<PgRow>) -> Result<Option<T>, PersistenceError>
where
    for<'r> T: TryFrom<&'r PgRow, Error = sqlx::Error>,
{
    row.as_ref().map(decode).transpose()
}

fn decode_all<T>(rows: Vec<PgRow>) -> Result<Vec<T>, PersistenceError>
where
    for<'r> T: TryFrom<&'r PgRow, Error = sqlx::Error>,
{
    rows.iter().map(decode).collect()
}

/// A page of rows with the total count of the filtered listing.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
}
