pub mod repository;

pub mod connection {
    use std::time::Duration;

    use sqlx::{postgres::PgPoolOptions, PgPool};

    use crate::{config::env_var::EnvVar, error::persistence::PersistenceError};

    pub async fn create_sqlx_pool(env: &EnvVar) -> Result<PgPool, PersistenceError> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(env.database_max_connections)
            .acquire_timeout(Duration::from_millis(1000 * 5))
            .idle_timeout(Duration::from_millis(1000 * 30))
            .max_lifetime(Duration::from_millis(1000 * 60 * 30))
            .connect(&env.database_url)
            .await?;
        Ok(pool)
    }
}

pub mod sql {
    use sqlx::{Database, Encode, QueryBuilder, Type};

    pub fn push_list<'args, I, T, DB>(qb: &mut QueryBuilder<'args, DB>, list: I)
    where
        I: IntoIterator<Item = T>,
        T: 'args + Encode<'args, DB> + Send + Type<DB>,
        DB: Database,
    {
        qb.push("(");
        let mut sep = qb.separated(", ");
        for item in list {
            sep.push_bind(item);
        }
        sep.push_unseparated(")");
    }

    /// Escape `LIKE` wildcards and wrap the term in `%`.
    pub fn contains_pattern(term: &str) -> String {
        let mut pattern = String::with_capacity(term.len() + 2);
        pattern.push('%');
        for c in term.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }

    #[cfg(test)]
    mod tests {
        use pretty_assertions::assert_eq;
        use sqlx::{Execute, Postgres};

        use super::*;

        #[test]
        fn push_bind_list() {
            let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM dishes WHERE id IN ");
            push_list(&mut qb, [1_i64, 2, 3]);

            assert_eq!(
                qb.build().sql(),
                "SELECT * FROM dishes WHERE id IN ($1, $2, $3)"
            );
        }

        #[test]
        fn escape_like_pattern() {
            assert_eq!(contains_pattern("dal"), "%dal%");
            assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        }
    }
}

pub mod schema {
    use sqlx::PgPool;

    use crate::error::persistence::PersistenceError;

    const DBSCHEMA: &str = include_str!("../../dbschema.sql");

    pub fn statements() -> impl Iterator<Item = &'static str> {
        DBSCHEMA
            .split(';')
            .map(str::trim)
            .filter(|sttm| !sttm.is_empty())
    }

    /// Create the missing tables and indexes.
    pub async fn migrate(pool: &PgPool) -> Result<(), PersistenceError> {
        let mut trx = pool.begin().await?;
        for sttm in statements() {
            sqlx::query(sttm).execute(&mut trx).await?;
        }
        trx.commit().await?;

        tracing::info!("database schema is up to date");
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn idempotent_statements() {
            let sttms: Vec<_> = statements().collect();

            assert_eq!(sttms.len(), 10);
            assert!(sttms
                .iter()
                .all(|sttm| sttm.starts_with("CREATE TABLE IF NOT EXISTS")
                    || sttm.starts_with("CREATE INDEX IF NOT EXISTS")
                    || sttm.starts_with("CREATE UNIQUE INDEX IF NOT EXISTS")));
        }
    }
}
