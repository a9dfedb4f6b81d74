// src/models/legacy.rs
//
// Read/copy adapter over the pre-existing legacy question table. The legacy
// schema uses quoted, historically-cased column names ("Serial", "A".."T",
// "ANSWER", "Complexity", "Length"); every query that has to spell those
// names lives here so handlers only ever see typed rows.

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Row of the legacy `legacy_questions` table. Serialized with the original
/// wire casing the existing clients expect.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct LegacyQuestion {
    #[sqlx(rename = "Serial")]
    pub serial: String,
    #[sqlx(rename = "A")]
    #[serde(rename = "A")]
    pub a: Option<String>,
    #[sqlx(rename = "B")]
    #[serde(rename = "B")]
    pub b: Option<String>,
    #[sqlx(rename = "C")]
    #[serde(rename = "C")]
    pub c: Option<String>,
    #[sqlx(rename = "D")]
    #[serde(rename = "D")]
    pub d: Option<String>,
    #[sqlx(rename = "E")]
    #[serde(rename = "E")]
    pub e: Option<String>,
    #[sqlx(rename = "F")]
    #[serde(rename = "F")]
    pub f: Option<String>,
    #[sqlx(rename = "G")]
    #[serde(rename = "G")]
    pub g: Option<String>,
    #[sqlx(rename = "H")]
    #[serde(rename = "H")]
    pub h: Option<String>,
    #[sqlx(rename = "I")]
    #[serde(rename = "I")]
    pub i: Option<String>,
    #[sqlx(rename = "J")]
    #[serde(rename = "J")]
    pub j: Option<String>,
    #[sqlx(rename = "K")]
    #[serde(rename = "K")]
    pub k: Option<String>,
    #[sqlx(rename = "L")]
    #[serde(rename = "L")]
    pub l: Option<String>,
    #[sqlx(rename = "M")]
    #[serde(rename = "M")]
    pub m: Option<String>,
    #[sqlx(rename = "N")]
    #[serde(rename = "N")]
    pub n: Option<String>,
    #[sqlx(rename = "O")]
    #[serde(rename = "O")]
    pub o: Option<String>,
    #[sqlx(rename = "P")]
    #[serde(rename = "P")]
    pub p: Option<String>,
    #[sqlx(rename = "Q")]
    #[serde(rename = "Q")]
    pub q: Option<String>,
    #[sqlx(rename = "R")]
    #[serde(rename = "R")]
    pub r: Option<String>,
    #[sqlx(rename = "S")]
    #[serde(rename = "S")]
    pub s: Option<String>,
    #[sqlx(rename = "T")]
    #[serde(rename = "T")]
    pub t: Option<String>,
    #[sqlx(rename = "ANSWER")]
    #[serde(rename = "ANSWER")]
    pub answer: Option<String>,
    #[sqlx(rename = "Complexity")]
    #[serde(rename = "Complexity")]
    pub complexity: String,
    #[sqlx(rename = "Length")]
    #[serde(rename = "Length")]
    pub length: String,
}

/// Row of `legacy_assigned_questions` (lowercase columns).
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AssignedLegacyQuestion {
    pub serial: String,
    pub a: Option<String>,
    pub b: Option<String>,
    pub c: Option<String>,
    pub d: Option<String>,
    pub e: Option<String>,
    pub f: Option<String>,
    pub g: Option<String>,
    pub h: Option<String>,
    pub i: Option<String>,
    pub j: Option<String>,
    pub k: Option<String>,
    pub l: Option<String>,
    pub m: Option<String>,
    pub n: Option<String>,
    pub o: Option<String>,
    pub p: Option<String>,
    pub q: Option<String>,
    pub r: Option<String>,
    pub s: Option<String>,
    pub t: Option<String>,
    pub answer: Option<String>,
    pub complexity: String,
    pub length: String,
    pub student_id: Option<String>,
    pub teacher_id: Option<String>,
    pub section_id: Option<String>,
    pub activity_name: Option<String>,
    pub speed: Option<f64>,
}

/// Optional scoping context attached to copied rows.
#[derive(Debug, Default, Clone)]
pub struct AssignContext {
    pub student_id: Option<String>,
    pub teacher_id: Option<String>,
    pub section_id: Option<String>,
    pub activity_name: Option<String>,
    pub speed: Option<f64>,
}

/// Filters for listing already-assigned legacy rows.
#[derive(Debug, Default, Clone)]
pub struct AssignedFilter {
    pub complexity: Option<String>,
    pub length: Option<String>,
    pub student_id: Option<String>,
    pub teacher_id: Option<String>,
    pub activity_name: Option<String>,
}

const LEGACY_SELECT: &str = r#"SELECT "Serial", "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S", "T", "ANSWER", "Complexity", "Length" FROM legacy_questions"#;

const ASSIGNED_SELECT: &str = "SELECT serial, a, b, c, d, e, f, g, h, i, j, \
     k, l, m, n, o, p, q, r, s, t, \
     answer, complexity, length, student_id, teacher_id, section_id, activity_name, speed \
     FROM legacy_assigned_questions";

/// Typed accessors over the legacy tables.
pub struct LegacyStore<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LegacyStore<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Legacy bank rows matching `(complexity, length)`, ordered by serial.
    pub async fn questions(
        &self,
        complexity: &str,
        length: &str,
        limit: Option<i64>,
    ) -> sqlx::Result<Vec<LegacyQuestion>> {
        let sql = format!(
            r#"{LEGACY_SELECT} WHERE "Complexity" = ? AND "Length" = ? ORDER BY "Serial""#
        );
        match limit {
            Some(n) => {
                let sql = format!("{sql} LIMIT ?");
                sqlx::query_as::<_, LegacyQuestion>(&sql)
                    .bind(complexity)
                    .bind(length)
                    .bind(n)
                    .fetch_all(self.pool)
                    .await
            }
            None => {
                sqlx::query_as::<_, LegacyQuestion>(&sql)
                    .bind(complexity)
                    .bind(length)
                    .fetch_all(self.pool)
                    .await
            }
        }
    }

    /// Copies the given rows into `legacy_assigned_questions`, tagged with the
    /// optional scoping context. Returns the number of rows inserted.
    pub async fn assign(
        &self,
        rows: &[LegacyQuestion],
        ctx: &AssignContext,
    ) -> sqlx::Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO legacy_assigned_questions (\
             serial, a, b, c, d, e, f, g, h, i, j, \
             k, l, m, n, o, p, q, r, s, t, \
             answer, complexity, length, student_id, teacher_id, section_id, activity_name, speed) ",
        );
        builder.push_values(rows, |mut b, row| {
            b.push_bind(&row.serial)
                .push_bind(&row.a)
                .push_bind(&row.b)
                .push_bind(&row.c)
                .push_bind(&row.d)
                .push_bind(&row.e)
                .push_bind(&row.f)
                .push_bind(&row.g)
                .push_bind(&row.h)
                .push_bind(&row.i)
                .push_bind(&row.j)
                .push_bind(&row.k)
                .push_bind(&row.l)
                .push_bind(&row.m)
                .push_bind(&row.n)
                .push_bind(&row.o)
                .push_bind(&row.p)
                .push_bind(&row.q)
                .push_bind(&row.r)
                .push_bind(&row.s)
                .push_bind(&row.t)
                .push_bind(&row.answer)
                .push_bind(&row.complexity)
                .push_bind(&row.length)
                .push_bind(&ctx.student_id)
                .push_bind(&ctx.teacher_id)
                .push_bind(&ctx.section_id)
                .push_bind(&ctx.activity_name)
                .push_bind(ctx.speed);
        });

        let done = builder.build().execute(self.pool).await?;
        Ok(done.rows_affected())
    }

    /// Lists assigned rows matching the filter, ordered by serial.
    pub async fn assigned(
        &self,
        filter: &AssignedFilter,
    ) -> sqlx::Result<Vec<AssignedLegacyQuestion>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(ASSIGNED_SELECT);
        let mut has_where = false;

        let mut push_filter = |builder: &mut QueryBuilder<'_, Sqlite>,
                               has_where: &mut bool,
                               column: &str,
                               value: &Option<String>| {
            if let Some(v) = value {
                builder.push(if *has_where { " AND " } else { " WHERE " });
                builder.push(column).push(" = ").push_bind(v.clone());
                *has_where = true;
            }
        };

        push_filter(&mut builder, &mut has_where, "complexity", &filter.complexity);
        push_filter(&mut builder, &mut has_where, "length", &filter.length);
        push_filter(&mut builder, &mut has_where, "student_id", &filter.student_id);
        push_filter(&mut builder, &mut has_where, "teacher_id", &filter.teacher_id);
        push_filter(
            &mut builder,
            &mut has_where,
            "activity_name",
            &filter.activity_name,
        );

        builder.push(" ORDER BY serial");

        builder.build_query_as().fetch_all(self.pool).await
    }

    /// Deduplicating copy: inserts legacy rows for `(complexity, length)`
    /// whose serials are not already assigned under that same scope.
    ///
    /// Returns the insert statement's own affected-row count. The previous
    /// implementation diffed before/after COUNT(*) values, which miscounts
    /// under concurrent callers.
    pub async fn copy_missing(
        &self,
        complexity: &str,
        length: &str,
        limit: Option<i64>,
    ) -> sqlx::Result<u64> {
        let mut sql = String::from(
            r#"INSERT INTO legacy_assigned_questions (
  serial, a, b, c, d, e, f, g, h, i, j,
  k, l, m, n, o, p, q, r, s, t,
  answer, complexity, length
)
SELECT
  q."Serial", q."A", q."B", q."C", q."D", q."E", q."F", q."G", q."H", q."I", q."J",
  q."K", q."L", q."M", q."N", q."O", q."P", q."Q", q."R", q."S", q."T",
  q."ANSWER", q."Complexity", q."Length"
FROM legacy_questions q
WHERE q."Complexity" = ? AND q."Length" = ?
AND q."Serial" NOT IN (
  SELECT serial FROM legacy_assigned_questions a
  WHERE a.complexity = ? AND a.length = ?
)
ORDER BY q."Serial""#,
        );

        let done = match limit {
            Some(n) => {
                sql.push_str(" LIMIT ?");
                sqlx::query(&sql)
                    .bind(complexity)
                    .bind(length)
                    .bind(complexity)
                    .bind(length)
                    .bind(n)
                    .execute(self.pool)
                    .await?
            }
            None => {
                sqlx::query(&sql)
                    .bind(complexity)
                    .bind(length)
                    .bind(complexity)
                    .bind(length)
                    .execute(self.pool)
                    .await?
            }
        };

        Ok(done.rows_affected())
    }

    /// Distinct complexity labels present in the legacy bank.
    pub async fn complexities(&self) -> sqlx::Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"SELECT DISTINCT "Complexity" FROM legacy_questions ORDER BY "Complexity""#,
        )
        .fetch_all(self.pool)
        .await
    }
}
