//! Storage seam for the reconciliation engine.
//!
//! [`TemporalStore`] is the contract the engine runs against: an ordered
//! overlap query plus record-level writes. [`SqliteStore`] implements it over
//! a borrowed connection, queueing writes until [`TemporalStore::flush`] (or
//! the next read) applies them in order. It never opens or commits a
//! transaction itself.

use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{Connection, params_from_iter};

use crate::error::TemporalError;
use crate::interval::{Interval, Timestamp, from_micros, to_micros};
use crate::record::{RecordId, TemporalRecord, Value};
use crate::schema::{EntitySchema, FROM_COLUMN, ID_COLUMN, TO_COLUMN, quote_ident};

/// Record-level access to one entity's timelines.
pub trait TemporalStore {
    fn schema(&self) -> &EntitySchema;

    /// Records for `key` sharing at least one instant with `interval`,
    /// ordered by start with the unbounded past first. At most `limit` rows
    /// when given.
    ///
    /// # Errors
    ///
    /// Fails if pending writes cannot be applied or the query fails.
    fn overlapping(
        &mut self,
        key: &[Value],
        interval: &Interval,
        limit: Option<usize>,
    ) -> Result<Vec<TemporalRecord>, TemporalError>;

    /// Records for `key` carrying `value` that end exactly where `interval`
    /// starts or start exactly where it ends, in that order.
    ///
    /// # Errors
    ///
    /// Fails if pending writes cannot be applied or the query fails.
    fn adjacent(
        &mut self,
        key: &[Value],
        interval: &Interval,
        value: &[Value],
    ) -> Result<Vec<TemporalRecord>, TemporalError>;

    /// Queue a new record for insertion.
    ///
    /// # Errors
    ///
    /// Fails if the record does not fit the schema.
    fn add(&mut self, record: TemporalRecord) -> Result<(), TemporalError>;

    /// Queue deletion of a persisted record.
    ///
    /// # Errors
    ///
    /// Fails if the record has no id.
    fn delete(&mut self, record: &TemporalRecord) -> Result<(), TemporalError>;

    /// Queue a change of a persisted record's period.
    ///
    /// # Errors
    ///
    /// Fails if the record has no id.
    fn update_interval(
        &mut self,
        record: &TemporalRecord,
        interval: Interval,
    ) -> Result<(), TemporalError>;

    /// Apply queued writes in order.
    ///
    /// # Errors
    ///
    /// Surfaces constraint failures as [`TemporalError::OverlapViolation`] or
    /// [`TemporalError::InvalidInterval`]. Writes after the failing one are
    /// dropped; the caller must roll back.
    fn flush(&mut self) -> Result<(), TemporalError>;
}

#[derive(Debug, Clone)]
enum PendingOp {
    Insert(TemporalRecord),
    Delete(RecordId),
    UpdateInterval(RecordId, Interval),
}

/// [`TemporalStore`] over a SQLite connection or transaction.
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
    schema: EntitySchema,
    pending: Vec<PendingOp>,
    select_list: String,
}

impl<'conn> SqliteStore<'conn> {
    /// Wrap `conn` for the entity described by `schema`.
    #[must_use]
    pub fn new(conn: &'conn Connection, schema: EntitySchema) -> Self {
        let mut select = vec![ID_COLUMN.to_string()];
        select.extend(schema.key_columns().iter().map(|c| quote_ident(c)));
        select.extend(schema.value_columns().iter().map(|c| quote_ident(c)));
        select.push(FROM_COLUMN.to_string());
        select.push(TO_COLUMN.to_string());
        Self {
            conn,
            schema,
            pending: Vec::new(),
            select_list: select.join(", "),
        }
    }

    /// Number of writes waiting for [`TemporalStore::flush`].
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The record for `key` in force at `at`, if any.
    ///
    /// # Errors
    ///
    /// Fails if pending writes cannot be applied or the query fails.
    pub fn value_at(
        &mut self,
        key: &[Value],
        at: Timestamp,
    ) -> Result<Option<TemporalRecord>, TemporalError> {
        self.flush()?;
        let at = to_micros(at);
        let mut params = sql_values(key);
        params.push(SqlValue::Integer(at));
        params.push(SqlValue::Integer(at));
        let sql = format!(
            "SELECT {} FROM {} WHERE {} \
             AND ({FROM_COLUMN} IS NULL OR {FROM_COLUMN} <= ?) \
             AND ({TO_COLUMN} IS NULL OR ? < {TO_COLUMN}) \
             ORDER BY {FROM_COLUMN} IS NOT NULL, {FROM_COLUMN}, {ID_COLUMN} LIMIT 1",
            self.select_list,
            quote_ident(self.schema.table()),
            self.key_clause(),
        );
        let mut rows = self.query(&sql, params)?;
        Ok(rows.pop())
    }

    /// Every record for `key`, ordered by start.
    ///
    /// # Errors
    ///
    /// Fails if pending writes cannot be applied or the query fails.
    pub fn history(&mut self, key: &[Value]) -> Result<Vec<TemporalRecord>, TemporalError> {
        self.flush()?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} \
             ORDER BY {FROM_COLUMN} IS NOT NULL, {FROM_COLUMN}, {ID_COLUMN}",
            self.select_list,
            quote_ident(self.schema.table()),
            self.key_clause(),
        );
        self.query(&sql, sql_values(key))
    }

    /// Distinct keys present in the table.
    ///
    /// # Errors
    ///
    /// Fails if pending writes cannot be applied or the query fails.
    pub fn keys(&mut self) -> Result<Vec<Vec<Value>>, TemporalError> {
        self.flush()?;
        let columns = self
            .schema
            .key_columns()
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        if columns.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT DISTINCT {columns} FROM {} ORDER BY {columns}",
            quote_ident(self.schema.table())
        );
        let width = self.schema.key_columns().len();
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                (0..width).map(|i| row.get::<_, Value>(i)).collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn key_clause(&self) -> String {
        if self.schema.key_columns().is_empty() {
            return "1 = 1".to_string();
        }
        self.schema
            .key_columns()
            .iter()
            .map(|c| format!("{} IS ?", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn query(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<TemporalRecord>, TemporalError> {
        let keys = self.schema.key_columns().len();
        let values = self.schema.value_columns().len();
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| read_record(row, keys, values))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn apply(&self, op: PendingOp) -> Result<(), TemporalError> {
        let table = self.schema.table();
        let result = match op {
            PendingOp::Insert(record) => {
                let mut columns: Vec<String> = self
                    .schema
                    .key_columns()
                    .iter()
                    .chain(self.schema.value_columns())
                    .map(|c| quote_ident(c))
                    .collect();
                columns.push(FROM_COLUMN.to_string());
                columns.push(TO_COLUMN.to_string());
                let placeholders = vec!["?"; columns.len()].join(", ");
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ({placeholders})",
                    quote_ident(table),
                    columns.join(", "),
                );
                let mut params = sql_values(&record.key);
                params.extend(sql_values(&record.value));
                params.push(bound(record.interval.from));
                params.push(bound(record.interval.to));
                self.conn
                    .prepare_cached(&sql)
                    .and_then(|mut stmt| stmt.execute(params_from_iter(params)))
                    .map(|_| {
                        tracing::trace!(table, id = self.conn.last_insert_rowid(), "inserted record");
                    })
            }
            PendingOp::Delete(id) => {
                let sql = format!("DELETE FROM {} WHERE {ID_COLUMN} = ?1", quote_ident(table));
                let affected = self
                    .conn
                    .prepare_cached(&sql)
                    .and_then(|mut stmt| stmt.execute([id.0]));
                return match affected {
                    Ok(0) => Err(vanished(id)),
                    Ok(_) => Ok(()),
                    Err(e) => Err(TemporalError::from_write(table, e)),
                };
            }
            PendingOp::UpdateInterval(id, interval) => {
                let sql = format!(
                    "UPDATE {} SET {FROM_COLUMN} = ?1, {TO_COLUMN} = ?2 WHERE {ID_COLUMN} = ?3",
                    quote_ident(table)
                );
                let affected = self.conn.prepare_cached(&sql).and_then(|mut stmt| {
                    stmt.execute(params_from_iter([
                        bound(interval.from),
                        bound(interval.to),
                        SqlValue::Integer(id.0),
                    ]))
                });
                return match affected {
                    Ok(0) => Err(vanished(id)),
                    Ok(_) => Ok(()),
                    Err(e) => Err(TemporalError::from_write(table, e)),
                };
            }
        };
        result.map_err(|e| TemporalError::from_write(table, e))
    }

    fn persisted_id(&self, record: &TemporalRecord) -> Result<RecordId, TemporalError> {
        record.id.ok_or_else(|| TemporalError::MissingId {
            table: self.schema.table().to_string(),
        })
    }
}

fn vanished(id: RecordId) -> TemporalError {
    TemporalError::ConcurrencyConflict {
        detail: format!("record {id} changed underneath this transaction"),
    }
}

impl TemporalStore for SqliteStore<'_> {
    fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    fn overlapping(
        &mut self,
        key: &[Value],
        interval: &Interval,
        limit: Option<usize>,
    ) -> Result<Vec<TemporalRecord>, TemporalError> {
        self.flush()?;
        let mut params = sql_values(key);
        params.extend([
            bound(interval.from),
            bound(interval.from),
            bound(interval.to),
            bound(interval.to),
        ]);
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        params.push(SqlValue::Integer(limit));
        let sql = format!(
            "SELECT {} FROM {} WHERE {} \
             AND ({TO_COLUMN} IS NULL OR ? IS NULL OR {TO_COLUMN} > ?) \
             AND (? IS NULL OR {FROM_COLUMN} IS NULL OR ? > {FROM_COLUMN}) \
             ORDER BY {FROM_COLUMN} IS NOT NULL, {FROM_COLUMN}, {ID_COLUMN} LIMIT ?",
            self.select_list,
            quote_ident(self.schema.table()),
            self.key_clause(),
        );
        let rows = self.query(&sql, params)?;
        tracing::trace!(table = self.schema.table(), rows = rows.len(), "overlap query");
        Ok(rows)
    }

    fn adjacent(
        &mut self,
        key: &[Value],
        interval: &Interval,
        value: &[Value],
    ) -> Result<Vec<TemporalRecord>, TemporalError> {
        self.flush()?;
        let value_clause = self
            .schema
            .value_columns()
            .iter()
            .map(|c| format!(" AND {} IS ?", quote_ident(c)))
            .collect::<String>();
        let sql = format!(
            "SELECT {} FROM {} WHERE {}{value_clause} AND {{edge}} = ? \
             ORDER BY {FROM_COLUMN} IS NOT NULL, {FROM_COLUMN}, {ID_COLUMN}",
            self.select_list,
            quote_ident(self.schema.table()),
            self.key_clause(),
        );

        let mut found = Vec::new();
        for (edge, bound_at) in [(TO_COLUMN, interval.from), (FROM_COLUMN, interval.to)] {
            let Some(at) = bound_at else { continue };
            let mut params = sql_values(key);
            params.extend(sql_values(value));
            params.push(SqlValue::Integer(to_micros(at)));
            found.extend(self.query(&sql.replace("{edge}", edge), params)?);
        }
        Ok(found)
    }

    fn add(&mut self, record: TemporalRecord) -> Result<(), TemporalError> {
        self.schema.check_record(&record)?;
        self.pending.push(PendingOp::Insert(record));
        Ok(())
    }

    fn delete(&mut self, record: &TemporalRecord) -> Result<(), TemporalError> {
        let id = self.persisted_id(record)?;
        self.pending.push(PendingOp::Delete(id));
        Ok(())
    }

    fn update_interval(
        &mut self,
        record: &TemporalRecord,
        interval: Interval,
    ) -> Result<(), TemporalError> {
        let id = self.persisted_id(record)?;
        self.pending.push(PendingOp::UpdateInterval(id, interval));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TemporalError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let ops = std::mem::take(&mut self.pending);
        tracing::debug!(table = self.schema.table(), ops = ops.len(), "flushing pending writes");
        for op in ops {
            self.apply(op)?;
        }
        Ok(())
    }
}

fn sql_values(cells: &[Value]) -> Vec<SqlValue> {
    cells
        .iter()
        .map(|cell| match cell {
            Value::Null => SqlValue::Null,
            Value::Integer(i) => SqlValue::Integer(*i),
            Value::Text(s) => SqlValue::Text(s.clone()),
        })
        .collect()
}

fn bound(ts: Option<Timestamp>) -> SqlValue {
    ts.map_or(SqlValue::Null, |ts| SqlValue::Integer(to_micros(ts)))
}

fn read_bound(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<Timestamp>> {
    let Some(us) = row.get::<_, Option<i64>>(idx)? else {
        return Ok(None);
    };
    from_micros(us).map(Some).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {us} out of range").into(),
        )
    })
}

fn read_record(
    row: &rusqlite::Row<'_>,
    keys: usize,
    values: usize,
) -> rusqlite::Result<TemporalRecord> {
    let id = RecordId(row.get(0)?);
    let key = (1..=keys).map(|i| row.get(i)).collect::<rusqlite::Result<Vec<Value>>>()?;
    let value = (keys + 1..=keys + values)
        .map(|i| row.get(i))
        .collect::<rusqlite::Result<Vec<Value>>>()?;
    let from = read_bound(row, keys + values + 1)?;
    let to = read_bound(row, keys + values + 2)?;
    Ok(TemporalRecord {
        key,
        interval: Interval::new(from, to),
        value,
        id: Some(id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_in_memory, registry::register_entity};
    use crate::error::ErrorCode;
    use chrono::NaiveDate;

    fn ts(year: i32) -> Timestamp {
        NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date")
    }

    fn schema() -> EntitySchema {
        EntitySchema::new("model", ["name"], ["name", "value"])
    }

    fn setup() -> Connection {
        let conn = open_in_memory().expect("open");
        register_entity(&conn, &schema()).expect("register");
        conn
    }

    fn row(name: &str, from: Option<i32>, to: Option<i32>) -> TemporalRecord {
        TemporalRecord::new(
            vec![name.into()],
            Interval::new(from.map(ts), to.map(ts)),
            vec!["v".into()],
        )
    }

    fn add_all(store: &mut SqliteStore<'_>, rows: &[(Option<i32>, Option<i32>)]) {
        for (from, to) in rows {
            store.add(row("Name", *from, *to)).expect("queue");
        }
    }

    fn flush_code(rows: &[(Option<i32>, Option<i32>)]) -> Option<ErrorCode> {
        let conn = setup();
        let mut store = SqliteStore::new(&conn, schema());
        add_all(&mut store, rows);
        store.flush().err().map(|e| e.code())
    }

    #[test]
    fn overlapping_periods_are_rejected() {
        let invalid: &[&[(Option<i32>, Option<i32>)]] = &[
            &[(Some(2001), None), (Some(2002), None)],
            &[(Some(2002), None), (Some(2002), None)],
            &[(Some(2001), Some(2002)), (Some(2001), Some(2002))],
            &[(Some(2001), Some(2003)), (Some(2001), Some(2002))],
            &[(Some(2001), Some(2003)), (Some(2002), Some(2003))],
            &[(Some(2001), Some(2004)), (Some(2002), Some(2003))],
            &[(Some(2002), Some(2003)), (Some(2001), Some(2004))],
            &[(Some(2001), None), (Some(2000), Some(2002))],
            &[(Some(2000), Some(2002)), (Some(2001), None)],
            &[(None, None), (Some(2001), Some(2002))],
        ];
        for rows in invalid {
            assert_eq!(
                flush_code(rows),
                Some(ErrorCode::OverlapViolation),
                "expected overlap for {rows:?}"
            );
        }
    }

    #[test]
    fn touching_and_disjoint_periods_are_accepted() {
        let valid: &[&[(Option<i32>, Option<i32>)]] = &[
            &[(Some(2001), Some(2002)), (Some(2002), None)],
            &[(Some(2001), Some(2002)), (Some(2002), Some(2003))],
            &[(Some(2002), Some(2003)), (Some(2001), Some(2002))],
            &[(Some(2002), Some(2003)), (Some(2000), Some(2001))],
            &[(Some(2000), Some(2001)), (Some(2002), Some(2003))],
            &[(Some(2000), Some(2001)), (Some(2002), Some(2003)), (Some(2001), Some(2002))],
            &[(None, Some(2004))],
        ];
        for rows in valid {
            assert_eq!(flush_code(rows), None, "expected success for {rows:?}");
        }
    }

    #[test]
    fn empty_and_inverted_periods_are_rejected() {
        assert_eq!(
            flush_code(&[(Some(2004), Some(2004))]),
            Some(ErrorCode::InvalidInterval)
        );
        assert_eq!(
            flush_code(&[(Some(2004), Some(2001))]),
            Some(ErrorCode::InvalidInterval)
        );
    }

    #[test]
    fn updating_into_an_overlap_is_rejected() {
        let conn = setup();
        let mut store = SqliteStore::new(&conn, schema());
        add_all(&mut store, &[(Some(2000), Some(2001)), (Some(2001), None)]);
        store.flush().expect("valid rows");

        let first = store.history(&["Name".into()]).expect("history").remove(0);
        store
            .update_interval(&first, Interval::new(Some(ts(2000)), Some(ts(2002))))
            .expect("queue");
        let err = store.flush().expect_err("overlap");
        assert_eq!(err.code(), ErrorCode::OverlapViolation);
    }

    #[test]
    fn different_keys_do_not_conflict() {
        let conn = open_in_memory().expect("open");
        let booking = EntitySchema::new("booking", ["hotel", "room"], ["hotel", "room"]);
        register_entity(&conn, &booking).expect("register");
        let mut store = SqliteStore::new(&conn, booking);

        for (hotel, room) in [("h1", 1), ("h1", 2), ("h2", 1), ("h2", 2)] {
            store
                .add(TemporalRecord::new(
                    vec![hotel.into(), Value::Integer(room)],
                    Interval::starting(ts(2001)),
                    vec![],
                ))
                .expect("queue");
        }
        store.flush().expect("distinct keys");

        store
            .add(TemporalRecord::new(
                vec!["h1".into(), Value::Integer(1)],
                Interval::until(ts(2001) + chrono::Duration::days(1)),
                vec![],
            ))
            .expect("queue");
        assert_eq!(
            store.flush().expect_err("overlap").code(),
            ErrorCode::OverlapViolation
        );
    }

    #[test]
    fn disabled_constraint_allows_overlap() {
        let conn = open_in_memory().expect("open");
        let loose = EntitySchema::new("loose", ["name"], ["name", "value"]).without_exclude_constraint();
        register_entity(&conn, &loose).expect("register");
        let mut store = SqliteStore::new(&conn, loose);
        store.add(row("foo", Some(2001), None)).expect("queue");
        store.add(row("foo", Some(2002), None)).expect("queue");
        store.flush().expect("no constraint");
    }

    #[test]
    fn unkeyed_tables_have_no_constraint() {
        let conn = open_in_memory().expect("open");
        let no_keys = EntitySchema::new("no_keys", Vec::<String>::new(), ["col"]);
        register_entity(&conn, &no_keys).expect("register");
        conn.execute(
            "INSERT INTO no_keys (col, valid_from) VALUES ('a', 1), ('b', 1)",
            [],
        )
        .expect("both rows accepted");
    }

    #[test]
    fn overlapping_orders_unbounded_first_and_honours_limit() {
        let conn = setup();
        let mut store = SqliteStore::new(&conn, schema());
        add_all(
            &mut store,
            &[(Some(2003), None), (Some(2001), Some(2002)), (None, Some(2000)), (Some(2002), Some(2003))],
        );
        store.add(row("other", None, None)).expect("queue");

        let all = store
            .overlapping(&["Name".into()], &Interval::always(), None)
            .expect("query");
        let starts: Vec<_> = all.iter().map(|r| r.interval.from).collect();
        assert_eq!(starts, vec![None, Some(ts(2001)), Some(ts(2002)), Some(ts(2003))]);

        let two = store
            .overlapping(&["Name".into()], &Interval::starting(ts(2001)), Some(2))
            .expect("query");
        assert_eq!(two.len(), 2);
        assert_eq!(two[0].interval.from, Some(ts(2001)));

        let touching = store
            .overlapping(&["Name".into()], &Interval::new(Some(ts(2000)), Some(ts(2001))), None)
            .expect("query");
        assert!(touching.is_empty());
    }

    #[test]
    fn adjacent_finds_same_value_neighbours() {
        let conn = setup();
        let mut store = SqliteStore::new(&conn, schema());
        add_all(&mut store, &[(Some(2000), Some(2001)), (Some(2002), None)]);
        let mut other = row("Name", Some(2001), Some(2002));
        other.value = vec!["x".into()];
        store.add(other).expect("queue");

        let found = store
            .adjacent(
                &["Name".into()],
                &Interval::new(Some(ts(2001)), Some(ts(2002))),
                &["v".into()],
            )
            .expect("query");
        let periods: Vec<_> = found.iter().map(|r| r.interval).collect();
        assert_eq!(
            periods,
            vec![
                Interval::new(Some(ts(2000)), Some(ts(2001))),
                Interval::starting(ts(2002)),
            ]
        );

        let none = store
            .adjacent(&["Name".into()], &Interval::always(), &["v".into()])
            .expect("query");
        assert!(none.is_empty());
    }

    #[test]
    fn value_at_uses_half_open_bounds() {
        let conn = setup();
        let mut store = SqliteStore::new(&conn, schema());
        for (name, from, to) in [
            ("Name 1-1", Some(2000), Some(2001)),
            ("Name 1-2", Some(2001), Some(2002)),
            ("Name 1-3", Some(2002), None),
        ] {
            let mut record = row("k", from, to);
            record.value = vec![name.into()];
            store.add(record).expect("queue");
        }

        let at = |store: &mut SqliteStore<'_>, when| {
            store
                .value_at(&["k".into()], when)
                .expect("query")
                .map(|r| r.value[0].to_string())
        };
        assert_eq!(at(&mut store, ts(1999)), None);
        assert_eq!(at(&mut store, ts(2000)).as_deref(), Some("Name 1-1"));
        assert_eq!(at(&mut store, ts(2001)).as_deref(), Some("Name 1-2"));
        assert_eq!(at(&mut store, ts(2002)).as_deref(), Some("Name 1-3"));
        assert_eq!(at(&mut store, ts(2050)).as_deref(), Some("Name 1-3"));
    }

    #[test]
    fn delete_requires_persisted_record() {
        let conn = setup();
        let mut store = SqliteStore::new(&conn, schema());
        let err = store.delete(&row("k", None, None)).expect_err("no id");
        assert_eq!(err.code(), ErrorCode::MissingId);
    }

    #[test]
    fn add_checks_arity() {
        let conn = setup();
        let mut store = SqliteStore::new(&conn, schema());
        let err = store
            .add(TemporalRecord::new(vec![], Interval::always(), vec![]))
            .expect_err("arity");
        assert_eq!(err.code(), ErrorCode::SchemaMismatch);
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn keys_lists_distinct_keys() {
        let conn = setup();
        let mut store = SqliteStore::new(&conn, schema());
        store.add(row("b", Some(2000), Some(2001))).expect("queue");
        store.add(row("a", None, None)).expect("queue");
        store.add(row("b", Some(2001), None)).expect("queue");
        let keys = store.keys().expect("keys");
        assert_eq!(keys, vec![vec![Value::from("a")], vec![Value::from("b")]]);
    }
}
