//! SQLite-backed geometry store.
//!
//! One table per run, typed columns, polygons stored as GeoJSON geometry
//! text. A `geometry_columns` row records geometry type, encoding and spatial
//! reference for each layer.

use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use std::path::Path;

use crate::error::SinkError;
use crate::schema::OutputSchema;
use crate::sink::FeatureSink;
use crate::types::{FieldType, FieldValue, OutputRecord};

/// Default name of the store's own row identity column.
pub const DEFAULT_IDENTITY_FIELD: &str = "OBJECTID";

/// Append-only SQLite layer.
pub struct SqliteSink {
    db: Connection,
    table: String,
    srid: u32,
    identity_field: String,
    insert_sql: Option<String>,
    columns: usize,
    in_transaction: bool,
    closed: bool,
}

impl SqliteSink {
    /// Open or create the database file and prepare a layer named `table`.
    pub fn open(path: &Path, table: &str, srid: u32) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Connection::open(path)?;
        Self::from_connection(db, table, srid)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory(table: &str, srid: u32) -> Result<Self, SinkError> {
        Self::from_connection(Connection::open_in_memory()?, table, srid)
    }

    fn from_connection(db: Connection, table: &str, srid: u32) -> Result<Self, SinkError> {
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS geometry_columns (
                table_name TEXT NOT NULL,
                column_name TEXT NOT NULL,
                geometry_type TEXT NOT NULL,
                srid INTEGER NOT NULL,
                encoding TEXT NOT NULL DEFAULT 'GeoJSON',
                PRIMARY KEY (table_name, column_name)
            );",
        )?;

        Ok(Self {
            db,
            table: table.to_string(),
            srid,
            identity_field: DEFAULT_IDENTITY_FIELD.to_string(),
            insert_sql: None,
            columns: 0,
            in_transaction: false,
            closed: false,
        })
    }

    /// Override the identity column name. Keep it equal to the schema's
    /// reserved field so colliding attributes get renamed.
    pub fn with_identity_field(mut self, name: &str) -> Self {
        self.identity_field = name.to_string();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Borrow the underlying connection, e.g. to inspect results.
    pub fn connection(&self) -> &Connection {
        &self.db
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Text | FieldType::Geometry => "TEXT",
        FieldType::Double => "REAL",
        FieldType::Integer => "INTEGER",
    }
}

fn to_sql(value: &FieldValue) -> SqlValue {
    match value {
        FieldValue::Null => SqlValue::Null,
        FieldValue::Text(s) => SqlValue::Text(s.clone()),
        FieldValue::Double(d) => SqlValue::Real(*d),
        FieldValue::Integer(i) => SqlValue::Integer(*i),
        FieldValue::Geometry(g) => SqlValue::Text(g.to_geojson().to_string()),
    }
}

impl FeatureSink for SqliteSink {
    fn declare_schema(&mut self, schema: &OutputSchema) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        if self.insert_sql.is_some() {
            return Err(SinkError::SchemaAlreadyDeclared);
        }

        // SQLite column names compare case-insensitively
        let mut seen = vec![self.identity_field.to_ascii_lowercase()];
        for field in schema.fields() {
            let lower = field.name.to_ascii_lowercase();
            if seen.contains(&lower) {
                return Err(SinkError::DuplicateColumn(field.name.clone()));
            }
            seen.push(lower);
        }

        let mut defs = vec![format!(
            "{} INTEGER PRIMARY KEY AUTOINCREMENT",
            quote_ident(&self.identity_field)
        )];
        defs.extend(schema.fields().iter().map(|f| {
            format!("{} {}", quote_ident(&f.name), column_type(f.field_type))
        }));

        let table = quote_ident(&self.table);
        self.db
            .execute_batch(&format!("CREATE TABLE {table} ({});", defs.join(", ")))?;

        if let Some(geom) = schema
            .fields()
            .iter()
            .find(|f| f.field_type == FieldType::Geometry)
        {
            self.db.execute(
                "INSERT OR REPLACE INTO geometry_columns (table_name, column_name, geometry_type, srid)
                 VALUES (?1, ?2, 'POLYGON', ?3)",
                rusqlite::params![self.table, geom.name, self.srid],
            )?;
        }

        let names: Vec<String> = schema.fields().iter().map(|f| quote_ident(&f.name)).collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        self.insert_sql = Some(format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            names.join(", "),
            placeholders.join(", ")
        ));
        self.columns = names.len();

        self.db.execute_batch("BEGIN")?;
        self.in_transaction = true;
        Ok(())
    }

    fn append_record(&mut self, record: &OutputRecord) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        let sql = self.insert_sql.as_ref().ok_or(SinkError::NoSchema)?;
        if record.values.len() != self.columns {
            return Err(SinkError::Arity {
                expected: self.columns,
                got: record.values.len(),
            });
        }

        let mut stmt = self.db.prepare_cached(sql)?;
        stmt.execute(rusqlite::params_from_iter(record.values.iter().map(to_sql)))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if self.closed {
            return Ok(());
        }
        if self.in_transaction {
            self.db.execute_batch("COMMIT")?;
            self.in_transaction = false;
        }
        self.closed = true;
        Ok(())
    }
}

impl Drop for SqliteSink {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::warn!("failed to commit layer '{}': {e}", self.table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::build_polygon;
    use crate::schema::SchemaOptions;
    use serde_json::{json, Map, Value};

    fn schema() -> OutputSchema {
        let attrs: Map<String, Value> = json!({"OBJECTID": 1, "NAME": "x", "GIS_AREA": 1.5})
            .as_object()
            .cloned()
            .unwrap();
        OutputSchema::derive(&attrs, &SchemaOptions::default())
    }

    #[test]
    fn test_sqlite_sink_writes_typed_rows() {
        let mut sink = SqliteSink::open_in_memory("parks_20260101_000000", 3857).unwrap();
        sink.declare_schema(&schema()).unwrap();

        let poly =
            build_polygon(Some(&json!({"rings": [[[0, 0], [0, 1], [1, 1], [0, 0]]]}))).unwrap();
        let record = OutputRecord {
            values: vec![
                FieldValue::Text("Yellowstone".into()),
                FieldValue::Text("7".into()),
                FieldValue::Text("Yellowstone NP".into()),
                FieldValue::Double(8983.2),
                FieldValue::Geometry(poly),
            ],
        };
        sink.append_record(&record).unwrap();
        sink.finish().unwrap();

        let (term, wdpa_id, area, shape): (String, String, f64, String) = sink
            .connection()
            .query_row(
                "SELECT search_term, wdpa_OBJECTID, GIS_AREA, shape FROM \"parks_20260101_000000\"",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(term, "Yellowstone");
        assert_eq!(wdpa_id, "7");
        assert!((area - 8983.2).abs() < 1e-9);
        let shape: geojson::Geometry = serde_json::from_str(&shape).unwrap();
        assert_eq!(
            shape.value,
            geojson::Value::Polygon(vec![vec![
                vec![0.0, 0.0],
                vec![0.0, 1.0],
                vec![1.0, 1.0],
                vec![0.0, 0.0]
            ]])
        );

        let (geom_type, srid): (String, u32) = sink
            .connection()
            .query_row(
                "SELECT geometry_type, srid FROM geometry_columns WHERE table_name = ?1",
                ["parks_20260101_000000"],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(geom_type, "POLYGON");
        assert_eq!(srid, 3857);
    }

    #[test]
    fn test_sqlite_sink_rejects_bad_arity_and_closed() {
        let mut sink = SqliteSink::open_in_memory("t", 4326).unwrap();
        let short = OutputRecord {
            values: vec![FieldValue::Null],
        };
        assert!(matches!(sink.append_record(&short), Err(SinkError::NoSchema)));

        sink.declare_schema(&schema()).unwrap();
        assert!(matches!(
            sink.append_record(&short),
            Err(SinkError::Arity { expected: 5, got: 1 })
        ));

        sink.finish().unwrap();
        assert!(matches!(sink.append_record(&short), Err(SinkError::Closed)));
    }

    #[test]
    fn test_case_variant_column_rejected_before_create() {
        let attrs: Map<String, Value> = json!({"NAME": "x"}).as_object().cloned().unwrap();
        let schema = OutputSchema::derive(&attrs, &SchemaOptions::default());
        let mut sink = SqliteSink::open_in_memory("t", 3857)
            .unwrap()
            .with_identity_field("name");

        assert!(matches!(
            sink.declare_schema(&schema),
            Err(SinkError::DuplicateColumn(name)) if name == "NAME"
        ));
        let tables: i64 = sink
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 't'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 0);
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
