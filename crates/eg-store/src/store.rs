use std::path::Path;

use rusqlite::{Connection, params};
use serde::Serialize;

use eg_core::database::{ProductKind, ProductRecord};
use eg_core::{
    AnalyticGraphEntry, CanonicalHash, Classification, Edge, EigenvalueRecord, GraphDatabase,
    MatrixKind, Method, Persistence, PolynomialHash, Provenance, Rejection,
};

use crate::error::{Result, StoreError};
use crate::schema;

pub struct Store {
    conn: Connection,
}

/// Row counts straight from the tables, without loading the database.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub levels: usize,
    pub entries: usize,
    pub analytic: usize,
    pub rejections: usize,
    pub poly_cache: usize,
    pub products: usize,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM metadata WHERE key = ?1")?;
        let result = stmt.query_row([key], |row| row.get(0)).ok();
        Ok(result)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        set_metadata_on(&self.conn, key, value)
    }

    // --- Save ---

    /// Replace the stored database with `db` in a single transaction.
    pub fn save_database(&self, db: &GraphDatabase) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute_batch(
            "DELETE FROM levels; DELETE FROM entries; DELETE FROM rejections;
             DELETE FROM poly_cache; DELETE FROM products; DELETE FROM product_levels;",
        )?;

        set_metadata_on(&tx, "matrix_kind", db.kind().as_str())?;
        set_metadata_on(&tx, "seeded_up_to", &db.seeded_up_to().to_string())?;
        set_metadata_on(&tx, "seed_families", &serde_json::to_string(db.seed_families())?)?;

        {
            let mut level_stmt = tx.prepare("INSERT INTO levels (n, complete) VALUES (?1, ?2)")?;
            let mut entry_stmt = tx.prepare(
                "INSERT INTO entries (n, hash, edges, eigenvalues, analytic, method, reason, family, provenance)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            let mut reject_stmt =
                tx.prepare("INSERT INTO rejections (n, hash, edges, reason) VALUES (?1, ?2, ?3, ?4)")?;
            let mut poly_stmt = tx.prepare(
                "INSERT INTO poly_cache (n, poly_hash, classification) VALUES (?1, ?2, ?3)",
            )?;

            for (n, level) in db.levels() {
                let n = n as i64;
                level_stmt.execute(params![n, level.complete as i32])?;
                for entry in level.entries.values() {
                    entry_stmt.execute(params![
                        n,
                        entry.hash.as_str(),
                        serde_json::to_string(&entry.edges)?,
                        serde_json::to_string(&entry.eigenvalues)?,
                        entry.analytic as i32,
                        entry.method.as_str(),
                        entry.reason,
                        entry.family,
                        entry.provenance.as_str(),
                    ])?;
                }
                for (hash, rejection) in &level.rejections {
                    reject_stmt.execute(params![
                        n,
                        hash.as_str(),
                        serde_json::to_string(&rejection.edges)?,
                        rejection.reason,
                    ])?;
                }
                for (hash, classification) in &level.poly_cache {
                    poly_stmt.execute(params![
                        n,
                        hash.as_str(),
                        serde_json::to_string(classification)?,
                    ])?;
                }
            }

            let mut product_stmt = tx.prepare(
                "INSERT INTO products (n, hash, kind, left_hash, right_hash, edges, eigenvalues)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (n, hash, record) in db.products() {
                product_stmt.execute(params![
                    n as i64,
                    hash.as_str(),
                    product_kind_str(record.kind),
                    record.left.as_str(),
                    record.right.as_str(),
                    serde_json::to_string(&record.edges)?,
                    serde_json::to_string(&record.eigenvalues)?,
                ])?;
            }

            let mut computed_stmt = tx.prepare("INSERT INTO product_levels (n) VALUES (?1)")?;
            for &n in db.product_levels() {
                computed_stmt.execute([n as i64])?;
            }
        }

        tx.commit()?;
        tracing::debug!(kind = %db.kind(), "saved graph database");
        Ok(())
    }

    // --- Load ---

    /// Read the stored database. An empty store yields an empty database.
    pub fn load_database(&self, kind: MatrixKind) -> Result<GraphDatabase> {
        if let Some(stored) = self.get_metadata("matrix_kind")?
            && stored != kind.as_str()
        {
            return Err(StoreError::InvalidData(format!(
                "store holds a {stored} database, not {kind}"
            )));
        }

        let mut db = GraphDatabase::new(kind);
        self.load_levels(&mut db)?;
        self.load_entries(&mut db)?;
        self.load_rejections(&mut db)?;
        self.load_poly_cache(&mut db)?;
        self.load_products(&mut db)?;

        let seeded_up_to = match self.get_metadata("seeded_up_to")? {
            Some(v) => v
                .parse::<usize>()
                .map_err(|e| StoreError::InvalidData(format!("invalid seeded_up_to '{v}': {e}")))?,
            None => 0,
        };
        let families: Vec<String> = match self.get_metadata("seed_families")? {
            Some(v) => serde_json::from_str(&v)?,
            None => Vec::new(),
        };
        db.set_seed_record(seeded_up_to, families);

        Ok(db)
    }

    fn load_levels(&self, db: &mut GraphDatabase) -> Result<()> {
        let mut stmt = self.conn.prepare("SELECT n, complete FROM levels ORDER BY n")?;
        let rows: Vec<(i64, bool)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i32>(1)? != 0)))?
            .collect::<std::result::Result<_, _>>()?;
        for (n, complete) in rows {
            db.level_mut(to_n(n)?).complete = complete;
        }
        Ok(())
    }

    fn load_entries(&self, db: &mut GraphDatabase) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "SELECT n, hash, edges, eigenvalues, analytic, method, reason, family, provenance
             FROM entries",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i32>(4)? != 0,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, String>(8)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for (n, hash, edges, eigenvalues, analytic, method, reason, family, provenance) in rows {
            let n = to_n(n)?;
            let hash = CanonicalHash::from_raw(hash);
            let entry = AnalyticGraphEntry {
                n,
                hash: hash.clone(),
                edges: parse_edges(&edges)?,
                eigenvalues: serde_json::from_str::<Vec<EigenvalueRecord>>(&eigenvalues)?,
                family,
                provenance: Provenance::parse(&provenance).unwrap_or(Provenance::Fresh),
                analytic,
                method: Method::parse(&method).unwrap_or(Method::Unclassified),
                reason,
            };
            db.level_mut(n).entries.insert(hash, entry);
        }
        Ok(())
    }

    fn load_rejections(&self, db: &mut GraphDatabase) -> Result<()> {
        let mut stmt = self.conn.prepare("SELECT n, hash, edges, reason FROM rejections")?;
        let rows: Vec<(i64, String, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
            .collect::<std::result::Result<_, _>>()?;
        for (n, hash, edges, reason) in rows {
            let rejection = Rejection {
                edges: parse_edges(&edges)?,
                reason,
            };
            db.level_mut(to_n(n)?)
                .rejections
                .insert(CanonicalHash::from_raw(hash), rejection);
        }
        Ok(())
    }

    fn load_poly_cache(&self, db: &mut GraphDatabase) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("SELECT n, poly_hash, classification FROM poly_cache")?;
        let rows: Vec<(i64, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<std::result::Result<_, _>>()?;
        for (n, hash, classification) in rows {
            let classification: Classification = serde_json::from_str(&classification)?;
            db.cache_polynomial_result(to_n(n)?, PolynomialHash::from_raw(hash), classification);
        }
        Ok(())
    }

    fn load_products(&self, db: &mut GraphDatabase) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "SELECT n, hash, kind, left_hash, right_hash, edges, eigenvalues FROM products",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for (n, hash, kind, left, right, edges, eigenvalues) in rows {
            let record = ProductRecord {
                kind: parse_product_kind(&kind)?,
                left: CanonicalHash::from_raw(left),
                right: CanonicalHash::from_raw(right),
                edges: parse_edges(&edges)?,
                eigenvalues: serde_json::from_str(&eigenvalues)?,
            };
            db.insert_product(to_n(n)?, CanonicalHash::from_raw(hash), record);
        }

        let mut stmt = self.conn.prepare("SELECT n FROM product_levels")?;
        let computed: Vec<i64> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        for n in computed {
            db.mark_products_computed(to_n(n)?);
        }
        Ok(())
    }

    // --- Maintenance ---

    /// Drop every stored graph and the seed record. Schema and kind stay.
    pub fn clear_database(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(
            "DELETE FROM levels; DELETE FROM entries; DELETE FROM rejections;
             DELETE FROM poly_cache; DELETE FROM products; DELETE FROM product_levels;
             DELETE FROM metadata WHERE key IN ('seeded_up_to', 'seed_families');",
        )?;
        tx.commit()?;
        tracing::info!("cleared graph database");
        Ok(())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let count = |sql: &str| -> Result<usize> {
            let c: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(c.max(0) as usize)
        };
        Ok(StoreStats {
            levels: count("SELECT COUNT(*) FROM levels")?,
            entries: count("SELECT COUNT(*) FROM entries")?,
            analytic: count("SELECT COUNT(*) FROM entries WHERE analytic = 1")?,
            rejections: count("SELECT COUNT(*) FROM rejections")?,
            poly_cache: count("SELECT COUNT(*) FROM poly_cache")?,
            products: count("SELECT COUNT(*) FROM products")?,
        })
    }
}

impl Persistence for Store {
    type Error = StoreError;

    fn save_database(&mut self, db: &GraphDatabase) -> Result<()> {
        Store::save_database(self, db)
    }
}

fn set_metadata_on(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

fn to_n(n: i64) -> Result<usize> {
    usize::try_from(n).map_err(|_| StoreError::InvalidData(format!("invalid vertex count {n}")))
}

fn parse_edges(json: &str) -> Result<Vec<Edge>> {
    let edges: Vec<Edge> = serde_json::from_str(json)?;
    if let Some(bad) = edges.iter().find(|e| e.0 >= e.1) {
        return Err(StoreError::InvalidData(format!("edge {bad} is not normalized")));
    }
    Ok(edges)
}

fn product_kind_str(kind: ProductKind) -> &'static str {
    match kind {
        ProductKind::Cartesian => "cartesian",
        ProductKind::Tensor => "tensor",
    }
}

fn parse_product_kind(s: &str) -> Result<ProductKind> {
    match s {
        "cartesian" => Ok(ProductKind::Cartesian),
        "tensor" => Ok(ProductKind::Tensor),
        other => Err(StoreError::InvalidData(format!("unknown product kind '{other}'"))),
    }
}
