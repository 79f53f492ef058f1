use crate::storage::{ProductStore, StoreError, UploadLogStore};
use chrono::Utc;
use common::model::product::ValidatedProduct;
use common::model::upload::{RowFailure, UploadLog, UploadStatus};
use rusqlite::{params, Connection, ErrorCode};
use uuid::Uuid;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS products (
    id              TEXT PRIMARY KEY,
    seller_id       TEXT NOT NULL,
    title           TEXT NOT NULL,
    sku             TEXT,
    category_code   TEXT NOT NULL,
    category_name   TEXT NOT NULL,
    brand           TEXT,
    price           REAL NOT NULL CHECK (price > 0),
    discount_price  REAL,
    stock_quantity  INTEGER NOT NULL CHECK (stock_quantity >= 0),
    description     TEXT,
    image_urls      TEXT NOT NULL DEFAULT '',
    size            TEXT,
    color           TEXT,
    created_at      TEXT NOT NULL,
    UNIQUE (seller_id, sku)
);
CREATE TABLE IF NOT EXISTS upload_logs (
    id              TEXT PRIMARY KEY,
    seller_id       TEXT NOT NULL,
    file_name       TEXT NOT NULL,
    file_md5        TEXT NOT NULL,
    total_rows      INTEGER NOT NULL,
    success_rows    INTEGER NOT NULL,
    failed_rows     INTEGER NOT NULL,
    status          TEXT NOT NULL,
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS upload_logs_by_seller ON upload_logs (seller_id, created_at);
";

/// Products and upload logs in one SQLite file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn count_products(&self, seller_id: &str) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM products WHERE seller_id = ?1",
            params![seller_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl ProductStore for SqliteStore {
    fn insert_batch(
        &mut self,
        seller_id: &str,
        batch: &[ValidatedProduct],
    ) -> Result<Vec<RowFailure>, StoreError> {
        let created_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut failures = Vec::new();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO products (id, seller_id, title, sku, category_code, category_name, \
                 brand, price, discount_price, stock_quantity, description, image_urls, size, color, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            )?;
            for product in batch {
                let inserted = stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    seller_id,
                    product.title,
                    product.sku,
                    product.category.code,
                    product.category.name,
                    product.brand,
                    product.price,
                    product.discount_price,
                    product.stock_quantity,
                    product.description,
                    product.image_urls.join("|"),
                    product.size,
                    product.color,
                    created_at,
                ]);
                match inserted {
                    Ok(_) => {}
                    // a constraint only aborts its own statement, the transaction stays usable
                    Err(rusqlite::Error::SqliteFailure(err, msg))
                        if err.code == ErrorCode::ConstraintViolation =>
                    {
                        failures.push(RowFailure {
                            row_number: product.row_number,
                            message: rejection_message(product, msg.as_deref()),
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
        tx.commit()?;
        Ok(failures)
    }
}

fn rejection_message(product: &ValidatedProduct, detail: Option<&str>) -> String {
    match (detail, product.sku.as_deref()) {
        (Some(d), Some(sku)) if d.contains("UNIQUE") => {
            format!("a product with SKU '{}' already exists", sku)
        }
        (Some(d), _) => format!("rejected by the database: {}", d),
        (None, _) => "rejected by the database".to_string(),
    }
}

impl UploadLogStore for SqliteStore {
    fn record_upload(&mut self, log: &UploadLog) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO upload_logs (id, seller_id, file_name, file_md5, total_rows, success_rows, failed_rows, status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                log.id,
                log.seller_id,
                log.file_name,
                log.file_md5,
                log.total_rows as i64,
                log.success_rows as i64,
                log.failed_rows as i64,
                log.status.as_str(),
                log.created_at,
            ],
        )?;
        Ok(())
    }

    fn list_uploads(&self, seller_id: &str, limit: usize) -> Result<Vec<UploadLog>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, seller_id, file_name, file_md5, total_rows, success_rows, failed_rows, status, created_at \
             FROM upload_logs WHERE seller_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![seller_id, limit as i64], |row| {
                Ok((
                    UploadLog {
                        id: row.get(0)?,
                        seller_id: row.get(1)?,
                        file_name: row.get(2)?,
                        file_md5: row.get(3)?,
                        total_rows: row.get::<_, i64>(4)? as usize,
                        success_rows: row.get::<_, i64>(5)? as usize,
                        failed_rows: row.get::<_, i64>(6)? as usize,
                        status: UploadStatus::Failed,
                        created_at: row.get(8)?,
                    },
                    row.get::<_, String>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mut log, status)| {
                log.status = status.parse().map_err(|reason| StoreError::Corrupt {
                    id: log.id.clone(),
                    reason,
                })?;
                Ok(log)
            })
            .collect()
    }
}
