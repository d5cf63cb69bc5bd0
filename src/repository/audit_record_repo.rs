// ==========================================
// CheckPeso - 称重核查记录仓储
// ==========================================
// 职责: 管理 conferencia_peso 表（原始输入 + 核算结果，扁平存储）
// 列名: 与报表/导出层约定的葡语 snake_case 一致
// 红线: Repository 不含业务逻辑，不重算核算结果
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::action_log::ActionLog;
use crate::domain::record::{RecordFilter, RecordMetadata, WeightAuditRecord};
use crate::domain::weighing::{LossResult, WeighingInput};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const TABLE: &str = "conferencia_peso";

/// 列顺序（与 record_values / map_row 严格对应）
const COLUMNS: [&str; 29] = [
    "id",
    "fornecedor",
    "produto",
    "nota_fiscal",
    "data_recebimento",
    "responsavel",
    "observacoes",
    "fotos_json",
    "quantidade_recebida",
    "peso_liquido_por_caixa",
    "tara_caixa",
    "peso_bruto_analise",
    "quantidade_baixo_peso",
    "quantidade_tabela_manual",
    "quantidade_tabela",
    "peso_liquido_programado",
    "peso_liquido_ideal_analise",
    "peso_liquido_analise",
    "peso_liquido_real_analise",
    "media_baixo_peso_por_caixa",
    "percentual_qtd_caixas_com_baixo_peso",
    "media_qtd_caixas_com_baixo_peso",
    "media_baixo_peso_por_cx",
    "peso_liquido_real",
    "perda_kg",
    "perda_cx",
    "perda_percentual",
    "criado_em",
    "atualizado_em",
];

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub struct WeightAuditRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WeightAuditRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 确保表存在（如果不存在则创建）
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS conferencia_peso (
              id TEXT PRIMARY KEY,
              fornecedor TEXT NOT NULL,
              produto TEXT NOT NULL,
              nota_fiscal TEXT,
              data_recebimento TEXT NOT NULL,
              responsavel TEXT,
              observacoes TEXT,
              fotos_json TEXT NOT NULL DEFAULT '[]',
              quantidade_recebida REAL NOT NULL,
              peso_liquido_por_caixa REAL NOT NULL,
              tara_caixa REAL NOT NULL,
              peso_bruto_analise REAL NOT NULL,
              quantidade_baixo_peso REAL NOT NULL,
              quantidade_tabela_manual INTEGER,
              quantidade_tabela INTEGER NOT NULL,
              peso_liquido_programado REAL NOT NULL,
              peso_liquido_ideal_analise REAL NOT NULL,
              peso_liquido_analise REAL NOT NULL,
              peso_liquido_real_analise REAL NOT NULL,
              media_baixo_peso_por_caixa REAL NOT NULL,
              percentual_qtd_caixas_com_baixo_peso REAL NOT NULL,
              media_qtd_caixas_com_baixo_peso REAL NOT NULL,
              media_baixo_peso_por_cx REAL NOT NULL,
              peso_liquido_real REAL NOT NULL,
              perda_kg REAL NOT NULL,
              perda_cx REAL NOT NULL,
              perda_percentual REAL NOT NULL,
              criado_em TEXT NOT NULL,
              atualizado_em TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_conferencia_data
              ON conferencia_peso(data_recebimento DESC);
            CREATE INDEX IF NOT EXISTS idx_conferencia_fornecedor
              ON conferencia_peso(fornecedor);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 写入操作
    // ==========================================

    pub fn insert(&self, record: &WeightAuditRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_on(&conn, record)
    }

    // ==========================================
    // 写入 + 操作日志（同一事务）
    // ==========================================
    // 红线: 记录与日志要么都落库，要么都不落库

    pub fn insert_with_log(
        &self,
        record: &WeightAuditRecord,
        log: &ActionLog,
    ) -> RepositoryResult<()> {
        self.with_log(log, |conn| insert_on(conn, record))
    }

    /// 整行覆盖（criado_em 保持不变）
    pub fn update_with_log(
        &self,
        record: &WeightAuditRecord,
        log: &ActionLog,
    ) -> RepositoryResult<()> {
        self.with_log(log, |conn| update_on(conn, record))
    }

    pub fn delete_with_log(
        &self,
        id: &str,
        log: &ActionLog,
    ) -> RepositoryResult<()> {
        self.with_log(log, |conn| delete_on(conn, id))
    }

    fn with_log<F>(&self, log: &ActionLog, write: F) -> RepositoryResult<()>
    where
        F: FnOnce(&Connection) -> RepositoryResult<()>,
    {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 任一步失败时 tx 被丢弃，自动回滚
        write(&*tx)?;
        ActionLogRepository::insert_on(&tx, log)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }

    // ==========================================
    // 查询操作
    // ==========================================

    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<WeightAuditRecord>> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", COLUMNS.join(", "), TABLE);
        let conn = self.get_conn()?;
        let record = conn
            .query_row(&sql, params![id], map_row)
            .optional()?;
        Ok(record)
    }

    /// 按条件分页查询（收货日期倒序）
    pub fn list(&self, filter: &RecordFilter) -> RepositoryResult<Vec<WeightAuditRecord>> {
        let (where_clause, mut values) = build_filter(filter);
        let sql = format!(
            "SELECT {} FROM {} {} ORDER BY data_recebimento DESC, criado_em DESC LIMIT ? OFFSET ?",
            COLUMNS.join(", "),
            TABLE,
            where_clause
        );
        values.push(Value::Integer(filter.limit as i64));
        values.push(Value::Integer(filter.offset as i64));

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(values), map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// 按条件计数（忽略分页）
    pub fn count(&self, filter: &RecordFilter) -> RepositoryResult<i64> {
        let (where_clause, values) = build_filter(filter);
        let sql = format!("SELECT COUNT(*) FROM {} {}", TABLE, where_clause);
        let conn = self.get_conn()?;
        let count = conn.query_row(&sql, params_from_iter(values), |row| row.get(0))?;
        Ok(count)
    }
}

// ==========================================
// 单条写入（连接或事务上执行）
// ==========================================

fn insert_on(conn: &Connection, record: &WeightAuditRecord) -> RepositoryResult<()> {
    let placeholders = (1..=COLUMNS.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        TABLE,
        COLUMNS.join(", "),
        placeholders
    );
    conn.execute(&sql, params_from_iter(record_values(record)?))?;
    Ok(())
}

fn update_on(conn: &Connection, record: &WeightAuditRecord) -> RepositoryResult<()> {
    let assignments = COLUMNS
        .iter()
        .enumerate()
        .filter(|(_, col)| **col != "id" && **col != "criado_em")
        .map(|(idx, col)| format!("{} = ?{}", col, idx + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE {} SET {} WHERE id = ?1", TABLE, assignments);

    let affected = conn.execute(&sql, params_from_iter(record_values(record)?))?;
    if affected == 0 {
        return Err(RepositoryError::NotFound {
            entity: "WeightAuditRecord".to_string(),
            id: record.id.clone(),
        });
    }
    Ok(())
}

fn delete_on(conn: &Connection, id: &str) -> RepositoryResult<()> {
    let affected = conn.execute("DELETE FROM conferencia_peso WHERE id = ?1", params![id])?;
    if affected == 0 {
        return Err(RepositoryError::NotFound {
            entity: "WeightAuditRecord".to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// ==========================================
// 行映射
// ==========================================

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn opt_text(value: &Option<String>) -> Value {
    value.as_ref().map_or(Value::Null, |v| Value::Text(v.clone()))
}

fn record_values(record: &WeightAuditRecord) -> RepositoryResult<Vec<Value>> {
    let m = &record.metadata;
    let i = &record.input;
    let r = &record.result;

    let mut values = vec![
        text(&record.id),
        text(&m.supplier),
        text(&m.product),
        opt_text(&m.invoice_number),
        Value::Text(m.received_on.format("%Y-%m-%d").to_string()),
        opt_text(&m.inspector),
        opt_text(&m.notes),
        Value::Text(serde_json::to_string(&m.evidence_photos)?),
        Value::Real(i.lot_size),
        Value::Real(i.nominal_weight_per_box),
        Value::Real(i.tare_per_box),
        Value::Real(i.gross_sample_weight),
        Value::Real(i.underweight_count),
        i.sample_size_override
            .map_or(Value::Null, |n| Value::Integer(i64::from(n))),
        Value::Integer(i64::from(r.sample_size)),
    ];
    values.extend(
        r.named_values()
            .iter()
            .skip(1)
            .map(|(_, v)| Value::Real(*v)),
    );
    values.push(Value::Text(record.created_at.format(TS_FORMAT).to_string()));
    values.push(Value::Text(record.updated_at.format(TS_FORMAT).to_string()));

    debug_assert_eq!(values.len(), COLUMNS.len());
    Ok(values)
}

fn parse_err(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<WeightAuditRecord> {
    let received_on: String = row.get(4)?;
    let received_on =
        NaiveDate::parse_from_str(&received_on, "%Y-%m-%d").map_err(|e| parse_err(4, e))?;
    let photos_json: String = row.get(7)?;
    let evidence_photos: Vec<String> =
        serde_json::from_str(&photos_json).map_err(|e| parse_err(7, e))?;
    let created_at: String = row.get(27)?;
    let created_at =
        NaiveDateTime::parse_from_str(&created_at, TS_FORMAT).map_err(|e| parse_err(27, e))?;
    let updated_at: String = row.get(28)?;
    let updated_at =
        NaiveDateTime::parse_from_str(&updated_at, TS_FORMAT).map_err(|e| parse_err(28, e))?;

    Ok(WeightAuditRecord {
        id: row.get(0)?,
        metadata: RecordMetadata {
            supplier: row.get(1)?,
            product: row.get(2)?,
            invoice_number: row.get(3)?,
            received_on,
            inspector: row.get(5)?,
            notes: row.get(6)?,
            evidence_photos,
        },
        input: WeighingInput {
            lot_size: row.get(8)?,
            nominal_weight_per_box: row.get(9)?,
            tare_per_box: row.get(10)?,
            gross_sample_weight: row.get(11)?,
            underweight_count: row.get(12)?,
            sample_size_override: row.get(13)?,
        },
        result: LossResult {
            sample_size: row.get(14)?,
            programmed_weight: row.get(15)?,
            ideal_sample_weight: row.get(16)?,
            analyzed_weight: row.get(17)?,
            real_analyzed_weight_delta: row.get(18)?,
            avg_underweight_per_box: row.get(19)?,
            underweight_sample_ratio: row.get(20)?,
            avg_underweight_boxes_in_lot: row.get(21)?,
            avg_underweight_per_box_final: row.get(22)?,
            real_weight: row.get(23)?,
            loss_kg: row.get(24)?,
            loss_boxes: row.get(25)?,
            loss_percent: row.get(26)?,
        },
        created_at,
        updated_at,
    })
}

fn build_filter(filter: &RecordFilter) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(supplier) = filter.supplier.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push("fornecedor LIKE ?");
        values.push(Value::Text(format!("%{}%", supplier)));
    }
    if let Some(product) = filter.product.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push("produto LIKE ?");
        values.push(Value::Text(format!("%{}%", product)));
    }
    if let Some(from) = filter.received_from {
        conditions.push("data_recebimento >= ?");
        values.push(Value::Text(from.format("%Y-%m-%d").to_string()));
    }
    if let Some(to) = filter.received_to {
        conditions.push("data_recebimento <= ?");
        values.push(Value::Text(to.format("%Y-%m-%d").to_string()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (where_clause, values)
}
