// ==========================================
// CheckPeso - 表格镜像
// ==========================================
// 职责: 每次写入数据库后，把记录同步到一份共享表格（CSV 文件）
// 红线:
// - 数据库是唯一事实来源，镜像失败不回滚数据库写入
// - 镜像按 id 覆盖写入，重复同步结果不变
// ==========================================

use crate::domain::record::WeightAuditRecord;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// 镜像错误
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("镜像文件读写失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("镜像 CSV 格式错误: {0}")]
    Csv(#[from] csv::Error),

    #[error("镜像锁获取失败: {0}")]
    Lock(String),
}

pub type MirrorResult<T> = Result<T, MirrorError>;

// ==========================================
// SheetMirror Trait
// ==========================================
pub trait SheetMirror: Send + Sync {
    /// 写入或覆盖一行（按 id）
    fn upsert_row(&self, record: &WeightAuditRecord) -> MirrorResult<()>;

    /// 删除一行；不存在时视为成功
    fn remove_row(&self, record_id: &str) -> MirrorResult<()>;

    /// 镜像名称（日志用）
    fn name(&self) -> &str;
}

// ==========================================
// NoOpSheetMirror - 未配置镜像时使用
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSheetMirror;

impl SheetMirror for NoOpSheetMirror {
    fn upsert_row(&self, _record: &WeightAuditRecord) -> MirrorResult<()> {
        Ok(())
    }

    fn remove_row(&self, _record_id: &str) -> MirrorResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

// ==========================================
// CsvSheetMirror - CSV 文件镜像
// ==========================================
pub struct CsvSheetMirror {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvSheetMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取现有行（不含表头）；文件不存在返回空
    fn read_rows(&self) -> MirrorResult<Vec<Vec<String>>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }
        Ok(rows)
    }

    /// 先写临时文件再替换，避免写到一半的镜像
    fn write_rows(&self, rows: &[Vec<String>]) -> MirrorResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::Writer::from_path(&tmp_path)?;
            writer.write_record(WeightAuditRecord::FLAT_COLUMNS)?;
            for row in rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl SheetMirror for CsvSheetMirror {
    fn upsert_row(&self, record: &WeightAuditRecord) -> MirrorResult<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| MirrorError::Lock(e.to_string()))?;

        let mut rows = self.read_rows()?;
        let new_row = record.flat_row(|v| v.to_string());

        match rows
            .iter_mut()
            .find(|row| row.first().map(String::as_str) == Some(record.id.as_str()))
        {
            Some(existing) => *existing = new_row,
            None => rows.push(new_row),
        }

        self.write_rows(&rows)
    }

    fn remove_row(&self, record_id: &str) -> MirrorResult<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| MirrorError::Lock(e.to_string()))?;

        let mut rows = self.read_rows()?;
        let before = rows.len();
        rows.retain(|row| row.first().map(String::as_str) != Some(record_id));

        if rows.len() == before {
            return Ok(());
        }
        self.write_rows(&rows)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::RecordMetadata;
    use crate::domain::weighing::{LossResult, WeighingInput};
    use chrono::NaiveDate;

    fn record(id: &str, supplier: &str) -> WeightAuditRecord {
        let ts = NaiveDate::from_ymd_opt(2026, 5, 4)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        WeightAuditRecord {
            id: id.to_string(),
            metadata: RecordMetadata {
                supplier: supplier.to_string(),
                product: "Alcatra".to_string(),
                invoice_number: None,
                received_on: ts.date(),
                inspector: None,
                notes: Some("linha com, vírgula".to_string()),
                evidence_photos: vec![],
            },
            input: WeighingInput::default(),
            result: LossResult::default(),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = CsvSheetMirror::new(dir.path().join("espelho").join("planilha.csv"));

        mirror.upsert_row(&record("A", "Fornecedor 1")).unwrap();
        mirror.upsert_row(&record("B", "Fornecedor 2")).unwrap();
        mirror.upsert_row(&record("A", "Fornecedor 3")).unwrap();

        let rows = mirror.read_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "A");
        assert_eq!(rows[0][1], "Fornecedor 3");
        assert_eq!(rows[0][6], "linha com, vírgula");
        assert_eq!(rows[0].len(), WeightAuditRecord::FLAT_COLUMNS.len());
    }

    #[test]
    fn test_remove_row() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = CsvSheetMirror::new(dir.path().join("planilha.csv"));

        mirror.upsert_row(&record("A", "F")).unwrap();
        mirror.upsert_row(&record("B", "F")).unwrap();
        mirror.remove_row("A").unwrap();
        mirror.remove_row("missing").unwrap();

        let rows = mirror.read_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "B");
    }

    #[test]
    fn test_noop_mirror() {
        let mirror = NoOpSheetMirror;
        assert!(mirror.upsert_row(&record("A", "F")).is_ok());
        assert!(mirror.remove_row("A").is_ok());
        assert_eq!(mirror.name(), "noop");
    }
}
