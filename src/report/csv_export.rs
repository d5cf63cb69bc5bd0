// ==========================================
// CheckPeso - CSV 导出
// ==========================================
// 分隔符 ';'，数值为巴西葡语格式，可直接用本地 Excel 打开
// 列顺序: WeightAuditRecord::FLAT_COLUMNS
// ==========================================

use crate::domain::record::WeightAuditRecord;
use crate::report::fmt_decimal;
use std::io::Write;

pub fn export_csv<W: Write>(records: &[WeightAuditRecord], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

    csv_writer.write_record(WeightAuditRecord::FLAT_COLUMNS)?;
    for record in records {
        csv_writer.write_record(record.flat_row(fmt_decimal))?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::lossy_record;

    #[test]
    fn test_export_csv() {
        let mut buf = Vec::new();
        export_csv(&[lossy_record()], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("id;fornecedor;produto;nota_fiscal;data_recebimento"));
        assert!(header.ends_with("criado_em;atualizado_em;status_perda"));

        let row: Vec<&str> = lines.next().unwrap().split(';').collect();
        assert_eq!(row.len(), WeightAuditRecord::FLAT_COLUMNS.len());
        assert_eq!(row[0], "REC-1");
        assert_eq!(row[7], "f1.jpg | f2.jpg");
        assert_eq!(row[14], "8");
        assert_eq!(row[24], "6,25");
        assert_eq!(row[29], "PERDA");
    }
}
