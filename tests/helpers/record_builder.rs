// ==========================================
// 测试数据构建器 - 称重表单
// ==========================================

use chrono::NaiveDate;
use checkpeso::api::WeighingForm;
use checkpeso::domain::{LocaleNumber, RawWeighingInput, RecordMetadata};

pub struct WeighingFormBuilder {
    supplier: String,
    product: String,
    received_on: NaiveDate,
    invoice_number: Option<String>,
    inspector: Option<String>,
    notes: Option<String>,
    photos: Vec<String>,
    input: RawWeighingInput,
}

impl WeighingFormBuilder {
    /// 默认: Q=100 W=5 T=0,25 G=9,5 U=2 → 失重 6,25 kg
    pub fn new(supplier: &str, product: &str) -> Self {
        Self {
            supplier: supplier.to_string(),
            product: product.to_string(),
            received_on: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            invoice_number: None,
            inspector: None,
            notes: None,
            photos: Vec::new(),
            input: RawWeighingInput {
                lot_size: LocaleNumber::from("100"),
                nominal_weight_per_box: LocaleNumber::from("5"),
                tare_per_box: LocaleNumber::from("0,25"),
                gross_sample_weight: LocaleNumber::from("9,5"),
                underweight_count: LocaleNumber::from("2"),
                sample_size_override: None,
            },
        }
    }

    pub fn received_on(mut self, y: i32, m: u32, d: u32) -> Self {
        self.received_on = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        self
    }

    pub fn invoice(mut self, invoice: &str) -> Self {
        self.invoice_number = Some(invoice.to_string());
        self
    }

    pub fn inspector(mut self, inspector: &str) -> Self {
        self.inspector = Some(inspector.to_string());
        self
    }

    pub fn notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn photo(mut self, url: &str) -> Self {
        self.photos.push(url.to_string());
        self
    }

    pub fn lot_size(mut self, value: &str) -> Self {
        self.input.lot_size = LocaleNumber::from(value);
        self
    }

    pub fn nominal_weight(mut self, value: &str) -> Self {
        self.input.nominal_weight_per_box = LocaleNumber::from(value);
        self
    }

    pub fn tare(mut self, value: &str) -> Self {
        self.input.tare_per_box = LocaleNumber::from(value);
        self
    }

    pub fn gross(mut self, value: &str) -> Self {
        self.input.gross_sample_weight = LocaleNumber::from(value);
        self
    }

    pub fn underweight(mut self, value: &str) -> Self {
        self.input.underweight_count = LocaleNumber::from(value);
        self
    }

    pub fn sample_override(mut self, value: &str) -> Self {
        self.input.sample_size_override = Some(LocaleNumber::from(value));
        self
    }

    pub fn build(self) -> WeighingForm {
        WeighingForm {
            metadata: RecordMetadata {
                supplier: self.supplier,
                product: self.product,
                invoice_number: self.invoice_number,
                received_on: self.received_on,
                inspector: self.inspector,
                notes: self.notes,
                evidence_photos: self.photos,
            },
            input: self.input,
        }
    }
}

/// 无低重箱的表单（失重为 0）
pub fn clean_form(supplier: &str) -> WeighingForm {
    WeighingFormBuilder::new(supplier, "Peito de frango")
        .underweight("0")
        .gross("0")
        .build()
}
