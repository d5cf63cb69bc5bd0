// ==========================================
// ReportApi 集成测试
// ==========================================
// 测试范围:
// 1. WhatsApp / 邮件文本（葡语数值格式）
// 2. HTML 报表与汇总
// 3. CSV 导出
// 4. 报表语言 / 公司名配置
// ==========================================

mod helpers;

use checkpeso::api::ApiError;
use checkpeso::config::config_keys;
use checkpeso::domain::RecordFilter;
use helpers::api_test_helper::*;
use helpers::record_builder::{clean_form, WeighingFormBuilder};

fn seed(env: &ApiTestEnv) -> String {
    let lossy = WeighingFormBuilder::new("Frigorífico Sul", "Coxa & Sobrecoxa")
        .invoice("4471")
        .received_on(2026, 3, 15)
        .notes("Caixas úmidas")
        .photo("https://fotos/1.jpg")
        .build();
    let id = env
        .state
        .audit_api
        .create_record(&lossy, "ana")
        .unwrap()
        .record
        .id;
    env.state
        .audit_api
        .create_record(&clean_form("Granja Norte"), "ana")
        .unwrap();
    id
}

#[tokio::test]
async fn test_whatsapp_文本() {
    let _guard = lock_locale();
    let env = ApiTestEnv::new().unwrap();
    let id = seed(&env);

    let text = env.state.report_api.whatsapp(&id).await.unwrap();
    assert!(text.starts_with("*Relatório de Conferência de Peso*"));
    assert!(text.contains("*Nota fiscal:* 4471"));
    assert!(text.contains("*Perda (kg):* 6,25"));
    assert!(text.contains("*Perda (%):* 1,25"));
    assert!(text.contains("*PERDA IDENTIFICADA*"));
    assert!(text.contains("Observações: Caixas úmidas"));
    assert!(text.contains("1 foto(s) anexada(s)"));
}

#[tokio::test]
async fn test_email_含公司名() {
    let _guard = lock_locale();
    let env = ApiTestEnv::with_config(&[(config_keys::REPORT_COMPANY_NAME, "Mercado Bom Preço")])
        .unwrap();
    let id = seed(&env);

    let email = env.state.report_api.email(&id).await.unwrap();
    assert_eq!(
        email.subject,
        "Conferência de peso - Frigorífico Sul - Coxa & Sobrecoxa - 15/03/2026"
    );
    assert!(email.body.ends_with("Mercado Bom Preço"));
    assert!(email.body.contains("- https://fotos/1.jpg"));

    assert!(matches!(
        env.state.report_api.email("nao-existe").await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_html_报表与汇总() {
    let _guard = lock_locale();
    let env = ApiTestEnv::new().unwrap();
    let id = seed(&env);

    let html = env
        .state
        .report_api
        .html(&RecordFilter::default())
        .await
        .unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Coxa &amp; Sobrecoxa"));
    assert_eq!(html.matches("<tr class=\"loss\">").count(), 1);
    assert!(html.contains(&id));

    let summary = env.state.report_api.summary(&RecordFilter::default()).unwrap();
    assert_eq!(summary.record_count, 2);
    assert_eq!(summary.total_loss_kg, 6.25);
    assert_eq!(summary.worst_record_id.as_deref(), Some(id.as_str()));
}

#[tokio::test]
async fn test_报表语言_英文() {
    let _guard = lock_locale();
    let env = ApiTestEnv::with_config(&[(config_keys::REPORT_LOCALE, "en")]).unwrap();
    let id = seed(&env);

    let text = env.state.report_api.whatsapp(&id).await.unwrap();
    assert!(text.starts_with("*Weight Audit Report*"));
    assert!(text.contains("*LOSS DETECTED*"));
    // 数值格式不随语言变化
    assert!(text.contains("6,25"));
}

#[test]
fn test_csv_导出() {
    let _guard = lock_locale();
    let env = ApiTestEnv::new().unwrap();
    seed(&env);

    let csv_text = env.state.report_api.csv(&RecordFilter::default()).unwrap();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_reader(csv_text.as_bytes());

    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "id");
    assert_eq!(&headers[24], "perda_kg");

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    let lossy = rows.iter().find(|r| &r[1] == "Frigorífico Sul").unwrap();
    assert_eq!(&lossy[24], "6,25");
    assert_eq!(&lossy[29], "PERDA");
    let clean = rows.iter().find(|r| &r[1] == "Granja Norte").unwrap();
    assert_eq!(&clean[29], "OK");
}
