// ==========================================
// ImportApi 端到端测试
// ==========================================
// 测试范围:
// 1. CSV（分号 / 逗号分隔）导入 → 校验 → 落库 → 汇总
// 2. 行级问题不中断整批
// 3. 文件级错误（文件不存在、格式不支持、缺少必填列）
// 4. 导入批次的操作日志
// ==========================================

mod helpers;

use checkpeso::api::ApiError;
use checkpeso::domain::RecordFilter;
use helpers::api_test_helper::*;

const PLANILHA: &str = "\u{feff}Fornecedor;Produto;Nota Fiscal;Data de Recebimento;Quantidade Recebida (cx);Peso Líquido por Caixa (kg);Tara Caixa;Peso Bruto Análise;Qtd Baixo Peso;Fotos\n\
Frigorífico Sul;Coxa;4471;02/03/2026;100;5,0;0,25;9,5;2;a.jpg|b.jpg\n\
Granja Norte;Peito;4472;03/03/2026;10;1,234;0,22;13,5;0;\n\
\n\
;Asa;4473;03/03/2026;50;2;0,1;3;1;\n\
Granja Norte;Asa;4474;31/02/2026;50;2;0,1;3;1;\n\
Granja Norte;Sobrecoxa;4475;04/03/2026;10;2;0,1;9;5;\n";

#[tokio::test]
async fn test_导入_CSV_混合有效与无效行() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let path = env.write_file("planilha.csv", PLANILHA);

    let summary = env
        .state
        .import_api
        .import_file(path.to_str().unwrap(), "importador")
        .await
        .unwrap();

    assert_eq!(summary.total_rows, 5);
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.rejected, 3);

    // 行号为原始文件行号（表头第 1 行，空行也计数）
    let rows: Vec<usize> = summary.issues.iter().map(|i| i.row).collect();
    assert_eq!(rows, vec![5, 6, 7]);
    // 低重箱数 5 超过样本量 2
    assert!(summary.issues[2].message.contains("quantidade_baixo_peso"));

    let list = env
        .state
        .audit_api
        .list_records(&RecordFilter::default())
        .unwrap();
    assert_eq!(list.total, 2);

    let coxa = list
        .records
        .iter()
        .find(|r| r.metadata.product == "Coxa")
        .unwrap();
    assert_eq!(coxa.result.loss_kg, 6.25);
    assert_eq!(coxa.metadata.evidence_photos, vec!["a.jpg", "b.jpg"]);
    assert_eq!(coxa.metadata.invoice_number.as_deref(), Some("4471"));
}

#[tokio::test]
async fn test_导入_记录批次日志() {
    let env = ApiTestEnv::new().unwrap();
    let path = env.write_file(
        "simples.csv",
        "fornecedor,produto,quantidade_recebida,peso_liquido_por_caixa\nSul,Coxa,100,5\n",
    );

    let summary = env
        .state
        .import_api
        .import_file(path.to_str().unwrap(), "importador")
        .await
        .unwrap();
    assert_eq!(summary.imported, 1);

    let logs = env.state.action_log_repo.list_recent(10).unwrap();
    let batch = logs
        .iter()
        .find(|l| l.action_type == "IMPORT_BATCH")
        .expect("缺少导入批次日志");
    assert_eq!(batch.actor, "importador");
    let payload = batch.payload_json.as_ref().unwrap();
    assert_eq!(payload["batch_id"], summary.batch_id.as_str());
    assert_eq!(payload["imported"], 1);

    // 每行一条新建日志
    assert_eq!(
        logs.iter().filter(|l| l.action_type == "CREATE_RECORD").count(),
        1
    );
}

#[tokio::test]
async fn test_导入_文件级错误() {
    let env = ApiTestEnv::new().unwrap();

    let missing = env.temp_dir.path().join("nao_existe.csv");
    let err = env
        .state
        .import_api
        .import_file(missing.to_str().unwrap(), "importador")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let txt = env.write_file("planilha.txt", "qualquer coisa");
    let err = env
        .state
        .import_api
        .import_file(txt.to_str().unwrap(), "importador")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let sem_colunas = env.write_file("sem_colunas.csv", "fornecedor;produto\nSul;Coxa\n");
    let err = env
        .state
        .import_api
        .import_file(sem_colunas.to_str().unwrap(), "importador")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ImportError(_)));

    // 文件级失败不写批次日志
    assert!(env.state.action_log_repo.list_recent(10).unwrap().is_empty());
}

#[tokio::test]
async fn test_导入_需要操作人() {
    let env = ApiTestEnv::new().unwrap();
    let path = env.write_file("x.csv", "fornecedor\n");
    let err = env
        .state
        .import_api
        .import_file(path.to_str().unwrap(), " ")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}
