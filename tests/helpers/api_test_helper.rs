// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 基于临时数据库组装完整 AppState
// ==========================================

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use checkpeso::app::AppState;
use checkpeso::config::config_manager::{config_keys, ConfigManager};
use checkpeso::i18n::{set_locale, DEFAULT_LOCALE};
use tempfile::TempDir;

// rust-i18n 的语言为全局状态；断言文案的测试持有此锁
static LOCALE_LOCK: Mutex<()> = Mutex::new(());

/// 锁定语言并切换到葡语
pub fn lock_locale() -> MutexGuard<'static, ()> {
    let guard = LOCALE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    set_locale(DEFAULT_LOCALE);
    guard
}

/// API测试环境
///
/// 临时目录随环境一起释放
pub struct ApiTestEnv {
    pub temp_dir: TempDir,
    pub db_path: String,
    pub state: AppState,
}

impl ApiTestEnv {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_config(&[])
    }

    /// 先写入配置，再初始化 AppState（镜像/语言在初始化时读取）
    pub fn with_config(entries: &[(&str, &str)]) -> Result<Self, Box<dyn std::error::Error>> {
        Self::build(TempDir::new()?, entries)
    }

    /// 启用 CSV 表格镜像的测试环境（镜像文件位于测试目录内）
    pub fn with_mirror() -> Result<(Self, PathBuf), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let mirror_path = temp_dir.path().join("conferencias.csv");
        let mirror_str = mirror_path.to_string_lossy().to_string();
        let env = Self::build(temp_dir, &[(config_keys::SHEET_MIRROR_PATH, mirror_str.as_str())])?;
        Ok((env, mirror_path))
    }

    fn build(temp_dir: TempDir, entries: &[(&str, &str)]) -> Result<Self, Box<dyn std::error::Error>> {
        checkpeso::logging::init_test();
        let db_path = temp_dir
            .path()
            .join("checkpeso_test.db")
            .to_string_lossy()
            .to_string();

        {
            let manager = ConfigManager::new(&db_path)?;
            for (key, value) in entries {
                manager.set_global_config_value(key, value)?;
            }
        }

        let state = AppState::new(db_path.clone())?;
        Ok(Self {
            temp_dir,
            db_path,
            state,
        })
    }

    /// 在测试目录下写入一个文件
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, content).expect("写入测试文件失败");
        path
    }
}
