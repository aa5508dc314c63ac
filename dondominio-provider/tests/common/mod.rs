//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::env;

use dondominio_provider::{Client, Result, get_domain};

/// 跳过测试的宏（当环境变量缺失时）
#[macro_export]
macro_rules! skip_if_no_credentials {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("跳过测试: 缺少环境变量 {}", $var);
                return;
            }
        )+
    };
}

/// 生成唯一的 ACME 验证值
pub fn generate_test_token() -> String {
    format!("test-{}", uuid::Uuid::new_v4())
}

/// 测试上下文
pub struct TestContext {
    pub client: Client,
    pub domain: String,
}

impl TestContext {
    /// Client for `TEST_DOMAIN` using `DD_APPLICATION_KEY` / `DD_APPLICATION_SECRET`.
    pub fn from_env() -> Result<Self> {
        let domain = env::var("TEST_DOMAIN").unwrap_or_default();
        let client = Client::new(
            &env::var("DD_ENDPOINT").unwrap_or_else(|_| "dondominio".to_string()),
            &env::var("DD_APPLICATION_KEY").unwrap_or_default(),
            &env::var("DD_APPLICATION_SECRET").unwrap_or_default(),
        )?;
        Ok(Self {
            client,
            domain: get_domain(&domain).to_string(),
        })
    }
}
