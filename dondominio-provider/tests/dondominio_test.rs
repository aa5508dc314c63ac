//! DonDominio 集成测试
//!
//! 运行方式:
//! ```bash
//! DD_APPLICATION_KEY=xxx DD_APPLICATION_SECRET=xxx TEST_DOMAIN=example.com \
//!     cargo test -p dondominio-provider --test dondominio_test -- --ignored --nocapture --test-threads=1
//! ```

mod common;

use common::{TestContext, generate_test_token};
use dondominio_provider::{RecordApi, SERVICE_STATUS_ACTIVE};

#[tokio::test]
#[ignore]
async fn test_dondominio_ping() {
    skip_if_no_credentials!("DD_APPLICATION_KEY", "DD_APPLICATION_SECRET", "TEST_DOMAIN");

    let ctx = TestContext::from_env().expect("创建测试上下文失败");
    let result = ctx.client.ping().await;
    assert!(result.is_ok(), "ping 调用失败: {result:?}");

    let delta = ctx.client.time_delta().await.expect("time_delta 调用失败");
    let again = ctx.client.time_delta().await.expect("time_delta 调用失败");
    assert_eq!(delta, again, "time_delta 应该被缓存");

    println!("✓ ping 测试通过, time delta = {delta}");
}

#[tokio::test]
#[ignore]
async fn test_dondominio_service_active() {
    skip_if_no_credentials!("DD_APPLICATION_KEY", "DD_APPLICATION_SECRET", "TEST_DOMAIN");

    let ctx = TestContext::from_env().expect("创建测试上下文失败");
    let info = ctx
        .client
        .service_info(&ctx.domain)
        .await
        .expect("service_info 调用失败");

    assert_eq!(info.response_data.status, SERVICE_STATUS_ACTIVE);
    println!("✓ service_info 测试通过: {}", info.response_data.name);
}

#[tokio::test]
#[ignore]
async fn test_dondominio_txt_lifecycle() {
    skip_if_no_credentials!("DD_APPLICATION_KEY", "DD_APPLICATION_SECRET", "TEST_DOMAIN");

    let ctx = TestContext::from_env().expect("创建测试上下文失败");
    let token = generate_test_token();

    ctx.client
        .add_txt_record(&ctx.domain, "_acme-challenge", &token)
        .await
        .expect("add_txt_record 调用失败");

    let found = ctx
        .client
        .find_records(&ctx.domain, &token)
        .await
        .expect("find_records 调用失败");
    assert!(!found.records().is_empty(), "应该找到刚创建的记录");

    ctx.client
        .remove_txt_record(&ctx.domain, &token)
        .await
        .expect("remove_txt_record 调用失败");

    // 第二次清理应该是 no-op
    ctx.client
        .remove_txt_record(&ctx.domain, &token)
        .await
        .expect("重复 remove_txt_record 不应失败");

    let after = ctx
        .client
        .find_records(&ctx.domain, &token)
        .await
        .expect("find_records 调用失败");
    assert!(after.records().is_empty(), "记录应该已被删除");

    println!("✓ TXT 记录生命周期测试通过");
}
