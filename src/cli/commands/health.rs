use crate::cli::AppContext;
use crate::registry::RegistryHealth;
use crate::Result;

/// 检查存储与注册表连通性
///
/// 不可达只打印状态，不作为错误返回；两者都可达时返回 `true`。
pub async fn health(ctx: &AppContext) -> Result<bool> {
    let store_ok = match ctx.store.query("SELECT 1").await {
        Ok(_) => {
            println!("store:    ok ({})", ctx.config.store.redacted_url());
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Store health check failed");
            println!("store:    unreachable ({})", e);
            false
        }
    };

    let registry_ok = match ctx.registry.health_check().await {
        RegistryHealth::Healthy => {
            println!("registry: ok ({})", ctx.config.registry.tracking_uri);
            true
        }
        RegistryHealth::Unreachable(reason) => {
            tracing::error!(reason = %reason, "Registry health check failed");
            println!("registry: unreachable ({})", reason);
            false
        }
    };

    Ok(store_ok && registry_ok)
}
