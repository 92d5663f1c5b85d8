use std::sync::Arc;

use dotenvy::dotenv;
use models::email_log::EmailLogQuery;
use service::{
    cart::{LogNotifier, ScopedCartStore},
    email_log::EmailLogClient,
    identity::{HttpIdentityProvider, IdentityProvider},
    kv::{FileKvStore, KeyValueStore},
    session::SessionService,
};
use tracing::{error, info, warn};
use uuid::Uuid;

fn load_config() -> (configs::AppConfig, Option<anyhow::Error>) {
    match configs::AppConfig::load_and_validate() {
        Ok(cfg) => (cfg, None),
        // 配置文件缺失或无效时退回默认值 + 环境变量
        Err(e) => match configs::AppConfig::from_env() {
            Ok(cfg) => (cfg, Some(e)),
            Err(env_err) => (configs::AppConfig::default(), Some(e.context(env_err.to_string()))),
        },
    }
}

async fn run(cfg: configs::AppConfig) -> anyhow::Result<()> {
    service::runtime::ensure_env(&cfg.storage.data_file).await?;

    let kv: Arc<dyn KeyValueStore> = FileKvStore::new(&cfg.storage.data_file).await?;
    let client = service::runtime::api_client(&cfg.api)?;
    let identity: Arc<dyn IdentityProvider> = Arc::new(HttpIdentityProvider::new(client.clone()));
    let mut store = ScopedCartStore::new(kv.clone(), identity.clone(), Arc::new(LogNotifier::default()));

    // 可选：通过环境变量登录（CART_LOGIN_EMAIL / CART_LOGIN_PASSWORD）
    let credentials = (std::env::var("CART_LOGIN_EMAIL").ok(), std::env::var("CART_LOGIN_PASSWORD").ok());
    if let (Some(email), Some(password)) = credentials {
        let sessions = SessionService::new(client.clone(), kv.clone(), identity.clone());
        if let Err(e) = sessions.login(&mut store, &email, &password).await {
            warn!(service = "session", event = "login_failed", code = e.code(), error = %e, "login failed");
        }
    }

    if store.current_user().is_none() && store.resolve_current_user().await.is_some() {
        let report = store.migrate_legacy_carts().await?;
        info!(
            service = "session",
            event = "migration",
            migrated = ?report.migrated,
            discarded = ?report.discarded,
            "legacy carts checked"
        );
    }

    match store.debug_info().await {
        Ok(dbg) => info!(
            service = "session",
            event = "cart_summary",
            user = dbg.current_user.as_ref().map(|u| u.partition_id()).unwrap_or("-"),
            product_key = dbg.product_cart_key.as_deref().unwrap_or("-"),
            products = dbg.product_cart_items,
            categories = dbg.category_cart_items,
            "cart state"
        ),
        Err(e) => warn!(service = "session", event = "cart_unreadable", error = %e, "cannot read carts"),
    }

    let logs = EmailLogClient::new(client);
    println!("{}", logs.load_and_render(&EmailLogQuery::default()).await);
    Ok(())
}

fn main() -> std::process::ExitCode {
    // 提前加载 .env，使得 RUST_LOG / API_BASE_URL 等环境变量生效
    dotenv().ok();
    let (cfg, config_err) = load_config();
    common::utils::logging::init_logging(&cfg.logging.format);

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");
    info!(service = "session", event = "logger_init", "tracing subscriber initialized");
    if let Some(e) = config_err {
        warn!(service = "session", event = "config_fallback", error = %e, "using default configuration");
    }

    // Panic 钩子：捕获异常并输出错误日志
    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "session",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "session", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "session",
        event = "start",
        %service_id,
        pid,
        version,
        api = %cfg.api.base_url,
        data_file = %cfg.storage.data_file,
        "session starting"
    );

    rt.block_on(async move {
        tokio::select! {
            res = run(cfg) => match res {
                Ok(()) => {
                    info!(service = "session", event = "stop", %service_id, pid, "session finished");
                    std::process::ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(service = "session", event = "run_failed", error = %e, "session run returned error");
                    std::process::ExitCode::FAILURE
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!(service = "session", event = "shutdown_signal", %service_id, pid, "received Ctrl+C, shutting down");
                std::process::ExitCode::SUCCESS
            }
        }
    })
}
