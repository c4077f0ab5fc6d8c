// `Arc`: 原子引用计数，用于共享缓存。
use std::sync::Arc;

// 仅在 Unix 系统下引入文件系统与路径模块，用于清理 Unix Domain Socket 文件。
#[cfg(unix)]
use std::{fs, path::Path};

// actix-web 组件：日志中间件、路由配置、应用与服务器构造器。
use actix_web::{middleware::Logger, web, App, HttpServer};

// 领域层配置与服务：配置加载、商品缓存、遥测。
use storefront_domain::config::{ApiConfig, ConfigError};
use storefront_domain::services::{
    cache::ProductCache,
    telemetry::{init_telemetry, TelemetryConfig, TelemetryError},
};
// 存储层实现。
use storefront_storage::StorageBuilder;
use thiserror::Error;
use tracing::info;

use crate::{
    handlers::{configure_metrics, configure_public},
    state::AppState,
};

// 应用程序启动入口。
pub async fn run() -> Result<(), BootstrapError> {
    // 1. 加载配置
    let config = ApiConfig::load_from_env()?;

    // 2. 初始化遥测（tracing + Prometheus 指标）
    let telemetry_config = TelemetryConfig::from_env("API");
    let telemetry = init_telemetry(&telemetry_config)?;

    // 3. 连接数据库并确保表结构存在
    let storage = StorageBuilder::from_config(config.database()).build().await?;

    // 4. 初始化商品缓存，TTL 来自配置
    let product_cache = Arc::new(ProductCache::new(config.product_cache_ttl()));

    // 5. 构建应用状态
    let state = AppState::new(storage, product_cache, telemetry);

    // 配置了内部监听器时，指标端点只在内部接口暴露。
    let include_metrics_on_public = !config.has_internal_listener();

    let public_state = state.clone();

    // 6. 公共 HTTP 服务器
    // `move ||` 闭包在每个 worker 线程中执行，构建 App 实例。
    let mut public_server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(public_state.clone()))
            .wrap(Logger::default())
            .configure(public_routes(include_metrics_on_public))
    });

    // 绑定公共服务器地址，Unix 系统下支持 UDS。
    #[cfg(unix)]
    {
        if let Some(socket) = config.api_unix_socket() {
            // 先清理上次异常退出遗留的 socket 文件。
            cleanup_socket(socket)?;
            public_server = public_server.bind_uds(socket)?;
        } else {
            public_server = public_server.bind(config.api_bind_address())?;
        }
    }

    #[cfg(not(unix))]
    {
        if let Some(socket) = config.api_unix_socket() {
            return Err(BootstrapError::Io(std::io::Error::other(format!(
                "unix socket '{socket}' requested but this platform does not support it"
            ))));
        }
        public_server = public_server.bind(config.api_bind_address())?;
    }

    info!(
        bind = config.api_bind_address(),
        unix_socket = config.api_unix_socket(),
        "public listener ready"
    );
    let public_server = public_server.run();

    // 7. 内部 HTTP 服务器（可选），仅暴露指标端点
    let internal_server = if config.has_internal_listener() {
        let internal_state = state.clone();
        let mut internal_server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(internal_state.clone()))
                .wrap(Logger::default())
                .configure(configure_metrics)
        });

        #[cfg(unix)]
        {
            if let Some(socket) = config.internal_unix_socket() {
                cleanup_socket(socket)?;
                internal_server = internal_server.bind_uds(socket)?;
            } else if let Some(addr) = config.internal_bind_address() {
                internal_server = internal_server.bind(addr)?;
            } else {
                return Err(BootstrapError::Io(std::io::Error::other(
                    "internal listener configured but no bind target provided",
                )));
            }
        }

        #[cfg(not(unix))]
        {
            if let Some(socket) = config.internal_unix_socket() {
                return Err(BootstrapError::Io(std::io::Error::other(format!(
                    "internal unix socket '{socket}' requested but this platform does not support it"
                ))));
            }
            if let Some(addr) = config.internal_bind_address() {
                internal_server = internal_server.bind(addr)?;
            } else {
                return Err(BootstrapError::Io(std::io::Error::other(
                    "internal listener configured but no bind target provided",
                )));
            }
        }

        info!(
            bind = config.internal_bind_address(),
            unix_socket = config.internal_unix_socket(),
            "internal listener ready"
        );
        Some(internal_server.run())
    } else {
        None
    };

    // 8. 并发运行服务器，任一出错即整体退出。
    if let Some(internal) = internal_server {
        tokio::try_join!(public_server, internal)?;
    } else {
        public_server.await?;
    }

    Ok(())
}

// 公共接口路由；`include_metrics` 为假时不挂载 `/metrics`。
pub(crate) fn public_routes(include_metrics: bool) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        configure_public(cfg);
        if include_metrics {
            configure_metrics(cfg);
        }
    }
}

// 启动过程中的错误。
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("storage error: {0}")]
    Storage(#[from] storefront_domain::storage::StorageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// socket 文件已存在时 bind 会失败，需要先删除。
#[cfg(unix)]
fn cleanup_socket(path: &str) -> std::io::Result<()> {
    let socket_path = Path::new(path);
    if socket_path.exists() {
        fs::remove_file(socket_path)?;
    }
    Ok(())
}
