// 模块结构：
// `application`: 服务启动逻辑。
// `handlers`: HTTP 请求处理与路由注册。
// `state`: 应用共享状态。
mod application;
mod handlers;
mod state;

// 仅在测试配置下编译 `tests` 模块。
#[cfg(test)]
mod tests;

use std::io;

// `#[actix_web::main]` 启动 actix 系统运行时并执行异步 main。
#[actix_web::main]
async fn main() -> io::Result<()> {
    // 启动失败时打印错误并以非零状态码退出。
    if let Err(err) = application::run().await {
        eprintln!("[storefront] bootstrap failed: {err}");
        return Err(io::Error::other(err.to_string()));
    }

    Ok(())
}
