use anyhow::Result;
use educbt_studio::config::Config;
use educbt_studio::orchestrator::App;
use educbt_studio::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用
    App::initialize(config).run().await?;

    Ok(())
}
