use dotenv::dotenv;
use log::info;
use rusty_stub::config::Config;
use rusty_stub::StubServer;
use simplelog::SimpleLogger;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();

    let config = Config::from_env()?;
    SimpleLogger::init(config.log_level(), simplelog::Config::default())?;

    let mut server = StubServer::builder()
        .with_host(config.host().clone())
        .with_port(config.port())
        .build()?;
    server.start()?;
    info!("Serving the default response on {}", server.local_addr());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    server.stop();
    server.wait().await?;
    Ok(())
}
