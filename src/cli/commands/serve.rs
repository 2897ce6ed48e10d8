use crate::config::config;
use crate::server;

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let mut config = config().clone();
    if let Some(port) = port {
        config.server.port = port;
    }
    server::serve(config).await
}
