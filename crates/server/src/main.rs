#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shopadmin_server::start().await
}
