#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bookmeta_server::start().await
}
