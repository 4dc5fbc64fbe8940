#[tokio::main]
async fn main() -> anyhow::Result<()> {
    connctl::run().await
}
