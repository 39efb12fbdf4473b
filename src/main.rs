#[tokio::main]
async fn main() -> anyhow::Result<()> {
    memberid::app::run().await
}
