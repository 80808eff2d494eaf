#[tokio::main]
async fn main() -> anyhow::Result<()> {
    draftstats_lib::run().await
}
