mod host;
mod sensors;
mod telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
