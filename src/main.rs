use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(error) = voltxt_gateway::run().await {
        error!("Gateway exited with error: {}", error);
        std::process::exit(1);
    }
}
