#[tokio::main]
async fn main() {
    broadcastq::app::startup::startup().await;
}
