#[tokio::main]
async fn main() {
    vybgo_server::start_server().await;
}
