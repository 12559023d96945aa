#[tokio::main]
async fn main() {
    if let Err(e) = ortoplan_lib::run().await {
        eprintln!("ortoplan: {e}");
        std::process::exit(1);
    }
}
