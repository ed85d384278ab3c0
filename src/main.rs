#[tokio::main]
async fn main() {
    if let Err(e) = mongobackup_rs::run().await {
        eprintln!("{} {:#}", console::style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
