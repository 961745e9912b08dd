#[tokio::main]
async fn main() {
    if let Err(e) = buddybot_lib::run().await {
        buddybot_lib::logging::log_error(None, &format!("Fatal: {}", e));
        eprintln!("buddybot failed to start: {}", e);
        std::process::exit(1);
    }
}
