#[tokio::main]
async fn main() {
    if let Err(err) = nable_mcp::mcp::server::run_stdio().await {
        match &err.hint {
            Some(hint) => eprintln!("nable-mcp: {} ({})", err, hint),
            None => eprintln!("nable-mcp: {}", err),
        }
        std::process::exit(1);
    }
}
