// Binary entry point for seatbelt_exec
// This is a thin wrapper that delegates to the library implementation

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    match seatbelt_exec::shell::run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("seatbelt_exec fatal error: {:#}", e);
            Err(e)
        }
    }
}
