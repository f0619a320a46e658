//! Interactive mode for the server.
//!
//! Prompts for bind address, port and data seed before starting the server.

use dialoguer::{Confirm, Input};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Sets `BIND_ADDR`, `PORT` and (when given) `RAILWAY_SEED`, then
/// delegates to [`super::run_server`]. A blank seed keeps the fleet random.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Railway Operations Server");
    println!();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default("127.0.0.1".to_string())
        .interact_text()
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(8080)
        .interact_text()
        .unwrap_or(8080);

    let seed: String = Input::new()
        .with_prompt("Data seed (blank for random)")
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), &'static str> {
            if input.is_empty() || input.parse::<u64>().is_ok() {
                Ok(())
            } else {
                Err("Seed must be a non-negative integer")
            }
        })
        .interact_text()
        .unwrap_or_default();

    // SAFETY: We are single-threaded at this point (before server starts) and
    // these variables are only read once during server initialisation.
    unsafe {
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", port.to_string());
        if !seed.is_empty() {
            std::env::set_var("RAILWAY_SEED", &seed);
        }
    }

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server().await
}
