//! Basic example demonstrating the CloudGuard API client.
//!
//! Run with:
//! ```
//! CLOUDGUARD_API_KEY=your-key CLOUDGUARD_API_SECRET=your-secret \
//! CLOUDGUARD_REGION=eu1 cargo run --example basic
//! ```

use cloudguard::{AsyncSession, Config};

#[tokio::main]
async fn main() -> cloudguard::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    println!("Loading configuration...");
    let config = Config::load()?;
    println!("Resolved: {config}");

    let session = AsyncSession::with_config(config);

    // The client lives for the duration of the closure
    let accounts = session
        .scope(|client| async move {
            println!("Connected to: {}", client.base_url());
            let response = client.get("v2/CloudAccounts").await?;
            response.text().await.map_err(cloudguard::CloudGuardError::from)
        })
        .await??;

    println!("\n--- Cloud Accounts ---");
    println!("{accounts}");
    println!("\nSession still bound: {}", session.is_bound());

    Ok(())
}
