use serde::Serialize;
use storefront_core::api::{AppConfig, CartItemRef, CliError, SessionLoader};
use storefront_plugins::factory::build_session_loader;

use super::cli::SessionCommand;

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let s = serde_json::to_string_pretty(value).map_err(|e| CliError::Command(e.to_string()))?;
    println!("{s}");
    Ok(())
}

pub async fn handle_session(cmd: SessionCommand, cfg: &AppConfig) -> Result<i32, CliError> {
    let loader = build_session_loader(cfg)?;

    match cmd {
        SessionCommand::Show => {
            let outcome = loader.bootstrap().await;
            print_json(&outcome)?;
        }
        SessionCommand::Login(args) => {
            loader.save_credentials(&args.user_id, &args.token).await?;
            tracing::info!(user_id = %args.user_id, "credentials saved");
        }
        SessionCommand::Logout => {
            if !loader.clear_credentials().await? {
                tracing::info!("no stored credentials");
            }
        }
        SessionCommand::SetTheme { theme } => {
            loader.save_theme(&theme).await?;
        }
        SessionCommand::Notifications { enabled } => {
            loader.save_notifications_enabled(enabled).await?;
        }
        SessionCommand::AddCart(args) => {
            let cart = add_to_cart(&loader, &args.product_id, args.quantity).await?;
            print_json(&cart)?;
        }
        SessionCommand::Clear => {
            loader.clear_preferences().await?;
        }
    }
    Ok(0)
}

/// Reads the current cart through the same bootstrap path the app uses, so a
/// denied secure store does not block cart edits.
async fn add_to_cart(
    loader: &SessionLoader,
    product_id: &str,
    quantity: u32,
) -> Result<Vec<CartItemRef>, CliError> {
    let snapshot = loader.bootstrap().await.snapshot;
    let mut cart = snapshot.cart_items().map(<[_]>::to_vec).unwrap_or_default();

    match cart.iter_mut().find(|item| item.product_id == product_id) {
        Some(item) => item.quantity = item.quantity.saturating_add(quantity),
        None => cart.push(CartItemRef::new(product_id, quantity)),
    }

    match loader.save_cart(&cart).await {
        Ok(()) => Ok(cart),
        Err(e) if e.is_quota_exceeded() => {
            Err(CliError::Command(format!("could not update cart: {e}")))
        }
        Err(e) => Err(e.into()),
    }
}
