use std::time::Duration;

use serde::Serialize;
use storefront_core::api::{
    AppConfig, AppLifecycleState, CliError, DeepLinkError, DeepLinkEvent, DeepLinkParser, LinkOrigin,
};
use storefront_core::deeplink::validate_event;
use storefront_plugins::factory::build_router;

use super::cli::{LinkCommand, SimulateArgs};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParseReport {
    valid: bool,
    event: DeepLinkEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback: Option<DeepLinkEvent>,
}

pub async fn handle_link(cmd: LinkCommand, cfg: &AppConfig) -> Result<i32, CliError> {
    match cmd {
        LinkCommand::Parse { url } => parse(&url, cfg),
        LinkCommand::Simulate(args) => simulate(args, cfg).await,
        LinkCommand::Test { url } => test(&url, cfg).await,
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

fn parse(url: &str, cfg: &AppConfig) -> Result<i32, CliError> {
    let parser = DeepLinkParser::from_config(&cfg.deep_link);
    let event = parser
        .parse(url, LinkOrigin::WarmStart)
        .ok_or_else(|| DeepLinkError::UnsupportedScheme(url.to_string()))?;

    let report = match validate_event(&event) {
        Ok(()) => ParseReport {
            valid: true,
            event,
            fallback: None,
        },
        Err(rejection) => ParseReport {
            valid: false,
            fallback: Some(rejection.fallback_event(&event)),
            event,
        },
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).map_err(|e| CliError::Command(e.to_string()))?
    );
    Ok(if report.valid { 0 } else { 1 })
}

async fn simulate(args: SimulateArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let parts = build_router(cfg, args.initial.clone());
    let router = parts.router.clone();

    // Raised before any screen is listening; replayed after registration.
    for product_id in &args.pending {
        router.trigger_pending_action("add_to_cart", product_id.as_str());
    }

    let listener = router.add_listener(|ev| {
        println!("{}", to_json(ev));
        Ok(())
    });

    router.initialize().await;

    for url in &args.urls {
        if parts.links.push(url.as_str()) == 0 {
            tracing::warn!(url = %url, "no subscriber for simulated url");
        }
        tokio::task::yield_now().await;
    }

    if args.resume {
        parts.lifecycle.set_state(AppLifecycleState::Background);
        parts.lifecycle.set_state(AppLifecycleState::Active);
    }

    // Let the scheduled drain and stream deliveries run.
    tokio::time::sleep(Duration::from_millis(cfg.deep_link.pending_drain_delay_ms + 50)).await;

    eprintln!("{}", to_json(&router.get_status()));
    listener.unsubscribe();
    router.cleanup();
    Ok(0)
}

async fn test(url: &str, cfg: &AppConfig) -> Result<i32, CliError> {
    let parts = build_router(cfg, None);
    let router = parts.router.clone();
    router.add_listener(|ev| {
        println!("{}", to_json(ev));
        Ok(())
    });
    router.initialize().await;

    let opened = router.test_deep_link(url).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    router.cleanup();

    if opened {
        Ok(0)
    } else {
        Err(DeepLinkError::Open(url.to_string()).into())
    }
}
