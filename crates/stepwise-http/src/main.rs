//! Stepwise demo: a registration wizard served over HTTP.
//!
//! Binary name: `stepwise-demo`
//!
//! Drives a four-step flow -- name, age, an age-dependent confirmation
//! step, and a summary page -- exercising data-dependent branching, the
//! restart sentinel, and a WebSocket stream step (live age validation).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::response::Redirect;
use axum::routing::get;
use clap::Parser;
use stepwise_core::{
    Flow, FnStep, MessageChannel, Processed, Router, START_LABEL, Sequencer, StreamBinding, step,
};
use stepwise_http::{AppState, UrlRouter, build_router};
use stepwise_types::{Codec, FlowError, StepResponse};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stepwise-demo", about = "Multi-step registration wizard demo")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "STEPWISE_PORT")]
    port: u16,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "info,stepwise_core=debug,stepwise_http=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let url_router = UrlRouter::default();
    let restart = url_router.resolve_get(START_LABEL);
    let router: Arc<dyn Router> = Arc::new(url_router);
    let sequencer = Arc::new(Sequencer::new(registration_flow(), router));
    let state = AppState::new(sequencer, restart.clone());

    let app = build_router(state).route(
        "/",
        get(move || {
            let restart = restart.clone();
            async move { Redirect::to(restart.as_str()) }
        }),
    );

    let addr = SocketAddr::from(([127, 0, 0, 1], cli.port));
    tracing::info!(%addr, "stepwise demo listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// The wizard definition
// ---------------------------------------------------------------------------

fn registration_flow() -> Flow<()> {
    step("name", name_step(), Codec::json()).and_then(|name: String| {
        step("age", age_step(), Codec::json()).and_then(move |age: u32| {
            let name = name.clone();
            let adult = age >= 18;
            let confirm_label = if adult { "confirm-adult" } else { "confirm-minor" };
            step(confirm_label, confirm_step(adult), Codec::json()).and_then(
                move |_agreed: bool| step("summary", summary_step(&name, age), Codec::json()),
            )
        })
    })
}

fn page(title: &str, body: &str) -> StepResponse {
    StepResponse::Html(format!(
        "<!doctype html><title>{title}</title><h1>{title}</h1>{body}"
    ))
}

fn name_step() -> FnStep<String> {
    FnStep::new(|_, form| match form.get("name") {
        Some(name) if !name.trim().is_empty() => Ok(Processed::Advance(name.trim().to_string())),
        _ => Ok(Processed::Halt(page("Your name", "<p>A name is required.</p>"))),
    })
    .on_render(|ctx| {
        let prefill = ctx.stored().cloned().unwrap_or_default();
        Ok(Some(page(
            "Your name",
            &format!(
                "<form method=\"post\" action=\"{}\">\
                 <input name=\"name\" value=\"{prefill}\">\
                 <button>Next</button></form>",
                ctx.current()
            ),
        )))
    })
}

fn age_step() -> FnStep<u32> {
    FnStep::new(|_, form| match form.get("age").map(str::parse::<u32>) {
        Some(Ok(age)) if age > 0 => Ok(Processed::Advance(age)),
        _ => Ok(Processed::Halt(page("Your age", "<p>Please enter a whole number.</p>"))),
    })
    .on_render(|ctx| {
        let back = ctx
            .previous()
            .map(|h| format!("<a href=\"{h}\">Back</a>"))
            .unwrap_or_default();
        Ok(Some(page(
            "Your age",
            &format!(
                "<form method=\"post\" action=\"{}\">\
                 <input name=\"age\" inputmode=\"numeric\">\
                 <button>Next</button></form>{back}",
                ctx.current()
            ),
        )))
    })
    .on_stream(|_| {
        // Live validation: echo back whether each message parses as an age.
        StreamBinding::new(|mut channel: MessageChannel| async move {
            while let Some(msg) = channel.incoming.recv().await {
                let verdict = match msg.trim().parse::<u32>() {
                    Ok(age) if age > 0 => format!("ok: {age}"),
                    _ => "not a valid age".to_string(),
                };
                if channel.outgoing.send(verdict).await.is_err() {
                    break;
                }
            }
            Ok::<(), FlowError>(())
        })
    })
}

fn confirm_step(adult: bool) -> FnStep<bool> {
    let terms = if adult {
        "I agree to the terms of service."
    } else {
        "A parent or guardian has approved this registration."
    };
    let terms_form = terms;
    FnStep::new(move |_, form| {
        if form.get("confirm").is_some() {
            Ok(Processed::Advance(true))
        } else {
            Ok(Processed::Halt(page(
                "Confirmation",
                &format!("<p>You must confirm: {terms}</p>"),
            )))
        }
    })
    .on_render(move |ctx| {
        Ok(Some(page(
            "Confirmation",
            &format!(
                "<form method=\"post\" action=\"{}\">\
                 <label><input type=\"checkbox\" name=\"confirm\"> {terms_form}</label>\
                 <button>Next</button></form>",
                ctx.current()
            ),
        )))
    })
}

fn summary_step(name: &str, age: u32) -> FnStep<()> {
    let body = format!("<p>Registered {name}, age {age}.</p>");
    let halt_body = body.clone();
    FnStep::new(move |ctx, _| {
        Ok(Processed::Halt(page(
            "All done",
            &format!(
                "{halt_body}<a href=\"{}\">Start over</a>",
                ctx.restart()
            ),
        )))
    })
    .on_render(move |ctx| {
        Ok(Some(page(
            "All done",
            &format!("{body}<a href=\"{}\">Start over</a>", ctx.restart()),
        )))
    })
}
