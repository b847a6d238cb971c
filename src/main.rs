use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use warmup_intake::app::App;
use warmup_intake::config::AppConfig;
use warmup_intake::llm::create_provider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;

    // Initialize tracing; the guard must live until shutdown to flush file logs
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (file_layer, _log_guard) = match config.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir, "warmup-intake.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    eprintln!("🚀 Warm-up intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Responses: {}", config.responses_file.display());
    eprintln!("   Report: {}", config.report_file.display());

    let llm = create_provider(&config);
    match llm {
        Some(ref provider) => eprintln!("   Model: {}", provider.model_name()),
        None => eprintln!("   Model: none (set GEMINI_API_KEY to enable analytics chat)"),
    }

    let app = App::new(&config, llm);
    let router = app.router();

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    eprintln!("   Chat API: http://{addr}/api/chat\n");
    tracing::info!(port = config.port, "Server started");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
        .context("server error")?;

    Ok(())
}
