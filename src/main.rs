use std::sync::Arc;

use mail_assist::agents::{Crew, MailToolset, crew_profiles};
use mail_assist::api::{AppState, api_routes};
use mail_assist::config::AppConfig;
use mail_assist::crypto::SecureDataHandler;
use mail_assist::llm::create_provider;
use mail_assist::mail::{GmailClient, TokenStore};
use mail_assist::telemetry::{self, Telemetry};
use mail_assist::workflow::{
    LlmClassifier, LlmDrafter, MessageIndex, Orchestrator, PriorityRules,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let config = AppConfig::from_env()?;

    eprintln!("📬 mail-assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   API: http://{}", config.server.bind_addr());
    eprintln!("   Login: {}/auth/login", config.google.redirect_base);
    eprintln!("   Token file: {}\n", config.google.token_path.display());

    // LLM provider
    let llm = create_provider(&config.llm)?;

    // Mail adapter — token store and Gmail client share one HTTP client.
    let http = reqwest::Client::new();
    let tokens = Arc::new(TokenStore::new(config.google.clone(), http.clone()));
    let gmail = Arc::new(GmailClient::new(
        tokens.clone(),
        http,
        &config.google.from_address,
    ));
    let toolset = Arc::new(MailToolset::new(gmail));

    // Workflow orchestrator — capabilities constructed here and injected,
    // never ambient.
    let telemetry = Arc::new(Telemetry::new());
    let index = Arc::new(MessageIndex::new(config.workflow.context_limit));
    let classifier = Arc::new(LlmClassifier::new(
        llm.clone(),
        PriorityRules::default_rules(),
    ));
    let drafter = Arc::new(LlmDrafter::new(llm.clone(), config.workflow.followup_delay));
    let orchestrator = Arc::new(Orchestrator::new(
        classifier,
        index.clone(),
        drafter,
        telemetry.clone(),
        &config.workflow,
    ));

    let state = AppState {
        orchestrator,
        crew: Arc::new(Crew::new(llm)),
        profiles: Arc::new(crew_profiles()),
        toolset,
        index,
        tokens,
        secure: Arc::new(SecureDataHandler::new()),
        telemetry,
        redirect_base: config.google.redirect_base.clone(),
    };

    let app = api_routes(state);
    let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
    tracing::info!(addr = %config.server.bind_addr(), "API server started");
    axum::serve(listener, app).await?;

    Ok(())
}
