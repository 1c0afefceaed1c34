//! FoodLens command-line entrypoint.
//!
//! `foodlens analyze [--lang CODE]` reads label text from stdin and prints the
//! analysis outcome as JSON. `foodlens chat [--session ID] [--lang CODE]` runs a
//! grounded chat session over stdin/stdout; `/analyze <label text>` inside the chat
//! explains a label and records it in the session for follow-up questions.

use std::sync::Arc;

use anyhow::{Context, bail};
use mimalloc::MiMalloc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use foodlens::chat::ChatEngine;
use foodlens::completion::GenaiCompletion;
use foodlens::config::Config;
use foodlens::embedding::{
    BertEmbedder, BertEmbedderConfig, CachedEmbedder, EmbeddingProvider, HashedEmbedder,
    RemoteEmbedder, RemoteEmbedderConfig,
};
use foodlens::knowledge::{DirectoryKnowledgeSource, KnowledgeIndex};
use foodlens::memory::{
    ConversationMemory, InMemoryMessageStore, RecencySemanticBlend, RetrievalPlan,
};
use foodlens::pipeline::{DEFAULT_LANGUAGE, ExplanationPipeline};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const USAGE: &str =
    "usage: foodlens analyze [--lang CODE] | foodlens chat [--session ID] [--lang CODE]";

const ANALYZE_PREFIX: &str = "/analyze";

enum Command {
    Analyze { language: String },
    Chat {
        session_id: String,
        language: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let command = parse_args(std::env::args().skip(1))?;

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(
        knowledge_dir = %config.knowledge_dir.display(),
        model = %config.generation_model,
        "FoodLens starting"
    );

    let embedder = build_index_embedder(&config)?;
    let source = DirectoryKnowledgeSource::new(config.knowledge_dir.clone());
    let index = Arc::new(
        KnowledgeIndex::build(&source, embedder.clone())
            .await
            .context("failed to build knowledge index")?,
    );
    if index.is_empty() {
        tracing::warn!("Knowledge index is empty; every analysis will report none_matched");
    }

    let completion = Arc::new(GenaiCompletion::new(config.generation_model.clone()));

    match command {
        Command::Analyze { language } => {
            let pipeline = ExplanationPipeline::from_config(&config, index, completion);

            let mut raw_text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw_text)
                .await
                .context("failed to read label text from stdin")?;

            let outcome = pipeline.analyze(&raw_text, &language).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Chat {
            session_id,
            language,
        } => {
            let message_embedder = build_message_embedder(&config, embedder)?;
            let memory = Arc::new(
                ConversationMemory::new(
                    Arc::new(InMemoryMessageStore::new()),
                    message_embedder,
                    index.clone(),
                )
                .with_policy(Arc::new(RecencySemanticBlend::new(RetrievalPlan::from(
                    &config,
                )))),
            );
            let pipeline = ExplanationPipeline::from_config(&config, index, completion.clone())
                .with_memory(memory.clone());
            let engine = ChatEngine::new(memory, completion)
                .with_temperature(config.temperature)
                .with_timeout(config.generation_timeout);

            run_chat(&engine, &pipeline, &session_id, &language).await?;
        }
    }

    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    let Some(mode) = args.next() else {
        bail!(USAGE);
    };
    let rest: Vec<String> = args.collect();
    let flag = |name: &str| {
        rest.iter()
            .position(|a| a == name)
            .and_then(|i| rest.get(i + 1))
            .cloned()
    };

    match mode.as_str() {
        "analyze" => Ok(Command::Analyze {
            language: flag("--lang").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        }),
        "chat" => Ok(Command::Chat {
            session_id: flag("--session").unwrap_or_else(|| Uuid::new_v4().to_string()),
            language: flag("--lang").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        }),
        other => bail!("unknown command '{other}'\n{USAGE}"),
    }
}

fn build_index_embedder(config: &Config) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let base: Arc<dyn EmbeddingProvider> = if let Some(path) = &config.embedding_model_path {
        Arc::new(BertEmbedder::load(BertEmbedderConfig::new(path.clone()))?)
    } else {
        tracing::warn!(
            "No FOODLENS_EMBEDDING_MODEL_PATH configured, using the hashed lexical embedder"
        );
        Arc::new(HashedEmbedder::new(config.embedding_dim)?)
    };
    Ok(Arc::new(CachedEmbedder::with_capacity(
        base,
        config.embedding_cache_capacity,
    )))
}

fn build_message_embedder(
    config: &Config,
    fallback: Arc<dyn EmbeddingProvider>,
) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let Some(url) = &config.message_embedding_url else {
        return Ok(fallback);
    };
    let remote = RemoteEmbedder::new(
        RemoteEmbedderConfig::new(url.clone())
            .with_model(config.message_embedding_model.clone())
            .with_api_key(config.api_key.clone()),
    )?;
    Ok(Arc::new(remote))
}

async fn run_chat(
    engine: &ChatEngine,
    pipeline: &ExplanationPipeline,
    session_id: &str,
    language: &str,
) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(
            format!(
                "session {session_id}, '{ANALYZE_PREFIX} <label text>' to explain a label, 'exit' to quit\n> "
            )
            .as_bytes(),
        )
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "exit" || line == "quit" {
            break;
        }
        if let Some(label) = line.strip_prefix(ANALYZE_PREFIX) {
            let outcome = pipeline
                .analyze_in_session(session_id, label, language)
                .await;
            stdout
                .write_all(format!("{}\n", outcome.to_chat_markdown(language)).as_bytes())
                .await?;
        } else if !line.is_empty() {
            match engine.turn(session_id, line).await {
                Ok(reply) => stdout.write_all(format!("{}\n", reply.reply).as_bytes()).await?,
                Err(e) => {
                    tracing::error!(error = %e, "Chat turn failed");
                    stdout.write_all(format!("[error] {e}\n").as_bytes()).await?;
                }
            }
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }

    Ok(())
}
