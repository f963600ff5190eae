use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rimas_generator::cli_style::{
    get_styles, print_banner, print_empty_list, print_error, print_info, print_key_value,
    print_key_value_highlight, print_list_item, print_score_bar, print_section_footer,
    print_section_header, print_success, print_verses, print_warning,
};
use rimas_generator::config::{AppConfig, CliConfig, FileConfig};
use rimas_generator::corpus::SqliteCorpusStore;
use rimas_generator::generation::{
    GenerationRequest, GenerationResult, Outcome, PipelineContext, RhymeGenerator,
};
use rimas_generator::llm::{create_provider, LlmProvider};
use rimas_generator::search::{SqliteLyricRetriever, StyleTag};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(
    name = "rimas",
    styles = get_styles(),
    version = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH")),
    about = "Generates four rap verses on a theme, grounded on a lyric corpus"
)]
struct CliArgs {
    /// Theme of the verses, e.g. "superação na quebrada".
    #[clap(long, required_unless_present = "stats")]
    pub tema: Option<String>,

    /// Rap style.
    #[clap(long, value_enum, required_unless_present = "stats")]
    pub estilo: Option<StyleTag>,

    /// Extra context that widens the corpus search.
    #[clap(long)]
    pub contexto: Option<String>,

    /// Print corpus statistics and service status, then exit.
    #[clap(long)]
    pub stats: bool,

    /// Path to the SQLite corpus database.
    #[clap(long, value_parser = parse_path)]
    pub db: Option<PathBuf>,

    /// Path to a TOML configuration file. Its values override CLI flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Maximum generation attempts.
    #[clap(long)]
    pub max_attempts: Option<u32>,

    /// Minimum score (0-10) for approval.
    #[clap(long)]
    pub min_score: Option<f64>,

    /// Print the result as JSON.
    #[clap(long)]
    pub json: bool,

    /// API key for OpenAI-compatible providers.
    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db.clone(),
            read_pool_size: None,
            max_attempts: self.max_attempts,
            min_score: self.min_score,
            openai_api_key: self.openai_api_key.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialise logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Opening corpus at {:?}...", config.db_path);
    let store = Arc::new(SqliteCorpusStore::new(
        &config.db_path,
        config.read_pool_size,
    )?);
    let validation = create_provider(&config.validation_provider)?;

    if cli_args.stats {
        return print_stats(&config, store, validation).await;
    }

    let (Some(tema), Some(estilo)) = (cli_args.tema.clone(), cli_args.estilo) else {
        // clap enforces both unless --stats is present
        anyhow::bail!("--tema and --estilo are required");
    };
    let mut request = GenerationRequest::new(tema, estilo);
    if let Some(contexto) = &cli_args.contexto {
        request = request.with_context(contexto.as_str());
    }

    let generation = create_provider(&config.generation_provider)?
        .context("generation_provider must not be \"none\"")?;
    let pipeline = build_pipeline(&config, store, generation, validation);

    if !cli_args.json {
        print_banner("GERADOR DE RIMAS");
        print_info(&format!(
            "Tema: {} | Estilo: {} ({})",
            request.theme,
            request.style,
            request.style.description()
        ));
    }

    match pipeline.generate(&request).await {
        Ok(result) => {
            if cli_args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
            Ok(())
        }
        Err(err) => {
            if cli_args.json {
                let payload = serde_json::json!({
                    "error": err.kind(),
                    "message": err.to_string(),
                    "hint": err.hint(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_error(&format!("{}: {}", err.kind(), err));
                print_info(err.hint());
            }
            std::process::exit(1);
        }
    }
}

fn build_pipeline(
    config: &AppConfig,
    store: Arc<SqliteCorpusStore>,
    generation: Arc<dyn LlmProvider>,
    validation: Option<Arc<dyn LlmProvider>>,
) -> RhymeGenerator {
    RhymeGenerator::new(
        PipelineContext {
            retriever: Arc::new(SqliteLyricRetriever::new(store)),
            generation,
            validation,
        },
        config.generator.clone(),
        config.pricing,
    )
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

async fn print_stats(
    config: &AppConfig,
    store: Arc<SqliteCorpusStore>,
    validation: Option<Arc<dyn LlmProvider>>,
) -> Result<()> {
    let detailed = store.detailed_stats()?;

    print_section_header("Corpus");
    print_key_value("Database", &config.db_path.display().to_string());
    print_key_value("Lyrics", &detailed.totals.lyrics.to_string());
    print_key_value("Rhyme pairs", &detailed.totals.rhymes.to_string());
    print_key_value("Artists", &detailed.totals.artists.to_string());
    print_key_value("Full-text index", yes_no(detailed.totals.full_text));
    if let Some(quality) = detailed.average_quality {
        print_key_value("Average quality", &format!("{:.2}", quality));
    }
    if detailed.by_style.is_empty() {
        print_empty_list("No lyrics imported yet");
    }
    for (style, count) in &detailed.by_style {
        print_list_item(&format!("{}: {}", style, count), 1);
    }
    print_section_footer();

    print_section_header("Services");
    match create_provider(&config.generation_provider) {
        Ok(Some(generation)) => {
            print_key_value(
                "Generation",
                &format!("{} ({})", generation.name(), generation.model()),
            );
            let pipeline = build_pipeline(config, store, generation, validation);
            let status = pipeline.service_status().await?;
            print_key_value("Corpus ready", yes_no(status.corpus_ready));
            print_key_value("Validator reachable", yes_no(status.validator_reachable));
        }
        Ok(None) => print_warning("Generation provider disabled"),
        Err(e) => {
            print_warning(&format!("Generation provider not configured: {:#}", e));
            let reachable = match &validation {
                Some(provider) => provider.health_check().await.is_ok(),
                None => false,
            };
            print_key_value("Corpus ready", yes_no(detailed.totals.lyrics > 0));
            print_key_value("Validator reachable", yes_no(reachable));
        }
    }
    print_section_footer();
    Ok(())
}

fn print_result(result: &GenerationResult) {
    println!();
    print_verses(&result.verses);
    println!();

    match result.outcome {
        Outcome::Approved => print_success(&format!(
            "Approved on attempt {} of {}",
            result.best_attempt, result.attempts
        )),
        Outcome::Exhausted => print_warning(&format!(
            "Not approved after {} attempts, showing attempt {}",
            result.attempts, result.best_attempt
        )),
    }

    print_section_header("Score");
    let criteria = &result.validation.criteria;
    print_score_bar("Rhyme", criteria.rhyme);
    print_score_bar("Meter", criteria.meter);
    print_score_bar("Coherence", criteria.coherence);
    print_score_bar("Originality", criteria.originality);
    print_score_bar("Total", result.score);
    print_key_value("Feedback", &result.validation.feedback);
    for problem in &result.validation.problems {
        print_list_item(problem, 1);
    }
    print_section_footer();

    print_section_header("Inspiration");
    if result.inspiration.is_empty() {
        print_empty_list("No reference lyrics");
    }
    for lyric in &result.inspiration {
        print_list_item(
            &format!("{} - {}", lyric.title, lyric.artist_or_unknown()),
            1,
        );
    }
    print_section_footer();

    print_key_value_highlight("Cost", &format!("R$ {:.4}", result.cost.total_brl));
    print_key_value(
        "Tokens",
        &format!(
            "{} in / {} out",
            result.cost.input_tokens, result.cost.output_tokens
        ),
    );
    print_key_value("Elapsed", &format!("{} ms", result.elapsed_ms));
}
