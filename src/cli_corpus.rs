use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rimas_generator::cli_style::{
    get_styles, print_banner, print_empty_list, print_key_value, print_key_value_highlight,
    print_list_item, print_section_footer, print_section_header, print_success, Table,
};
use rimas_generator::config::{AppConfig, CliConfig, FileConfig};
use rimas_generator::corpus::SqliteCorpusStore;
use rimas_generator::patterns::PatternExtractor;
use rimas_generator::search::{LyricRetriever, SqliteLyricRetriever, StyleTag};

const DEFAULT_SEARCH_LIMIT: usize = 10;
const DEFAULT_RHYME_LIMIT: usize = 50;
const PREVIEW_CHARS: usize = 60;

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
    name = "cli-corpus",
    styles = get_styles(),
    version = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH")),
    about = "Lyric corpus administration"
)]
struct CliArgs {
    /// Path to the SQLite corpus database.
    #[clap(long, global = true, value_parser = parse_path)]
    pub db: Option<PathBuf>,

    /// Path to a TOML configuration file.
    #[clap(long, global = true, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates (or rebuilds) the full-text index and its sync triggers.
    SetupFts,

    /// Imports a JSON array of lyrics in a single transaction.
    Import {
        #[clap(value_parser = parse_path)]
        file: PathBuf,
    },

    /// Shows corpus statistics.
    Stats,

    /// Searches the corpus the way the generation pipeline does.
    Search {
        #[clap(long)]
        tema: String,
        #[clap(long, value_enum)]
        estilo: StyleTag,
        #[clap(long)]
        contexto: Option<String>,
        #[clap(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },

    /// Looks up stored rhyme pairs containing a word.
    Rhymes {
        word: String,
        #[clap(long, default_value_t = DEFAULT_RHYME_LIMIT)]
        limit: usize,
    },

    /// Extracts keywords, rhymes, exemplars and meter for a theme.
    Analyze {
        #[clap(long)]
        tema: String,
        #[clap(long, value_enum)]
        estilo: StyleTag,
        #[clap(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut)
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialise logging")?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        db_path: cli_args.db.clone(),
        ..Default::default()
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
    }
    info!("Opening corpus at {:?}", config.db_path);
    let store = Arc::new(SqliteCorpusStore::new(
        &config.db_path,
        config.read_pool_size,
    )?);

    match cli_args.command {
        Command::SetupFts => {
            let indexed = store.setup_full_text_index()?;
            print_success(&format!("Full-text index ready, {} lyrics indexed", indexed));
        }

        Command::Import { file } => {
            let imported = store.import_file(&file)?;
            let stats = store.stats()?;
            print_success(&format!("Imported {} lyrics from {:?}", imported, file));
            print_key_value("Lyrics", &stats.lyrics.to_string());
            print_key_value("Rhyme pairs", &stats.rhymes.to_string());
            if !stats.full_text {
                print_list_item("Run `cli-corpus setup-fts` to enable ranked search", 1);
            }
        }

        Command::Stats => {
            print_banner("CORPUS");
            let detailed = store.detailed_stats()?;
            print_section_header("Totals");
            print_key_value("Lyrics", &detailed.totals.lyrics.to_string());
            print_key_value("Rhyme pairs", &detailed.totals.rhymes.to_string());
            print_key_value("Artists", &detailed.totals.artists.to_string());
            print_key_value(
                "Full-text index",
                if detailed.totals.full_text { "yes" } else { "no" },
            );
            if let Some(quality) = detailed.average_quality {
                print_key_value("Average quality", &format!("{:.2}", quality));
            }
            print_section_footer();

            if detailed.by_style.is_empty() {
                print_empty_list("No lyrics imported yet");
            } else {
                let mut table = Table::new(&["Style", "Lyrics"]);
                for (style, count) in &detailed.by_style {
                    let count = count.to_string();
                    table.push(&[style.as_str(), count.as_str()]);
                }
                table.print();
            }
        }

        Command::Search {
            tema,
            estilo,
            contexto,
            limit,
        } => {
            let retriever = SqliteLyricRetriever::new(store);
            let strategy = retriever.strategy()?;
            let lyrics = retriever.search(&tema, estilo, contexto.as_deref(), limit)?;
            print_key_value("Strategy", &format!("{:?}", strategy));
            if lyrics.is_empty() {
                print_empty_list("No lyrics found");
                return Ok(());
            }
            let mut table =
                Table::new(&["Id", "Title", "Artist", "Style", "Quality", "Rank", "Body"]);
            for lyric in &lyrics {
                let id = lyric.id.to_string();
                let quality = format!("{:.2}", lyric.quality);
                let rank = format!("{:.3}", lyric.rank);
                let body = preview(&lyric.body);
                table.push(&[
                    id.as_str(),
                    lyric.title.as_str(),
                    lyric.artist_or_unknown(),
                    lyric.style.as_str(),
                    quality.as_str(),
                    rank.as_str(),
                    body.as_str(),
                ]);
            }
            table.print();
        }

        Command::Rhymes { word, limit } => {
            let pairs = store.rhymes_for_word(&word, limit)?;
            if pairs.is_empty() {
                print_empty_list(&format!("No rhymes stored for {:?}", word));
                return Ok(());
            }
            let mut table = Table::new(&["Word", "Word", "Kind", "Score"]);
            for pair in &pairs {
                let score = format!("{:.2}", pair.score);
                table.push(&[
                    pair.word1.as_str(),
                    pair.word2.as_str(),
                    pair.kind.as_str(),
                    score.as_str(),
                ]);
            }
            table.print();
        }

        Command::Analyze {
            tema,
            estilo,
            limit,
        } => {
            let retriever = SqliteLyricRetriever::new(store);
            let lyrics = retriever.search(&tema, estilo, None, limit)?;
            if lyrics.is_empty() {
                print_empty_list("No lyrics found for this theme");
                return Ok(());
            }
            let mut patterns = PatternExtractor::new().extract(&lyrics, &tema);
            let ids: Vec<i64> = lyrics.iter().map(|l| l.id).collect();
            patterns.merge_rhyme_pairs(retriever.top_rhymes(&ids, 20)?);

            print_section_header(&format!("{} ({})", tema, estilo));
            print_key_value_highlight("Lyrics analysed", &lyrics.len().to_string());
            print_key_value("Keywords", &patterns.keywords.join(", "));
            print_key_value(
                "Meter",
                &patterns
                    .meter_profile
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            print_section_footer();

            if !patterns.rhyme_pairs.is_empty() {
                let mut table = Table::new(&["Word", "Word", "Kind", "Score"]);
                for pair in &patterns.rhyme_pairs {
                    let score = format!("{:.2}", pair.score);
                    table.push(&[
                        pair.word1.as_str(),
                        pair.word2.as_str(),
                        pair.kind.as_str(),
                        score.as_str(),
                    ]);
                }
                table.print();
            }

            print_section_header("Exemplars");
            if patterns.exemplars.is_empty() {
                print_empty_list("No four-line blocks found");
            }
            for exemplar in &patterns.exemplars {
                for line in exemplar.lines() {
                    print_list_item(line, 1);
                }
                println!();
            }
            print_section_footer();
        }
    }

    Ok(())
}
