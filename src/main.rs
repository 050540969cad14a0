use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};
use tmx_corpus::{BufferOutput, Config, CorpusError, FileOutput, TagMode};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("tmx2corpus")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract parallel corpora from TMX translation memories")
        .arg(
            Arg::new("paths")
                .help("TMX files or directories to scan")
                .required(true)
                .num_args(1..)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("JSON settings file; flags override its values")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Output directory (default: current directory)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .help("Output file name prefix (default: bitext)"),
        )
        .arg(
            Arg::new("extension")
                .long("extension")
                .help("Extension of documents picked up in directories (default: tmx)"),
        )
        .arg(
            Arg::new("lang")
                .long("lang")
                .short('l')
                .help("Only keep pairs in these languages; repeatable")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("tag-mode")
                .long("tag-mode")
                .help("Inline markup handling: strip or glom")
                .value_parser(clap::builder::PossibleValuesParser::new(["strip", "glom"])),
        )
        .arg(
            Arg::new("max-tokens")
                .long("max-tokens")
                .help("Drop pairs with more words than this on either side")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Convert in memory without writing any files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("summary")
                .long("summary")
                .help("Print the run summary as JSON on stdout")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("More logging; repeat for debug output")
                .action(ArgAction::Count),
        )
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Settings from `--config`, then flag overrides
fn load_config(matches: &ArgMatches) -> Result<Config, CorpusError> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(output) = matches.get_one::<PathBuf>("output") {
        config.output_dir = output.clone();
    }
    if let Some(prefix) = matches.get_one::<String>("prefix") {
        config.file_prefix = prefix.clone();
    }
    if let Some(extension) = matches.get_one::<String>("extension") {
        config.extension = extension.clone();
    }
    if let Some(languages) = matches.get_many::<String>("lang") {
        config.languages = Some(languages.cloned().collect());
    }
    if let Some(tag_mode) = matches.get_one::<String>("tag-mode") {
        config.tag_mode = tag_mode.parse::<TagMode>()?;
    }
    if let Some(max_tokens) = matches.get_one::<usize>("max-tokens") {
        config.max_tokens = Some(*max_tokens);
    }
    Ok(config)
}

fn run(matches: &ArgMatches) -> Result<bool, CorpusError> {
    let config = load_config(matches)?;
    let paths: Vec<PathBuf> = matches
        .get_many::<PathBuf>("paths")
        .map(|paths| paths.cloned().collect())
        .unwrap_or_default();

    let summary = if matches.get_flag("dry-run") {
        let mut output = BufferOutput::new();
        tmx_corpus::convert(&paths, &config, &mut output)?
    } else {
        let mut output = FileOutput::new(&config.output_dir).with_prefix(&config.file_prefix);
        tmx_corpus::convert(&paths, &config, &mut output)?
    };

    if matches.get_flag("summary") {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| CorpusError::Config(format!("could not serialize summary: {}", e)))?;
        println!("{}", json);
    }

    for path in &summary.failed_documents {
        error!("Failed: {}", path.display());
    }
    Ok(summary.failed_documents.is_empty())
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_logging(matches.get_count("verbose"));

    match run(&matches) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}
