use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use practice_core::{CategoryId, DifficultyFilter, SetId};
use services::{
    ApiClient, ApiConfig, DatasetService, DocumentFetcher, InMemoryHistory, NavOutcome, Navigator,
    SelectionEngine, SetDiscovery,
};
use storage::{InMemorySessionStore, SessionProgressStore};

use crate::console::ConsoleView;
use crate::local::{DirDiscovery, LocalFetcher};

mod console;
mod local;
mod telemetry;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidSet { raw: String },
    InvalidIndex { raw: String },
    InvalidCategory { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required for this command"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSet { raw } => write!(f, "invalid --set value: {raw}"),
            ArgsError::InvalidIndex { raw } => write!(f, "invalid --index value: {raw}"),
            ArgsError::InvalidCategory { raw } => write!(f, "invalid --category value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- list      [--data-dir <dir>]");
    eprintln!("  cargo run -p app -- open      --set <id> [--index <n>]");
    eprintln!("  cargo run -p app -- random    --category <n> [--difficulty <grade>]");
    eprintln!("  cargo run -p app -- judge     --set <id> --index <n> --file <path> [--output <path>]");
    eprintln!("  cargo run -p app -- hint      --problem <id> --file <path>");
    eprintln!("  cargo run -p app -- solution  --problem <id>");
    eprintln!("  cargo run -p app -- translate --text <text> [--from <lang>] [--to <lang>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --data-dir data");
    eprintln!("  --difficulty any");
    eprintln!("  --from en, --to zh-TW");
    eprintln!("  --api-url overrides PRACTICE_API_URL for the backend commands");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PRACTICE_DATA_DIR, PRACTICE_API_URL, LOG_LEVEL, LOG_FORMAT");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    List,
    Open,
    Random,
    Judge,
    Hint,
    Solution,
    Translate,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "list" => Some(Self::List),
            "open" => Some(Self::Open),
            "random" => Some(Self::Random),
            "judge" => Some(Self::Judge),
            "hint" => Some(Self::Hint),
            "solution" => Some(Self::Solution),
            "translate" => Some(Self::Translate),
            _ => None,
        }
    }
}

struct Args {
    data_dir: PathBuf,
    api_url: Option<String>,
    set: Option<SetId>,
    index: Option<usize>,
    category: Option<CategoryId>,
    difficulty: DifficultyFilter,
    problem: Option<String>,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
    text: Option<String>,
    source_lang: String,
    target_lang: String,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            data_dir: std::env::var("PRACTICE_DATA_DIR")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map_or_else(|| PathBuf::from("data"), PathBuf::from),
            api_url: None,
            set: None,
            index: None,
            category: None,
            difficulty: DifficultyFilter::Any,
            problem: None,
            file: None,
            output: None,
            text: None,
            source_lang: "en".into(),
            target_lang: "zh-TW".into(),
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data-dir" => {
                    parsed.data_dir = PathBuf::from(require_value(args, "--data-dir")?);
                }
                "--api-url" => parsed.api_url = Some(require_value(args, "--api-url")?),
                "--set" => {
                    let value = require_value(args, "--set")?;
                    let id = SetId::new(value.as_str())
                        .map_err(|_| ArgsError::InvalidSet { raw: value.clone() })?;
                    parsed.set = Some(id);
                }
                "--index" => {
                    let value = require_value(args, "--index")?;
                    let index: usize = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidIndex { raw: value.clone() })?;
                    parsed.index = Some(index);
                }
                "--category" => {
                    let value = require_value(args, "--category")?;
                    let category: CategoryId = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidCategory { raw: value.clone() })?;
                    parsed.category = Some(category);
                }
                "--difficulty" => {
                    let value = require_value(args, "--difficulty")?;
                    parsed.difficulty = DifficultyFilter::from_label(&value);
                }
                "--problem" => parsed.problem = Some(require_value(args, "--problem")?),
                "--file" => parsed.file = Some(PathBuf::from(require_value(args, "--file")?)),
                "--output" => parsed.output = Some(PathBuf::from(require_value(args, "--output")?)),
                "--text" => parsed.text = Some(require_value(args, "--text")?),
                "--from" => parsed.source_lang = require_value(args, "--from")?,
                "--to" => parsed.target_lang = require_value(args, "--to")?,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn require_set(&self) -> Result<SetId, ArgsError> {
        self.set.clone().ok_or(ArgsError::MissingFlag { flag: "--set" })
    }

    fn require_index(&self) -> Result<usize, ArgsError> {
        self.index.ok_or(ArgsError::MissingFlag { flag: "--index" })
    }

    fn require_category(&self) -> Result<CategoryId, ArgsError> {
        self.category.ok_or(ArgsError::MissingFlag { flag: "--category" })
    }

    fn require_problem(&self) -> Result<&str, ArgsError> {
        self.problem
            .as_deref()
            .ok_or(ArgsError::MissingFlag { flag: "--problem" })
    }

    fn require_file(&self) -> Result<&PathBuf, ArgsError> {
        self.file
            .as_ref()
            .ok_or(ArgsError::MissingFlag { flag: "--file" })
    }

    fn require_text(&self) -> Result<&str, ArgsError> {
        self.text
            .as_deref()
            .ok_or(ArgsError::MissingFlag { flag: "--text" })
    }
}

fn build_navigator(data_dir: &std::path::Path) -> Arc<Navigator> {
    let fetcher: Arc<dyn DocumentFetcher> = Arc::new(LocalFetcher::new());
    let dataset = Arc::new(DatasetService::new(fetcher));
    let discovery: Arc<dyn SetDiscovery> = Arc::new(DirDiscovery::new(data_dir));
    let selection = Arc::new(SelectionEngine::new(
        Arc::clone(&dataset),
        Arc::clone(&discovery),
    ));
    let progress = SessionProgressStore::new(Arc::new(InMemorySessionStore::new()));
    Arc::new(Navigator::new(
        dataset,
        selection,
        discovery,
        progress,
        Arc::new(InMemoryHistory::new()),
        Arc::new(ConsoleView),
    ))
}

fn completed(op: &str, outcome: NavOutcome) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        NavOutcome::Completed => Ok(()),
        NavOutcome::Rejected => {
            Err(format!("{op} was rejected; check the set id and index").into())
        }
        NavOutcome::Superseded | NavOutcome::Failed => Err(format!("{op} failed").into()),
    }
}

fn api_client(args: &Args) -> ApiClient {
    match &args.api_url {
        Some(url) => ApiClient::new(Some(ApiConfig::new(url.clone()))),
        None => ApiClient::from_env(),
    }
}

async fn run_list(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let navigator = build_navigator(&args.data_dir);
    completed("list", navigator.init("").await)
}

async fn run_open(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let set = args.require_set()?;
    let navigator = build_navigator(&args.data_dir);
    completed("init", navigator.init("").await)?;
    completed("open", navigator.enter_set(&set).await)?;
    if let Some(index) = args.index {
        completed("open", navigator.switch_problem(&set, index).await)?;
    }
    Ok(())
}

async fn run_random(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let category = args.require_category()?;
    let navigator = build_navigator(&args.data_dir);
    completed("init", navigator.init("").await)?;
    completed("random", navigator.pick_random(category, args.difficulty).await)
}

async fn run_judge(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let set = args.require_set()?;
    let index = args.require_index()?;
    let code = tokio::fs::read_to_string(args.require_file()?).await?;
    let user_output = match &args.output {
        Some(path) => Some(tokio::fs::read_to_string(path).await?),
        None => None,
    };

    let verdict = api_client(args)
        .judge(&set, index, &code, user_output.as_deref())
        .await?;
    println!("verdict: {}", verdict.verdict);
    if let Some(log) = &verdict.log {
        println!();
        println!("{log}");
    }
    if let Some(suggestions) = &verdict.suggestions {
        println!();
        println!("suggestions:");
        println!("{suggestions}");
    }
    if !verdict.correct {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_hint(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let problem = args.require_problem()?;
    let code = tokio::fs::read_to_string(args.require_file()?).await?;
    let hint = api_client(args).hint(problem, &code).await?;
    println!("{hint}");
    Ok(())
}

async fn run_solution(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let problem = args.require_problem()?;
    let answer = api_client(args).answer(problem).await?;
    println!("{answer}");
    Ok(())
}

async fn run_translate(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let text = args.require_text()?;
    let translation = api_client(args)
        .translate(text, &args.source_lang, &args.target_lang)
        .await?;
    println!("{translation}");
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();

    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: list the menu when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::List,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::List,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    match cmd {
        Command::List => run_list(&args).await,
        Command::Open => run_open(&args).await,
        Command::Random => run_random(&args).await,
        Command::Judge => run_judge(&args).await,
        Command::Hint => run_hint(&args).await,
        Command::Solution => run_solution(&args).await,
        Command::Translate => run_translate(&args).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
