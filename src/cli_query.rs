use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli_style;

use atris_resolver::catalog::load_catalog;
use atris_resolver::config::{self, AppConfig};
use atris_resolver::nodes::directory_for;
use atris_resolver::resolver::{FormattedResponse, QueryPlan, Resolver, RouteLabel};
use cli_style::*;

use rustyline::{
    completion::Completer, highlight::Highlighter, hint::Hinter, history::FileHistory,
    validate::Validator, CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles=get_styles())]
struct CliArgs {
    /// Path to a TOML configuration file.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// JSON file replacing the built-in endpoint catalog.
    #[clap(long, value_parser = parse_path)]
    pub catalog: Option<PathBuf>,

    /// URL of the discovery node directory.
    #[clap(long)]
    pub directory_url: Option<String>,

    /// Pin the node pool to these hosts and skip the directory. Can be repeated.
    #[clap(long = "node")]
    pub nodes: Vec<String>,

    /// Print classification, route and parameters before each answer.
    #[clap(long)]
    pub explain: bool,

    /// Resolve a single query and exit instead of starting the prompt.
    #[clap(short, long)]
    pub query: Option<String>,
}

const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: ":explain",
        args: "",
        description: "Toggle printing the plan before each answer",
    },
    CommandHelp {
        name: ":plan",
        args: "<query>",
        description: "Show the plan for a query without calling any node",
    },
    CommandHelp {
        name: ":nodes",
        args: "",
        description: "List the discovery nodes in the pool",
    },
    CommandHelp {
        name: ":refresh",
        args: "",
        description: "Fetch the node list from the directory again",
    },
    CommandHelp {
        name: ":endpoints",
        args: "",
        description: "List the catalog endpoints",
    },
    CommandHelp {
        name: ":help",
        args: "",
        description: "Show this help",
    },
    CommandHelp {
        name: ":exit",
        args: "",
        description: "Close this program",
    },
];

enum CommandExecutionResult {
    Ok,
    Exit,
}

struct Session {
    resolver: Resolver,
    runtime: tokio::runtime::Runtime,
    explain: bool,
}

impl Session {
    fn execute_line(&mut self, line: &str) -> CommandExecutionResult {
        let line = line.trim();
        if line.is_empty() {
            return CommandExecutionResult::Ok;
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            ":exit" | ":quit" => return CommandExecutionResult::Exit,
            ":help" => print_help(COMMANDS),
            ":explain" => {
                self.explain = !self.explain;
                print_info(&format!(
                    "Explain mode {}",
                    if self.explain { "on" } else { "off" }
                ));
            }
            ":plan" if rest.is_empty() => print_warning("Usage: :plan <query>"),
            ":plan" => self.print_plan(rest),
            ":nodes" => {
                let hosts = self
                    .runtime
                    .block_on(self.resolver.executor().pool().hosts());
                print_section_header("Discovery Nodes");
                if hosts.is_empty() {
                    print_empty_list("No nodes available");
                }
                for host in hosts {
                    print_list_item(&host, 1);
                }
                print_section_footer();
            }
            ":refresh" => {
                match self
                    .runtime
                    .block_on(self.resolver.executor().pool().refresh())
                {
                    Ok(count) => print_success(&format!("Node pool refreshed, {} nodes", count)),
                    Err(err) => print_error(&format!("Refresh failed: {:#}", err)),
                }
            }
            ":endpoints" => {
                print_section_header("Catalog Endpoints");
                for endpoint in self.resolver.catalog().endpoints() {
                    print_key_value(&endpoint.category_name, &endpoint.api_name);
                }
                print_section_footer();
            }
            other if other.starts_with(':') => {
                print_error(&format!("Unknown command {}, try :help", other))
            }
            _ => {
                if self.explain {
                    self.print_plan(line);
                }
                let response = self.runtime.block_on(self.resolver.answer(line));
                print_response(&response);
            }
        }
        flush();
        CommandExecutionResult::Ok
    }

    fn print_plan(&self, query: &str) {
        let classification = self.resolver.classify(query);
        print_section_header("Plan");
        print_key_value("Type", &format!("{:?}", classification.query_type));
        print_key_value(
            "Entity",
            &classification
                .entity_type
                .map(|e| format!("{:?}", e))
                .unwrap_or_else(|| "-".to_string()),
        );
        print_key_value("Complexity", &format!("{:?}", classification.complexity));
        print_key_value("Categories", &classification.categories.join(", "));
        if let Some(name) = &classification.named_entity {
            print_key_value("Name", name);
        }
        if let Some(genre) = &classification.genre {
            print_key_value("Genre", genre);
        }

        match self.resolver.plan(query) {
            Ok(plan) => print_route(&plan),
            Err(err) => print_warning(&format!("{} ({})", err, err.kind())),
        }
        print_section_footer();
    }
}

fn route_name(route: &RouteLabel) -> String {
    match route {
        RouteLabel::CatalogCall { endpoint } => endpoint.clone(),
        RouteLabel::ArtistAggregate => "artist popularity ranking".to_string(),
        RouteLabel::GenreAggregate => "genre popularity ranking".to_string(),
    }
}

fn print_route(plan: &QueryPlan) {
    print_key_value_highlight("Route", &route_name(&plan.route));
    if let Some(parameters) = &plan.parameters {
        for (name, value) in parameters.iter() {
            print_list_item(&format!("{} = {}", name, value), 1);
        }
    }
}

fn print_response(response: &FormattedResponse) {
    println!();
    if response.route.is_none() {
        print_warning(&response.answer);
        println!();
    } else {
        print_answer(&response.answer);
    }
}

struct QueryHelper {
    commands_names: Vec<&'static str>,
}

impl QueryHelper {
    fn new() -> Self {
        QueryHelper {
            commands_names: COMMANDS.iter().map(|c| c.name).collect(),
        }
    }
}

impl Completer for QueryHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if !line.starts_with(':') || line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Hinter for QueryHelper {
    type Hint = String;
}
impl Highlighter for QueryHelper {}
impl Validator for QueryHelper {}
impl Helper for QueryHelper {}

fn build_session(cli_args: &CliArgs) -> Result<Session> {
    let file_config = match &cli_args.config {
        Some(path) => Some(config::FileConfig::load(path)?),
        None => None,
    };
    let cli_config = config::CliConfig {
        catalog_path: cli_args.catalog.clone(),
        directory_url: cli_args.directory_url.clone(),
        ..Default::default()
    };
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let catalog = load_catalog(app_config.catalog_path.as_ref())?;
    let directory = directory_for(&app_config.directory, cli_args.nodes.clone())?;
    let resolver = Resolver::from_config(&app_config, catalog, directory)?;

    Ok(Session {
        resolver,
        runtime,
        explain: cli_args.explain,
    })
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
        .context("Failed to initialize logging")?;

    let mut session = build_session(&cli_args)?;

    if let Some(query) = &cli_args.query {
        session.execute_line(query);
        return Ok(());
    }

    let node_source = if cli_args.nodes.is_empty() {
        "directory".to_string()
    } else {
        cli_args.nodes.join(", ")
    };
    print_welcome(&node_source, session.resolver.catalog().len());

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();
    let mut rl = Editor::<QueryHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(QueryHelper::new()));

    let prompt = get_prompt();
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match session.execute_line(&line) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => break,
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                print_error(&format!("Error: {:?}", e));
                break;
            }
        }
    }

    print_goodbye();
    Ok(())
}
