//! memex — command-line surface over the knowledge index.
//!
//! Reads the local checkout directly (no pull-before-read; sync is the
//! server's concern) and formats results for humans.

use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};
use dotenv::dotenv;

use memex_backend::config::{self, defaults, Config};
use memex_backend::github::{is_supported_image, GitHubClient, IMAGE_EXTENSIONS};
use memex_backend::kb::{search, EntryType, GitDocumentSource, KnowledgeBase};
use memex_backend::site;
use memex_backend::tools::builtin::{read_source, render_entry, source_filename};

#[derive(Parser)]
#[command(name = "memex", version, about = "Personal knowledge base CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ranked search over titles, tags, and summaries
    Search {
        query: String,
        #[arg(long, default_value_t = defaults::SEARCH_LIMIT)]
        limit: usize,
    },
    /// List entries, optionally filtered by type and/or tag
    List {
        #[arg(long = "type")]
        entry_type: Option<String>,
        #[arg(long)]
        tag: Option<String>,
    },
    /// Print one entry with its computed backlinks
    Read { path: String },
    /// Corpus statistics
    Stats,
    /// Upload image assets to the knowledge repo
    Upload {
        sources: Vec<String>,
        #[arg(long)]
        branch: Option<String>,
    },
    /// Build the viewer data snapshot
    BuildSite {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Local reads only: the CLI never pulls before serving
async fn open_kb(config: &Config) -> KnowledgeBase {
    let source = GitDocumentSource::new(config.knowledge_root.clone());
    match KnowledgeBase::open(Box::new(source), false).await {
        Ok(kb) => kb,
        Err(e) => {
            eprintln!("Failed to load knowledge base: {}", e);
            exit(1);
        }
    }
}

async fn cmd_search(config: &Config, query: &str, limit: usize) {
    let kb = open_kb(config).await;
    let snapshot = kb.snapshot();
    let results = search::search(&snapshot, query, limit);
    if results.is_empty() {
        println!("No results found.");
        return;
    }
    for r in results {
        println!("[{}] {}", r.entry.entry_type.as_ref(), r.entry.title);
        println!("  path: {}", r.entry.path);
        println!("  tags: {}", r.entry.tags.join(", "));
        println!("  summary: {}", r.entry.summary);
        println!("  score: {:.1}  backlinks: {}", r.score, r.backlink_count);
        println!();
    }
}

async fn cmd_list(config: &Config, entry_type: Option<&str>, tag: Option<&str>) {
    let type_filter = match entry_type {
        Some(raw) => match raw.parse::<EntryType>() {
            Ok(t) => Some(t),
            Err(_) => {
                eprintln!("Unknown entry type: {}", raw);
                exit(1);
            }
        },
        None => None,
    };

    let kb = open_kb(config).await;
    let snapshot = kb.snapshot();
    let entries = search::list(&snapshot, type_filter, tag);
    if entries.is_empty() {
        println!("No entries found.");
        return;
    }
    for e in entries {
        println!("[{}] {}", e.entry_type.as_ref(), e.title);
        println!("  path: {}", e.path);
        println!("  tags: {}", e.tags.join(", "));
        println!("  summary: {}", e.summary);
        println!(
            "  edges: {}  backlinks: {}",
            e.edges.len(),
            snapshot.backlink_count(&e.path)
        );
        println!();
    }
}

async fn cmd_read(config: &Config, path: &str) {
    let kb = open_kb(config).await;
    let snapshot = kb.snapshot();
    match render_entry(&snapshot, path) {
        Some(rendered) => println!("{}", rendered),
        None => {
            eprintln!("Entry not found: {}", path);
            exit(1);
        }
    }
}

async fn cmd_stats(config: &Config) {
    let kb = open_kb(config).await;
    println!("Entries: {}", kb.entry_count());
    println!("Edges: {}", kb.edge_count());

    // count-descending, name-ascending on ties
    let mut types: Vec<(String, usize)> = kb
        .type_counts()
        .into_iter()
        .map(|(t, c)| (t.as_ref().to_string(), c))
        .collect();
    types.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    println!("\nBy type:");
    for (t, c) in types {
        println!("  {}: {}", t, c);
    }

    let mut tags: Vec<(String, usize)> = kb.tag_counts().into_iter().collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    println!("\nBy tag:");
    for (t, c) in tags {
        println!("  {}: {}", t, c);
    }
}

async fn cmd_upload(config: &Config, sources: &[String], branch: Option<&str>) {
    let Some(token) = config::git_token() else {
        eprintln!("Error: MEMEX_GIT_TOKEN not configured");
        exit(1);
    };
    let (Some(owner), Some(repo)) = (config.github_owner.as_deref(), config.github_repo.as_deref())
    else {
        eprintln!("Error: GitHub repository not configured");
        exit(1);
    };

    let gh = match GitHubClient::new(&token, owner, repo) {
        Ok(gh) => gh,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    };

    let target_branch = branch.unwrap_or(config.default_branch.as_str());
    if branch.is_some() {
        if let Err(e) = gh.ensure_branch(target_branch, &config.default_branch).await {
            eprintln!("Error: {}", e);
            exit(1);
        }
    }

    for source in sources {
        let Some(filename) = source_filename(source) else {
            eprintln!("Skipping {}: cannot determine filename", source);
            continue;
        };
        if !is_supported_image(&filename) {
            eprintln!(
                "Skipping {}: unsupported type (supported: {})",
                filename,
                IMAGE_EXTENSIONS.join(", ")
            );
            continue;
        }
        let content = match read_source(source).await {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error fetching {}: {}", source, e);
                continue;
            }
        };

        let repo_path = format!("{}/{}", defaults::ASSETS_DIR, filename);
        match gh.upload_file(&repo_path, &content, target_branch, None).await {
            Ok(result) => println!("Uploaded: /{}  (branch: {})", result.path, result.branch),
            Err(e) => {
                eprintln!("Error: {}", e);
                exit(1);
            }
        }
    }
}

fn cmd_build_site(config: &Config, output: Option<PathBuf>) {
    let output = output.unwrap_or_else(|| config.viewer_dir().join("data.json"));
    match site::build(&config.knowledge_root, &output) {
        Ok(report) => println!(
            "Built {}: {} entries, {} edges ({} skipped)",
            output.display(),
            report.entries,
            report.edges,
            report.skipped
        ),
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Command::Search { query, limit } => cmd_search(&config, &query, limit).await,
        Command::List { entry_type, tag } => {
            cmd_list(&config, entry_type.as_deref(), tag.as_deref()).await
        }
        Command::Read { path } => cmd_read(&config, &path).await,
        Command::Stats => cmd_stats(&config).await,
        Command::Upload { sources, branch } => {
            cmd_upload(&config, &sources, branch.as_deref()).await
        }
        Command::BuildSite { output } => cmd_build_site(&config, output),
    }
}
