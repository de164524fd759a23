//! GitPages - A Git-backed Versioned Page Store
//!
//! This is the main entry point for the GitPages command-line interface.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use gitpages::store::{Author, CommitMeta, Document, GitStore, PageStore};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    // Parse simple command line args.
    let mut path = PathBuf::from(".gitpages");
    let mut rest: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-d" | "--dir" => {
                i += 1;
                if i < args.len() {
                    path = PathBuf::from(&args[i]);
                }
            }
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "--version" => {
                println!("GitPages v0.1.0");
                return ExitCode::SUCCESS;
            }
            arg => rest.push(arg.to_string()),
        }
        i += 1;
    }

    if rest.is_empty() {
        print_help();
        return ExitCode::FAILURE;
    }

    // Open store.
    let store = match GitStore::open_or_init(&path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error opening store: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let pages = PageStore::new(store);

    let command = rest.remove(0);
    match run_command(&pages, &command, rest) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_command(
    pages: &PageStore,
    command: &str,
    args: Vec<String>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        "get" => {
            let page = positional(&args, 0, "get <page>")?;
            let doc = pages.get_page(page)?;
            print!("{}", doc.content);
            Ok(ExitCode::SUCCESS)
        }
        "save" => {
            let page = positional(&args, 0, "save <page>")?;
            let meta = commit_meta(&args)?;
            let mut doc = Document::new(read_stdin()?);
            if let Some(title) = flag_value(&args, "--title") {
                doc = doc.with_title(title);
            }
            let id = pages.save_page(page, &doc, &meta)?;
            println!("{}", id.short());
            Ok(ExitCode::SUCCESS)
        }
        "exists" => {
            let page = positional(&args, 0, "exists <page>")?;
            if pages.has_page(page) {
                println!("true");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("false");
                Ok(ExitCode::FAILURE)
            }
        }
        "history" => {
            let page = positional(&args, 0, "history <page>")?;
            let limit = flag_value(&args, "-n").map(|n| n.parse()).transpose()?;
            for commit in pages.page_history(page, limit)? {
                println!(
                    "{}  {}  {} <{}>  {}",
                    commit.id.short(),
                    commit.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    commit.author_name,
                    commit.author_email,
                    commit.summary()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        "mkdir" => {
            let dir = positional(&args, 0, "mkdir <path>")?;
            pages.create_page_dir(dir)?;
            Ok(ExitCode::SUCCESS)
        }
        "cat" => {
            let path = positional(&args, 0, "cat <path>")?;
            let data = pages.get_raw(path)?;
            use std::io::Write;
            std::io::stdout().write_all(&data)?;
            Ok(ExitCode::SUCCESS)
        }
        "write" => {
            let path = positional(&args, 0, "write <path>")?;
            let meta = commit_meta(&args)?;
            let mut data = Vec::new();
            std::io::stdin().read_to_end(&mut data)?;
            let id = pages.save_raw(path, &data, &meta)?;
            println!("{}", id.short());
            Ok(ExitCode::SUCCESS)
        }
        unknown => {
            eprintln!("Unknown command: {}", unknown);
            print_help();
            Ok(ExitCode::FAILURE)
        }
    }
}

fn positional<'a>(args: &'a [String], index: usize, usage: &str) -> Result<&'a str, String> {
    args.iter()
        .filter(|a| !a.starts_with('-'))
        .nth(index)
        .map(|s| s.as_str())
        .ok_or_else(|| format!("usage: gitpages {}", usage))
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn commit_meta(args: &[String]) -> Result<CommitMeta, String> {
    let message = flag_value(args, "-m").ok_or("missing -m <message>")?;
    let username = flag_value(args, "-a").ok_or("missing -a <username>")?;
    let email = flag_value(args, "-e").ok_or("missing -e <email>")?;
    Ok(CommitMeta::new(message, Author::new(username, email)))
}

fn read_stdin() -> std::io::Result<String> {
    let mut content = String::new();
    std::io::stdin().read_to_string(&mut content)?;
    Ok(content)
}

fn print_help() {
    println!("GitPages - A Git-backed Versioned Page Store");
    println!();
    println!("Usage: gitpages [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("Options:");
    println!("  -d, --dir PATH         Path to the store directory (default: .gitpages)");
    println!("  -h, --help             Show this help message");
    println!("  --version              Show version");
    println!();
    println!("Commands:");
    println!("  get <page>                            Print a page's content");
    println!("  save <page> -m MSG -a USER -e EMAIL   Save a page from stdin (optional --title)");
    println!("  exists <page>                         Check whether a page exists");
    println!("  history <page> [-n LIMIT]             Commits that touched a page, newest first");
    println!("  mkdir <path>                          Create a page directory");
    println!("  cat <path>                            Print a raw file (repository-relative)");
    println!("  write <path> -m MSG -a USER -e EMAIL  Write a raw file from stdin");
    println!();
    println!("Examples:");
    println!("  echo 'Hello' | gitpages save intro -m 'init' -a bob -e bob@x.com");
    println!("  gitpages get intro");
    println!("  gitpages history intro");
}
