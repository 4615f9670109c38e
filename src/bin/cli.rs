//! Interactive client
//!
//! Commands map 1:1 to the coordinator protocol:
//! `PUT <path>`, `GET <name> <dest>`, `LS`, `RM <name>`, `exit`.

use anyhow::Result;
use clap::Parser;
use minidfs::client::Client;
use std::io::{BufRead, Write};
use std::path::Path;

#[derive(Parser)]
#[command(name = "minidfs")]
#[command(about = "minidfs interactive client")]
#[command(version)]
struct Cli {
    /// Coordinator address
    #[arg(long, default_value = "127.0.0.1:12345")]
    coordinator: String,

    /// Buffer size for relaying byte streams
    #[arg(long, default_value = "1024")]
    chunk_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let client = Client::new(cli.coordinator, cli.chunk_size);

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("minidfs> ");
        std::io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts.as_slice() {
            [] => {}
            [cmd] if cmd.eq_ignore_ascii_case("exit") || cmd.eq_ignore_ascii_case("quit") => break,
            [cmd, path] if cmd.eq_ignore_ascii_case("put") => {
                match client.put(Path::new(path)).await {
                    Ok((name, size)) => println!("stored {} ({} bytes)", name, size),
                    Err(e) => eprintln!("PUT failed: {}", e),
                }
            }
            [cmd, name, dest] if cmd.eq_ignore_ascii_case("get") => {
                match client.get(name, Path::new(dest)).await {
                    Ok((path, size)) => println!("fetched {} bytes into {}", size, path.display()),
                    Err(e) => eprintln!("GET failed: {}", e),
                }
            }
            [cmd] if cmd.eq_ignore_ascii_case("ls") => match client.list().await {
                Ok(names) if names.is_empty() => println!("no files"),
                Ok(mut names) => {
                    names.sort();
                    for name in names {
                        println!("{}", name);
                    }
                }
                Err(e) => eprintln!("LS failed: {}", e),
            },
            [cmd, name] if cmd.eq_ignore_ascii_case("rm") => match client.remove(name).await {
                Ok(()) => println!("deleted {}", name),
                Err(e) => eprintln!("RM failed: {}", e),
            },
            _ => {
                println!("commands: PUT <path> | GET <name> <dest> | LS | RM <name> | exit");
            }
        }
    }

    Ok(())
}
