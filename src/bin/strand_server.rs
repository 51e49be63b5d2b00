//! Strand Server Binary
//!
//! Single-threaded readiness-driven TCP server. Accepts any number of
//! concurrent connections on one thread and answers each complete request
//! with the fixed response.
//!
//! Usage:
//!   cargo run --release --bin strand_server [OPTIONS]

use std::io;
use std::net::SocketAddr;

use strand::{Server, ServerConfig};

struct Args {
    bind_addr: String,
    config: ServerConfig,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            config: ServerConfig::default(),
        }
    }
}

fn run_server(args: Args) -> io::Result<()> {
    let addr: SocketAddr = args.bind_addr.parse().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid bind address '{}': {}", args.bind_addr, e),
        )
    })?;

    let mut server = Server::bind(addr, args.config)?;

    println!("🚀 Strand Server");
    println!("🔌 Listening on {}", server.local_addr()?);
    println!("⚡ Single thread, one-shot readiness events\n");

    server.run()
}

fn parse_args() -> Args {
    let argv: Vec<String> = std::env::args().collect();
    let mut args = Args::default();

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--bind" | "-b" => {
                if i + 1 < argv.len() {
                    args.bind_addr = argv[i + 1].clone();
                    i += 1;
                }
            }
            "--events" => {
                if i + 1 < argv.len() {
                    args.config.event_capacity = argv[i + 1].parse().unwrap_or(1024);
                    i += 1;
                }
            }
            "--max-conns" => {
                if i + 1 < argv.len() {
                    args.config.max_connections = argv[i + 1].parse().unwrap_or(1024);
                    i += 1;
                }
            }
            "--verbose" | "-v" => {
                args.config.verbose = true;
            }
            "--help" | "-h" => {
                println!("Strand Server - single-threaded readiness-driven TCP server\n");
                println!("Usage: strand_server [OPTIONS]\n");
                println!("Options:");
                println!("  -b, --bind <ADDR>    Bind address (default: 127.0.0.1:8000)");
                println!("      --events <N>     Event batch capacity (default: 1024)");
                println!("      --max-conns <N>  Connection cap (default: 1024)");
                println!("  -v, --verbose        Per-connection logging and periodic stats");
                println!("  -h, --help           Show this help");
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    args
}

fn main() {
    let args = parse_args();

    if let Err(e) = run_server(args) {
        eprintln!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}
