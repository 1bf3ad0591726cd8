//! tyrantkv CLI Client
//!
//! Command-line interface for talking to a Tokyo Tyrant server.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use tyrantkv::{Client, Config, DEFAULT_PORT};

/// tyrantkv CLI
#[derive(Parser, Debug)]
#[command(name = "tyrantkv-cli")]
#[command(about = "CLI for Tokyo Tyrant servers")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Socket read/write timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "0")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get { key: String },

    /// Set a key-value pair
    Put { key: String, value: String },

    /// Set a key-value pair only if the key is absent
    Putkeep { key: String, value: String },

    /// Append to a value
    Putcat {
        key: String,
        value: String,

        /// Keep only the last WIDTH bytes after appending
        #[arg(short, long)]
        width: Option<u32>,
    },

    /// Delete a key
    Out { key: String },

    /// Print the size of a value
    Vsiz { key: String },

    /// Add to an integer counter
    Addint { key: String, num: i32 },

    /// Add to a floating-point counter
    Adddouble { key: String, num: f64 },

    /// List keys starting with a prefix
    Keys {
        prefix: String,

        /// Maximum number of keys
        #[arg(short, long, default_value = "100")]
        max: u32,
    },

    /// List every key
    List,

    /// Print the record count
    Rnum,

    /// Print the database size
    Size,

    /// Print server statistics
    Stat,

    /// Flush the database to disk
    Sync,

    /// Remove every record
    Vanish,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,tyrantkv=info"));

    fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();

    let args = Args::parse();

    let config = Config::builder()
        .host(&args.host)
        .port(args.port)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms)
        .build();

    let client = match Client::open(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", config.addr(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&client, args.command) {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = client.close() {
        tracing::warn!("Error closing connection: {}", e);
    }
}

fn run(client: &Client, command: Commands) -> tyrantkv::Result<()> {
    match command {
        Commands::Get { key } => print_bytes(&client.get(key.as_bytes())?),
        Commands::Put { key, value } => client.put(key.as_bytes(), value.as_bytes())?,
        Commands::Putkeep { key, value } => client.putkeep(key.as_bytes(), value.as_bytes())?,
        Commands::Putcat { key, value, width } => match width {
            Some(width) => client.putshl(key.as_bytes(), value.as_bytes(), width)?,
            None => client.putcat(key.as_bytes(), value.as_bytes())?,
        },
        Commands::Out { key } => client.out(key.as_bytes())?,
        Commands::Vsiz { key } => println!("{}", client.vsiz(key.as_bytes())?),
        Commands::Addint { key, num } => println!("{}", client.addint(key.as_bytes(), num)?),
        Commands::Adddouble { key, num } => println!("{}", client.adddouble(key.as_bytes(), num)?),
        Commands::Keys { prefix, max } => {
            for key in client.fwmkeys(prefix.as_bytes(), max)? {
                print_bytes(&key);
            }
        }
        Commands::List => {
            client.iterinit()?;
            loop {
                match client.iternext() {
                    Ok(key) => print_bytes(&key),
                    Err(e) if e.is_protocol() => break,
                    Err(e) => return Err(e),
                }
            }
        }
        Commands::Rnum => println!("{}", client.rnum()?),
        Commands::Size => println!("{}", client.size()?),
        Commands::Stat => print!("{}", String::from_utf8_lossy(&client.stat()?)),
        Commands::Sync => client.sync()?,
        Commands::Vanish => client.vanish()?,
    }
    Ok(())
}

fn print_bytes(bytes: &[u8]) {
    println!("{}", String::from_utf8_lossy(bytes));
}
