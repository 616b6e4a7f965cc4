//! linsim host process.
//!
//! Boots the simulated host from its SQLite database, starts the network
//! listeners, and hands the terminal to the administrative console.

pub mod config;
pub mod console;
pub mod listeners;
pub mod logging;
pub mod seed;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use linsim_kernel::{load_tree, ContentProvider, Dispatcher, HostInfo, RecordStore, SqliteStore, Vfs};
use tracing::info;

use config::Config;
use console::Console;
use listeners::Listeners;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Boot, serve, and run the console until shutdown.
pub fn run(config: Config) -> Result<()> {
    let log_path = config.log_path()?;
    let mut out = io::stdout();

    let dispatcher = boot(&config, &mut out)?;

    writeln!(out, "Starting network services...")?;
    let listeners = Listeners::start(&config.services, Arc::clone(&dispatcher), |name| {
        println!("Starting {name} server...");
    });
    info!(listeners = listeners.len(), "network services started");
    writeln!(out, "linsim started successfully.")?;

    Console::new(dispatcher, config, log_path, listeners).run()
}

/// Open the configured database and build the dispatcher.
pub fn boot(config: &Config, out: &mut impl Write) -> Result<Arc<Dispatcher>> {
    writeln!(out, "Setting hostname...")?;
    let host = config.host_info();
    info!(hostname = %host.hostname, "host identity");

    writeln!(out, "Connecting to database...")?;
    let path = config.database_path()?;
    let store = SqliteStore::open(&path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    info!(database = %path.display(), "database opened");

    start(Arc::new(store), host, out)
}

/// Load the tree from `store`, seeding it first when empty.
pub fn start(store: Arc<SqliteStore>, host: HostInfo, out: &mut impl Write) -> Result<Arc<Dispatcher>> {
    if store.count().context("Failed to count filesystem rows")? == 0 {
        writeln!(out, "Database is empty, creating a minimal filesystem...")?;
        let rows = seed::seed(&store, &host)?;
        info!(rows, "seeded empty database");
    }

    writeln!(out, "Loading filesystem (this can take some time)...")?;
    let mut shown = 0;
    let tree = load_tree(store.as_ref(), |loaded, total| {
        let percent = loaded * 100 / total;
        if percent >= shown + 25 {
            shown = percent - percent % 25;
            let _ = writeln!(out, "  {shown}%");
        }
    })
    .context("Failed to load filesystem")?;
    writeln!(out, "{} entries detected.", tree.len())?;

    writeln!(out, "Populating commands...")?;
    let vfs = Arc::new(Vfs::new(tree, store.clone()));
    let dispatcher = Dispatcher::new(vfs, ContentProvider::new(store), host);
    writeln!(out, "{} commands available.", dispatcher.table().len())?;

    Ok(Arc::new(dispatcher))
}
