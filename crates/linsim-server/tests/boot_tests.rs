//! Startup from a database, fresh or populated.

use std::collections::HashMap;
use std::sync::Arc;

use linsim_kernel::store::{Content, SqliteStore};
use linsim_kernel::{HostInfo, Outcome, ShellSession};
use linsim_server::config::Config;
use linsim_testutil::standard_host;

fn populate(store: &SqliteStore) -> usize {
    let (records, contents) = standard_host().into_parts();
    let payloads: HashMap<_, _> = contents.into_iter().collect();
    for record in &records {
        let content = record
            .content_locator
            .and_then(|loc| payloads.get(&loc))
            .map(|bytes| Content::Binary(bytes));
        store.insert(record, content).unwrap();
    }
    records.len()
}

fn output(line: &str, session: &mut ShellSession) -> String {
    match session.handle_line(line) {
        Outcome::Completed(result) => result.out,
        other => panic!("{line}: {other:?}"),
    }
}

#[test]
fn empty_database_is_seeded() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let mut out = Vec::new();
    let dispatcher =
        linsim_server::start(store, HostInfo::new("mail.example.org"), &mut out).unwrap();
    let printed = String::from_utf8(out).unwrap();

    assert!(printed.starts_with("Database is empty, creating a minimal filesystem...\n"));
    assert!(printed.contains("Loading filesystem (this can take some time)...\n"));
    assert!(printed.contains("  100%\n"));
    assert!(printed.contains(&format!("{} entries detected.\n", dispatcher.vfs().len())));

    let mut session = ShellSession::login(dispatcher, "root");
    assert_eq!(output("cat /etc/hostname", &mut session), "mail\n");
    assert_eq!(output("hostname -f", &mut session), "mail.example.org\n");
    assert!(output("ls /", &mut session).contains("etc"));
}

#[test]
fn populated_database_is_loaded_as_is() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("fs.db");
    let rows = populate(&SqliteStore::open(&db).unwrap());

    let config = Config::parse(&format!(
        "hostname = \"web01.example.com\"\ndatabase = {:?}\n",
        db.display().to_string()
    ))
    .unwrap();
    let mut out = Vec::new();
    let dispatcher = linsim_server::boot(&config, &mut out).unwrap();
    let printed = String::from_utf8(out).unwrap();

    assert!(printed.starts_with("Setting hostname...\nConnecting to database...\nLoading filesystem"));
    assert!(!printed.contains("Database is empty"));
    assert!(printed.contains(&format!("{rows} entries detected.\n")));
    assert_eq!(dispatcher.vfs().len(), rows);

    let mut session = ShellSession::login(dispatcher, "alice");
    assert_eq!(session.prompt(), "alice@web01:~$ ");
    assert_eq!(output("cat notes.txt", &mut session), "buy milk\ncall bob\nBuy bread\n");
}

#[test]
fn bad_database_path_fails_boot() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "not a directory").unwrap();

    let mut config = Config::default();
    config.database = Some(blocker.join("fs.db"));
    let mut out = Vec::new();
    let err = linsim_server::boot(&config, &mut out).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to open database"));
}

#[test]
fn broken_tree_fails_boot() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    populate(&store);
    store
        .insert(&linsim_types::FsRecord::new("/orphan/child", linsim_types::EntryKind::Directory), None)
        .unwrap();

    let mut out = Vec::new();
    let err = linsim_server::start(store, HostInfo::default(), &mut out).unwrap_err();
    assert!(format!("{err:#}").starts_with("Failed to load filesystem"));
}
