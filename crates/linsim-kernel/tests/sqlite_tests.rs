//! A SQLite database survives a session's mutations and a restart.

use std::collections::HashMap;
use std::sync::Arc;

use linsim_kernel::store::{Content, SqliteStore};
use linsim_kernel::{load_tree, ContentProvider, Dispatcher, HostInfo, Vfs};
use linsim_testutil::standard_host;

fn seed(store: &SqliteStore) {
    let (records, contents) = standard_host().into_parts();
    let payloads: HashMap<_, _> = contents.into_iter().collect();
    for record in &records {
        let content = record
            .content_locator
            .and_then(|loc| payloads.get(&loc))
            .map(|bytes| Content::Binary(bytes));
        store.insert(record, content).unwrap();
    }
}

fn boot(store: Arc<SqliteStore>) -> Dispatcher {
    let mut steps = Vec::new();
    let tree = load_tree(store.as_ref(), |loaded, total| steps.push((loaded, total))).unwrap();
    assert!(!steps.is_empty());
    assert!(steps.iter().all(|(loaded, total)| loaded <= total));
    Dispatcher::new(
        Arc::new(Vfs::new(tree, store.clone())),
        ContentProvider::new(store),
        HostInfo::default(),
    )
}

fn run(dispatcher: &Dispatcher, user: &str, line: &[&str]) -> String {
    let mut ctx = dispatcher.open_context(user);
    let argv: Vec<String> = line.iter().map(|w| w.to_string()).collect();
    let result = dispatcher.execute(&mut ctx, &argv).unwrap();
    assert!(result.ok(), "{line:?}: {}", result.err);
    result.out
}

#[test]
fn mutations_persist_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("state").join("fs.db");

    {
        let store = Arc::new(SqliteStore::open(&db).unwrap());
        seed(&store);
        let host = boot(store);
        run(&host, "root", &["mkdir", "-p", "/srv/app/logs"]);
        run(&host, "root", &["mv", "/var/www/html", "/srv/app/public"]);
        run(&host, "root", &["ln", "/etc/motd", "/srv/motd"]);
        run(&host, "root", &["ln", "-s", "../etc/hosts", "/srv/hosts"]);
        run(&host, "root", &["touch", "/srv/app/logs/access.log"]);
        run(&host, "root", &["rm", "-r", "/var/log"]);
    }

    let store = Arc::new(SqliteStore::open(&db).unwrap());
    let host = boot(store);
    assert_eq!(run(&host, "root", &["ls", "/srv/app"]), "logs  public\n");
    assert_eq!(
        run(&host, "root", &["cat", "/srv/app/public/index.html"]),
        linsim_testutil::INDEX_HTML
    );
    assert_eq!(run(&host, "root", &["cat", "/srv/motd"]), "Welcome to Debian GNU/Linux.\n");
    assert_eq!(run(&host, "root", &["readlink", "/srv/hosts"]), "../etc/hosts\n");
    assert_eq!(run(&host, "root", &["cat", "/srv/app/logs/access.log"]), "");
    assert_eq!(run(&host, "root", &["ls", "/var"]), "www\n");

    let tree = host.vfs().read();
    let motd = tree.get("/etc/motd").unwrap();
    let linked = tree.get("/srv/motd").unwrap();
    assert_eq!(motd.inode, linked.inode);
    assert_eq!((motd.link_count, linked.link_count), (2, 2));
    assert!(tree.check_invariants().is_ok());
}

#[test]
fn new_inodes_do_not_collide_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("fs.db");
    {
        let store = Arc::new(SqliteStore::open(&db).unwrap());
        seed(&store);
        run(&boot(store), "root", &["touch", "/tmp/one"]);
    }
    let host = boot(Arc::new(SqliteStore::open(&db).unwrap()));
    run(&host, "root", &["touch", "/tmp/two"]);

    let tree = host.vfs().read();
    let one = tree.get("/tmp/one").unwrap().inode;
    let two = tree.get("/tmp/two").unwrap().inode;
    assert_ne!(one, two);
    assert!(tree.entries().filter(|e| e.inode == two).count() == 1);
}

#[test]
fn hard_link_keeps_content_after_original_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("fs.db");
    let motd = "Welcome to Debian GNU/Linux.\n";
    {
        let store = Arc::new(SqliteStore::open(&db).unwrap());
        seed(&store);
        let host = boot(store);
        run(&host, "root", &["ln", "/etc/motd", "/tmp/m"]);
        run(&host, "root", &["rm", "/etc/motd"]);
        assert_eq!(run(&host, "root", &["cat", "/tmp/m"]), motd);

        run(&host, "root", &["ln", "/etc/hosts", "/tmp/h"]);
        let hosts = run(&host, "root", &["cat", "/etc/hosts"]);
        run(&host, "root", &["mv", "/tmp/m", "/etc/hosts"]);
        assert_eq!(run(&host, "root", &["cat", "/tmp/h"]), hosts);
        assert_eq!(run(&host, "root", &["cat", "/etc/hosts"]), motd);
    }

    let host = boot(Arc::new(SqliteStore::open(&db).unwrap()));
    assert_eq!(run(&host, "root", &["cat", "/etc/hosts"]), motd);
    assert!(run(&host, "root", &["cat", "/tmp/h"]).contains("localhost"));
    let tree = host.vfs().read();
    assert_eq!(tree.get("/tmp/h").unwrap().link_count, 1);
    assert!(tree.get("/etc/motd").is_none());
}
