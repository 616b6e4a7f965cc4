//! End-to-end behavior of sessions over a shared filesystem.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use linsim_kernel::shell::DispatchError;
use linsim_kernel::store::{ContentStore, MemoryStore, Mutation};
use linsim_kernel::types::{CollaboratorError, ContentLocator};
use linsim_kernel::{load_tree, ContentProvider, Dispatcher, HostInfo, Outcome, ShellSession, Vfs};
use linsim_testutil::standard_host;

fn host() -> (Arc<Dispatcher>, Arc<MemoryStore>) {
    let (records, contents) = standard_host().into_parts();
    let store = Arc::new(MemoryStore::from_parts(records, contents));
    let tree = load_tree(store.as_ref(), |_, _| {}).unwrap();
    let vfs = Arc::new(Vfs::new(tree, store.clone()));
    let dispatcher = Dispatcher::new(vfs, ContentProvider::new(store.clone()), HostInfo::new("web01"));
    (Arc::new(dispatcher), store)
}

fn argv(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

struct CountingStore {
    inner: MemoryStore,
    fetches: AtomicUsize,
}

impl ContentStore for CountingStore {
    fn fetch(&self, locator: ContentLocator) -> Result<Vec<u8>, CollaboratorError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(locator)
    }
}

#[test]
fn metadata_commands_never_touch_content() {
    let (records, contents) = standard_host().into_parts();
    let store = MemoryStore::from_parts(records, contents);
    let tree = load_tree(&store, |_, _| {}).unwrap();
    let counting = Arc::new(CountingStore {
        inner: store,
        fetches: AtomicUsize::new(0),
    });
    let dispatcher = Dispatcher::new(
        Arc::new(Vfs::detached(tree)),
        ContentProvider::new(counting.clone()),
        HostInfo::default(),
    );
    let mut ctx = dispatcher.open_context("root");
    counting.fetches.store(0, Ordering::SeqCst);

    let commands: [&[&str]; 4] = [&["ls", "-R", "/"], &["cd", "/var/www"], &["mkdir", "/tmp/x"], &["pwd"]];
    for words in commands {
        assert!(dispatcher.execute(&mut ctx, &argv(words)).unwrap().ok());
    }
    assert_eq!(counting.fetches.load(Ordering::SeqCst), 0);

    let cat = dispatcher.execute(&mut ctx, &argv(&["cat", "html/index.html", "html/index.html"])).unwrap();
    assert_eq!(cat.out, linsim_testutil::INDEX_HTML.repeat(2));
    assert_eq!(counting.fetches.load(Ordering::SeqCst), 2);
}

#[test]
fn broken_content_store_only_breaks_reads() {
    let (records, _) = standard_host().into_parts();
    let store = MemoryStore::from_parts(records, Vec::new());
    let tree = load_tree(&store, |_, _| {}).unwrap();
    let dispatcher = Dispatcher::new(
        Arc::new(Vfs::detached(tree)),
        ContentProvider::new(Arc::new(MemoryStore::unavailable("gone"))),
        HostInfo::default(),
    );
    let mut ctx = dispatcher.open_context("root");
    assert_eq!(ctx.cwd(), "/root");

    let ls = dispatcher.execute(&mut ctx, &argv(&["ls", "/etc"])).unwrap();
    assert!(ls.ok());
    let cat = dispatcher.execute(&mut ctx, &argv(&["cat", "/etc/motd"])).unwrap();
    assert_eq!(cat.code, 1);
    assert_eq!(cat.err, "cat: /etc/motd: Input/output error");
}

#[test]
fn failed_recursive_remove_leaves_tree_untouched() {
    let (dispatcher, store) = host();
    let before = dispatcher.vfs().read().edges();

    let mut alice = dispatcher.open_context("alice");
    let result = dispatcher.execute(&mut alice, &argv(&["rm", "-r", "/var/www"])).unwrap();
    assert_eq!(result.code, 1);
    assert_eq!(dispatcher.vfs().read().edges(), before);
    assert!(store.flushed().is_empty());

    let mut root = dispatcher.open_context("root");
    assert!(dispatcher.execute(&mut root, &argv(&["rm", "-r", "/var/www"])).unwrap().ok());
    assert_eq!(
        store.flushed(),
        vec![Mutation::Removed { path: "/var/www".into() }]
    );
    let tree = dispatcher.vfs().read();
    assert!(tree.entries().all(|e| !e.path.starts_with("/var/www")));
    assert!(tree.check_invariants().is_ok());
}

#[test]
fn unknown_command_is_a_dispatch_error() {
    let (dispatcher, _) = host();
    let mut ctx = dispatcher.open_context("root");
    assert_eq!(
        dispatcher.execute(&mut ctx, &argv(&["frobnicate", "-x"])).unwrap_err(),
        DispatchError::Unrecognized("frobnicate".into())
    );
    assert_eq!(dispatcher.execute(&mut ctx, &[]).unwrap_err(), DispatchError::Empty);
}

#[test]
fn working_directory_survives_its_own_removal() {
    let (dispatcher, _) = host();
    let mut ctx = dispatcher.open_context("root");
    dispatcher.execute(&mut ctx, &argv(&["cd", "/var/www/html/docs"])).unwrap();
    dispatcher.execute(&mut ctx, &argv(&["rm", "-r", "/var/www/html"])).unwrap();
    assert_eq!(ctx.cwd(), "/var/www");
}

#[test]
fn working_directory_removed_by_another_session() {
    let (dispatcher, _) = host();
    let mut a = dispatcher.open_context("root");
    let mut b = dispatcher.open_context("root");
    dispatcher.execute(&mut a, &argv(&["cd", "/var/www/html/docs"])).unwrap();
    assert!(dispatcher.execute(&mut b, &argv(&["rm", "-r", "/var/www/html"])).unwrap().ok());
    assert_eq!(a.cwd(), "/var/www/html/docs");

    let listed = dispatcher.execute(&mut a, &argv(&["ls"])).unwrap();
    assert!(listed.ok(), "{}", listed.err);
    assert_eq!(a.cwd(), "/var/www");
    assert_eq!(dispatcher.execute(&mut a, &argv(&["pwd"])).unwrap().out, "/var/www\n");
}

#[test]
fn session_transcript() {
    let (dispatcher, _) = host();
    let mut session = ShellSession::login(dispatcher, "root");
    assert_eq!(session.prompt(), "root@web01:~# ");

    assert!(matches!(session.handle_line("cd /var/www/html"), Outcome::Completed(_)));
    assert_eq!(session.prompt(), "root@web01:/var/www/html# ");

    let out = session.handle_line("cat \"index.html\"");
    assert_eq!(out.render(), linsim_testutil::INDEX_HTML);

    let out = session.handle_line("nosuchcmd");
    assert_eq!(out.render(), "-bash: nosuchcmd: command not found\n");
    assert_eq!(session.handle_line("echo $?").render(), "127\n");

    let out = session.handle_line("echo 'unterminated");
    assert!(matches!(out, Outcome::Failed(ref r) if r.code == 2));

    assert_eq!(session.handle_line("exit 3"), Outcome::Exit(3));
    assert!(session.is_exited());
}

#[test]
fn non_root_prompt_and_home() {
    let (dispatcher, _) = host();
    let mut session = ShellSession::login(dispatcher, "alice");
    assert_eq!(session.prompt(), "alice@web01:~$ ");
    session.handle_line("mkdir -p projects/site");
    session.handle_line("cd projects/site");
    assert_eq!(session.prompt(), "alice@web01:~/projects/site$ ");
    assert_eq!(session.handle_line("whoami").render(), "alice\n");
}

#[test]
fn readers_never_see_a_half_applied_rename() {
    let (dispatcher, _) = host();
    let rounds = 200;

    let writer = {
        let dispatcher = dispatcher.clone();
        thread::spawn(move || {
            let mut ctx = dispatcher.open_context("root");
            for round in 0..rounds {
                let (from, to) = if round % 2 == 0 {
                    ("/var/www/html", "/var/www/site")
                } else {
                    ("/var/www/site", "/var/www/html")
                };
                let result = dispatcher.execute(&mut ctx, &argv(&["mv", from, to])).unwrap();
                assert!(result.ok(), "{}", result.err);
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let dispatcher = dispatcher.clone();
            thread::spawn(move || {
                let mut ctx = dispatcher.open_context("root");
                for _ in 0..rounds {
                    let ls = dispatcher.execute(&mut ctx, &argv(&["ls", "-R", "/var/www"])).unwrap();
                    assert!(ls.ok(), "{}", ls.err);
                    let html = ls.out.contains("/var/www/html/docs:\nreadme.txt\n");
                    let site = ls.out.contains("/var/www/site/docs:\nreadme.txt\n");
                    assert!(html ^ site, "torn listing:\n{}", ls.out);
                    dispatcher.vfs().read().check_invariants().unwrap();
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}
