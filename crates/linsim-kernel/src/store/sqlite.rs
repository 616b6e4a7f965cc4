//! SQLite-backed record store.
//!
//! One table, `filesystem`, holds every row. File payloads live in the
//! `bindata` (preferred) or `txtdata` column of the row and are addressed by
//! rowid. Hard links to the same inode all point at the lowest rowid that
//! carries content. Removing that row hands its payload and its rowid to a
//! surviving link, so locators already handed out stay valid.

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use linsim_types::{CollaboratorError, ContentLocator, EntryKind, FsRecord};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row, Transaction};
use tracing::debug;

use super::{ContentStore, Mutation, MutationSink, RecordStore};

/// Schema SQL embedded from schema/filesystem.sql.
const SCHEMA_SQL: &str = include_str!("../../schema/filesystem.sql");

/// Every row with its locator and content length, content itself left out.
const SCAN_SQL: &str = "
    SELECT f.path, f.name, f.inode, f.type, f.mode, f.linkcount, f.uid, f.gid,
           f.atime, f.ctime, f.mtime, f.link, l.locator,
           COALESCE(length(d.bindata), length(CAST(d.txtdata AS BLOB)), 0)
    FROM filesystem AS f
    JOIN (
        SELECT r.rowid AS id,
               CASE
                   WHEN r.inode <> 0 THEN (
                       SELECT MIN(g.rowid) FROM filesystem AS g
                       WHERE g.inode = r.inode
                         AND (g.bindata IS NOT NULL OR g.txtdata IS NOT NULL))
                   WHEN r.bindata IS NOT NULL OR r.txtdata IS NOT NULL THEN r.rowid
               END AS locator
        FROM filesystem AS r
    ) AS l ON l.id = f.rowid
    LEFT JOIN filesystem AS d ON d.rowid = l.locator";

/// Payload for [`SqliteStore::insert`].
#[derive(Debug, Clone, Copy)]
pub enum Content<'a> {
    Binary(&'a [u8]),
    Text(&'a str),
}

/// Record, content and mutation store over one SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CollaboratorError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CollaboratorError::Unavailable(format!("creating {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| CollaboratorError::Unavailable(format!("opening {}: {e}", path.display())))?;
        Self::with_connection(conn)
    }

    /// An empty in-memory database.
    pub fn in_memory() -> Result<Self, CollaboratorError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CollaboratorError::Unavailable(format!("in-memory database: {e}")))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, CollaboratorError> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| CollaboratorError::Unavailable(format!("initializing schema: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert one row. Returns its rowid as a locator.
    ///
    /// `record.content_locator` and `record.content_len` are ignored: they
    /// are derived from the stored content on scan.
    pub fn insert(
        &self,
        record: &FsRecord,
        content: Option<Content<'_>>,
    ) -> Result<ContentLocator, CollaboratorError> {
        let (bindata, txtdata) = match content {
            Some(Content::Binary(bytes)) => (Some(bytes), None),
            Some(Content::Text(text)) => (None, Some(text)),
            None => (None, None),
        };
        let conn = self.lock();
        conn.execute(
            "INSERT INTO filesystem
                 (path, name, inode, type, mode, linkcount, uid, gid,
                  atime, ctime, mtime, link, bindata, txtdata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                record.path,
                record.name,
                to_sql_int(record.inode),
                record.kind.code(),
                record.mode,
                record.link_count,
                record.uid,
                record.gid,
                record.atime,
                record.ctime,
                record.mtime,
                record.link_target,
                bindata,
                txtdata,
            ],
        )
        .map_err(|e| query_error(format!("inserting {}", record.path), e))?;
        Ok(ContentLocator(conn.last_insert_rowid()))
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl RecordStore for SqliteStore {
    fn count(&self) -> Result<u64, CollaboratorError> {
        let count: i64 = self
            .lock()
            .query_row("SELECT COUNT(*) FROM filesystem", [], |row| row.get(0))
            .map_err(|e| query_error("counting rows", e))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn scan(
        &self,
        visit: &mut dyn FnMut(FsRecord) -> ControlFlow<()>,
    ) -> Result<(), CollaboratorError> {
        let conn = self.lock();
        let mut stmt = conn
            .prepare_cached(SCAN_SQL)
            .map_err(|e| query_error("preparing scan", e))?;
        let mut rows = stmt.query([]).map_err(|e| query_error("starting scan", e))?;
        while let Some(row) = rows.next().map_err(|e| query_error("reading row", e))? {
            if visit(decode_row(row)?).is_break() {
                debug!("scan stopped by visitor");
                break;
            }
        }
        Ok(())
    }

    fn end_scan(&self) {
        self.lock().flush_prepared_statement_cache();
    }
}

impl ContentStore for SqliteStore {
    fn fetch(&self, locator: ContentLocator) -> Result<Vec<u8>, CollaboratorError> {
        let result = self.lock().query_row(
            "SELECT bindata, txtdata FROM filesystem WHERE rowid = ?1",
            params![locator.0],
            |row| {
                let bin: Option<Vec<u8>> = row.get(0)?;
                let text: Option<String> = row.get(1)?;
                Ok((bin, text))
            },
        );
        match result {
            Ok((Some(bytes), _)) => Ok(bytes),
            Ok((None, Some(text))) => Ok(text.into_bytes()),
            Ok((None, None)) | Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(CollaboratorError::ContentMissing(locator.to_string()))
            }
            Err(e) => Err(query_error(format!("fetching {locator}"), e)),
        }
    }
}

impl MutationSink for SqliteStore {
    fn flush(&self, mutation: &Mutation) -> Result<(), CollaboratorError> {
        let mut conn = self.lock();
        let tx = conn
            .transaction()
            .map_err(|e| query_error("opening transaction", e))?;
        let applied = match mutation {
            Mutation::Created(record) => tx.execute(
                "INSERT INTO filesystem
                     (path, name, inode, type, mode, linkcount, uid, gid,
                      atime, ctime, mtime, link)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    record.path,
                    record.name,
                    to_sql_int(record.inode),
                    record.kind.code(),
                    record.mode,
                    record.link_count,
                    record.uid,
                    record.gid,
                    record.atime,
                    record.ctime,
                    record.mtime,
                    record.link_target,
                ],
            ),
            Mutation::Removed { path } => remove_subtree(&tx, path),
            Mutation::Renamed { from, to } => tx
                .execute(
                    "UPDATE filesystem SET path = ?2 || substr(path, length(?1) + 1)
                     WHERE path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/'",
                    params![from, to],
                )
                .and_then(|_| {
                    let name = to.rsplit('/').next().unwrap_or("");
                    tx.execute(
                        "UPDATE filesystem SET name = ?2 WHERE path = ?1",
                        params![to, name],
                    )
                }),
            Mutation::Touched { path, atime, mtime } => tx.execute(
                "UPDATE filesystem SET atime = ?2, mtime = ?3 WHERE path = ?1",
                params![path, atime, mtime],
            ),
            Mutation::Relinked {
                path,
                inode,
                link_count,
            } => tx.execute(
                "UPDATE filesystem SET inode = ?2, linkcount = ?3 WHERE path = ?1",
                params![path, to_sql_int(*inode), link_count],
            ),
        };
        applied.map_err(|e| query_error("applying mutation", e))?;
        tx.commit().map_err(|e| query_error("committing mutation", e))
    }
}

/// Payload row inside a removed subtree whose inode has links elsewhere.
struct Orphaned {
    rowid: i64,
    heir: i64,
    bindata: Option<Vec<u8>>,
    txtdata: Option<String>,
}

/// Delete `path` and everything below it. Payloads still reachable through
/// a hard link outside the subtree move to that link's row, which takes
/// over the deleted rowid.
fn remove_subtree(tx: &Transaction<'_>, path: &str) -> rusqlite::Result<usize> {
    let holders: Vec<(i64, i64, Option<Vec<u8>>, Option<String>)> = {
        let mut stmt = tx.prepare(
            "SELECT rowid, inode, bindata, txtdata FROM filesystem
             WHERE (path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/')
               AND inode <> 0
               AND (bindata IS NOT NULL OR txtdata IS NOT NULL)",
        )?;
        let rows = stmt.query_map(params![path], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?;
        rows.collect::<rusqlite::Result<_>>()?
    };

    let mut orphaned = Vec::new();
    for (rowid, inode, bindata, txtdata) in holders {
        let heir: Option<i64> = tx
            .query_row(
                "SELECT MIN(rowid) FROM filesystem
                 WHERE inode = ?1
                   AND NOT (path = ?2 OR substr(path, 1, length(?2) + 1) = ?2 || '/')",
                params![inode, path],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        if let Some(heir) = heir {
            orphaned.push(Orphaned {
                rowid,
                heir,
                bindata,
                txtdata,
            });
        }
    }

    let deleted = tx.execute(
        "DELETE FROM filesystem
         WHERE path = ?1 OR substr(path, 1, length(?1) + 1) = ?1 || '/'",
        params![path],
    )?;
    for row in orphaned {
        debug!(from = row.rowid, to = row.heir, "payload handed to surviving link");
        tx.execute(
            "UPDATE filesystem SET rowid = ?1, bindata = ?2, txtdata = ?3 WHERE rowid = ?4",
            params![row.rowid, row.bindata, row.txtdata, row.heir],
        )?;
    }
    Ok(deleted)
}

fn query_error(what: impl std::fmt::Display, e: rusqlite::Error) -> CollaboratorError {
    CollaboratorError::Query(format!("{what}: {e}"))
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn decode_row(row: &Row<'_>) -> Result<FsRecord, CollaboratorError> {
    let get_err = |e: rusqlite::Error| query_error("decoding row", e);
    let path: String = row.get(0).map_err(get_err)?;
    let bad = |field: &str| CollaboratorError::BadRow(format!("{path}: {field} out of range"));

    let code: i64 = row.get(3).map_err(get_err)?;
    let kind = EntryKind::from_code(code)
        .ok_or_else(|| CollaboratorError::BadRow(format!("{path}: unknown type {code}")))?;

    let int = |idx: usize| -> Result<i64, CollaboratorError> { row.get(idx).map_err(get_err) };
    let inode = u64::try_from(int(2)?).map_err(|_| bad("inode"))?;
    let mode = u32::try_from(int(4)?).map_err(|_| bad("mode"))?;
    let link_count = u32::try_from(int(5)?).map_err(|_| bad("linkcount"))?;
    let uid = u32::try_from(int(6)?).map_err(|_| bad("uid"))?;
    let gid = u32::try_from(int(7)?).map_err(|_| bad("gid"))?;

    let link_target: Option<String> = row.get(11).map_err(get_err)?;
    let locator: Option<i64> = row.get(12).map_err(get_err)?;
    let content_len = u64::try_from(int(13)?).unwrap_or(0);

    let mut record = FsRecord {
        name: row.get(1).map_err(get_err)?,
        path: path.clone(),
        inode,
        kind,
        mode,
        link_count,
        uid,
        gid,
        atime: int(8)?,
        ctime: int(9)?,
        mtime: int(10)?,
        link_target: None,
        content_locator: None,
        content_len: 0,
    };
    match kind {
        EntryKind::RegularFile => {
            if let Some(locator) = locator {
                record = record.with_content(ContentLocator(locator), content_len);
            }
        }
        EntryKind::Symlink => record.link_target = link_target,
        _ => {}
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(store: &SqliteStore) -> Vec<FsRecord> {
        let mut out = Vec::new();
        store
            .scan(&mut |r| {
                out.push(r);
                ControlFlow::Continue(())
            })
            .unwrap();
        store.end_scan();
        out.sort_by(|a, b| a.path.cmp(&b.path));
        out
    }

    #[test]
    fn scan_computes_length_without_content() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert(&FsRecord::new("/", EntryKind::Directory), None).unwrap();
        let loc = store
            .insert(
                &FsRecord::new("/motd", EntryKind::RegularFile).with_inode(2),
                Some(Content::Text("héllo\n")),
            )
            .unwrap();

        assert_eq!(store.count().unwrap(), 2);
        let rows = collect(&store);
        assert_eq!(rows[1].content_locator, Some(loc));
        assert_eq!(rows[1].content_len, 7);
        assert_eq!(store.fetch(loc).unwrap(), "héllo\n".as_bytes());
    }

    #[test]
    fn binary_column_wins() {
        let store = SqliteStore::in_memory().unwrap();
        let conn = store.lock();
        conn.execute(
            "INSERT INTO filesystem (path, name, type, bindata, txtdata)
             VALUES ('/f', 'f', 0, x'0001', 'text')",
            [],
        )
        .unwrap();
        drop(conn);
        let rows = collect(&store);
        assert_eq!(rows[0].content_len, 2);
        assert_eq!(
            store.fetch(rows[0].content_locator.unwrap()).unwrap(),
            vec![0, 1]
        );
    }

    #[test]
    fn hard_links_share_lowest_locator() {
        let store = SqliteStore::in_memory().unwrap();
        let first = store
            .insert(
                &FsRecord::new("/a", EntryKind::RegularFile).with_inode(9),
                Some(Content::Binary(b"abc")),
            )
            .unwrap();
        store
            .insert(&FsRecord::new("/b", EntryKind::RegularFile).with_inode(9), None)
            .unwrap();
        let rows = collect(&store);
        assert!(rows.iter().all(|r| r.content_locator == Some(first)));
        assert!(rows.iter().all(|r| r.content_len == 3));
    }

    #[test]
    fn removing_payload_row_keeps_locator_for_other_links() {
        let store = SqliteStore::in_memory().unwrap();
        let first = store
            .insert(
                &FsRecord::new("/a", EntryKind::RegularFile).with_inode(9),
                Some(Content::Binary(b"abc")),
            )
            .unwrap();
        store
            .insert(&FsRecord::new("/b", EntryKind::RegularFile).with_inode(9), None)
            .unwrap();
        store.flush(&Mutation::Removed { path: "/a".into() }).unwrap();

        assert_eq!(store.fetch(first).unwrap(), b"abc");
        let rows = collect(&store);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].path, "/b");
        assert_eq!(rows[0].content_locator, Some(first));
        assert_eq!(rows[0].content_len, 3);
    }

    #[test]
    fn removing_last_link_drops_payload() {
        let store = SqliteStore::in_memory().unwrap();
        let loc = store
            .insert(
                &FsRecord::new("/a", EntryKind::RegularFile).with_inode(9),
                Some(Content::Binary(b"abc")),
            )
            .unwrap();
        store.flush(&Mutation::Removed { path: "/a".into() }).unwrap();
        assert!(matches!(store.fetch(loc), Err(CollaboratorError::ContentMissing(_))));
    }

    #[test]
    fn unknown_type_is_bad_row() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .lock()
            .execute("INSERT INTO filesystem (path, name, type) VALUES ('/x', 'x', 9)", [])
            .unwrap();
        let err = store.scan(&mut |_| ControlFlow::Continue(())).unwrap_err();
        assert!(matches!(err, CollaboratorError::BadRow(_)));
    }

    #[test]
    fn flush_renames_and_removes_subtrees() {
        let store = SqliteStore::in_memory().unwrap();
        for path in ["/", "/usr", "/usr/lib", "/usrx"] {
            store.insert(&FsRecord::new(path, EntryKind::Directory), None).unwrap();
        }
        store
            .flush(&Mutation::Renamed {
                from: "/usr".into(),
                to: "/opt".into(),
            })
            .unwrap();
        let paths: Vec<_> = collect(&store).into_iter().map(|r| (r.path, r.name)).collect();
        assert_eq!(
            paths,
            vec![
                ("/".to_string(), String::new()),
                ("/opt".to_string(), "opt".to_string()),
                ("/opt/lib".to_string(), "lib".to_string()),
                ("/usrx".to_string(), "usrx".to_string()),
            ]
        );

        store.flush(&Mutation::Removed { path: "/opt".into() }).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn flush_created_and_touched() {
        let store = SqliteStore::in_memory().unwrap();
        let record = FsRecord::new("/new", EntryKind::RegularFile).with_inode(4).with_times(10);
        store.flush(&Mutation::Created(record)).unwrap();
        store
            .flush(&Mutation::Touched {
                path: "/new".into(),
                atime: 20,
                mtime: 30,
            })
            .unwrap();
        let rows = collect(&store);
        assert_eq!((rows[0].atime, rows[0].mtime, rows[0].ctime), (20, 30, 10));
        assert_eq!(rows[0].content_locator, None);
    }
}
