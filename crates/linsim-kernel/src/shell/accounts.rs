//! User and group names from the virtual `/etc/passwd` and `/etc/group`.

use crate::content::ContentProvider;
use crate::vfs::Vfs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: String,
    pub shell: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub name: String,
    pub gid: u32,
    pub members: Vec<String>,
}

/// Parsed account databases. Missing or unreadable files parse as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accounts {
    users: Vec<UserRecord>,
    groups: Vec<GroupRecord>,
}

impl Accounts {
    /// Read both files from the tree.
    pub fn load(vfs: &Vfs, content: &ContentProvider) -> Self {
        Self::parse(
            &read_text(vfs, content, "/etc/passwd"),
            &read_text(vfs, content, "/etc/group"),
        )
    }

    pub fn parse(passwd: &str, group: &str) -> Self {
        let users = passwd
            .lines()
            .filter(|line| !line.starts_with('#'))
            .filter_map(|line| {
                let fields: Vec<&str> = line.split(':').collect();
                if fields.len() < 7 {
                    return None;
                }
                Some(UserRecord {
                    name: fields[0].to_string(),
                    uid: fields[2].parse().ok()?,
                    gid: fields[3].parse().ok()?,
                    home: fields[5].to_string(),
                    shell: fields[6].to_string(),
                })
            })
            .collect();
        let groups = group
            .lines()
            .filter(|line| !line.starts_with('#'))
            .filter_map(|line| {
                let fields: Vec<&str> = line.split(':').collect();
                if fields.len() < 4 {
                    return None;
                }
                Some(GroupRecord {
                    name: fields[0].to_string(),
                    gid: fields[2].parse().ok()?,
                    members: fields[3]
                        .split(',')
                        .filter(|m| !m.is_empty())
                        .map(str::to_string)
                        .collect(),
                })
            })
            .collect();
        Self { users, groups }
    }

    pub fn user(&self, name: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.name == name)
    }

    /// Name for `uid`, or the number itself.
    pub fn user_name(&self, uid: u32) -> String {
        self.users
            .iter()
            .find(|u| u.uid == uid)
            .map_or_else(|| uid.to_string(), |u| u.name.clone())
    }

    /// Name for `gid`, or the number itself.
    pub fn group_name(&self, gid: u32) -> String {
        self.groups
            .iter()
            .find(|g| g.gid == gid)
            .map_or_else(|| gid.to_string(), |g| g.name.clone())
    }

    /// Primary group first, then supplementary groups listing `user`.
    pub fn groups_of(&self, user: &str, primary: u32) -> Vec<u32> {
        let mut gids = vec![primary];
        for group in &self.groups {
            if group.gid != primary && group.members.iter().any(|m| m == user) {
                gids.push(group.gid);
            }
        }
        gids
    }
}

fn read_text(vfs: &Vfs, content: &ContentProvider, path: &str) -> String {
    let entry = {
        let tree = vfs.read();
        tree.lookup(path)
            .and_then(|found| tree.follow(&found))
            .ok()
            .and_then(|real| tree.get(&real).cloned())
    };
    entry
        .and_then(|entry| content.read(&entry).ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
