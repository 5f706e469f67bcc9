//! Tree diffing between a local and a remote checksum index

use crate::index::ChecksumIndex;
use crate::intent::{IntentKind, SyncIntent};

/// Differences between a local and a remote tree
///
/// Both sets hold index keys (directories keep their trailing `/`) in key
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDiff {
    /// Present locally with no matching checksum remotely
    pub push: Vec<String>,
    /// Present remotely, absent locally
    pub delete: Vec<String>,
}

impl TreeDiff {
    /// Compute the diff between a local and a remote index
    ///
    /// Checksum equality is the only "unchanged" criterion. Directory entries
    /// carry the sentinel on both sides, so they are pushed only when missing
    /// remotely.
    pub fn diff(local: &ChecksumIndex, mut remote: ChecksumIndex) -> Self {
        let mut push = Vec::new();

        for (path, &local_checksum) in local {
            if remote.get(path) != Some(local_checksum) {
                push.push(path.clone());
            }
            remote.remove(path);
        }

        Self {
            push,
            delete: remote.into_iter().map(|(path, _)| path).collect(),
        }
    }

    /// Check if there are any changes
    pub fn is_empty(&self) -> bool {
        self.push.is_empty() && self.delete.is_empty()
    }

    /// Turn the diff into intents, pushes first
    ///
    /// Pushes run parents-first. Deletes covered by a deleted ancestor
    /// directory are dropped, as are deletes of an entry that a push replaces
    /// with the other kind (file <-> directory), since the receiver already
    /// removes the conflicting entry on push.
    pub fn intents(&self) -> Vec<SyncIntent> {
        let mut intents: Vec<SyncIntent> = self
            .push
            .iter()
            .map(|key| SyncIntent::from_index_key(IntentKind::Push, key))
            .collect();

        let replaced: Vec<&str> = self.push.iter().map(|k| k.trim_end_matches('/')).collect();
        let mut deleted_dirs: Vec<&str> = Vec::new();

        for key in &self.delete {
            if deleted_dirs.iter().any(|dir| key.starts_with(*dir)) {
                continue;
            }
            // Children go away with their directory, replaced or not
            if key.ends_with('/') {
                deleted_dirs.push(key.as_str());
            }
            if replaced.contains(&key.trim_end_matches('/')) {
                continue;
            }

            intents.push(SyncIntent::from_index_key(IntentKind::Delete, key));
        }

        intents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(entries: &[(&str, u64)]) -> ChecksumIndex {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_tree_diff() {
        let local = index(&[("a", 1), ("b", 2), ("dir/", 0)]);
        let remote = index(&[("a", 1), ("b", 3), ("c", 9)]);

        let diff = TreeDiff::diff(&local, remote);

        assert_eq!(diff.push, vec!["b", "dir/"]);
        assert_eq!(diff.delete, vec!["c"]);
    }

    #[test]
    fn test_identical_trees_produce_empty_diff() {
        let local = index(&[("a", 1), ("dir/", 0), ("dir/x", 7)]);
        let diff = TreeDiff::diff(&local, local.clone());

        assert!(diff.is_empty());
        assert!(diff.intents().is_empty());
    }

    #[test]
    fn test_existing_directory_never_pushed() {
        let local = index(&[("dir/", 0)]);
        let remote = index(&[("dir/", 0)]);

        assert!(TreeDiff::diff(&local, remote).push.is_empty());
    }

    #[test]
    fn test_empty_remote_pushes_everything() {
        let local = index(&[("x.txt", 42)]);
        let diff = TreeDiff::diff(&local, ChecksumIndex::new());

        assert_eq!(diff.intents(), vec![SyncIntent::push_file("x.txt")]);
    }

    #[test]
    fn test_empty_local_deletes_everything() {
        let remote = index(&[("gone.txt", 5), ("old/", 0)]);
        let diff = TreeDiff::diff(&ChecksumIndex::new(), remote);

        assert!(diff.push.is_empty());
        assert_eq!(diff.delete, vec!["gone.txt", "old/"]);
    }

    #[test]
    fn test_intents_order_and_flags() {
        let local = index(&[("dir/", 0), ("dir/x", 1)]);
        let remote = index(&[("stale", 3)]);

        let intents = TreeDiff::diff(&local, remote).intents();
        assert_eq!(
            intents,
            vec![
                SyncIntent::push_directory("dir"),
                SyncIntent::push_file("dir/x"),
                SyncIntent::delete("stale"),
            ]
        );
    }

    #[test]
    fn test_intents_skip_children_of_deleted_directory() {
        let remote = index(&[("old/", 0), ("old/a", 1), ("old/sub/", 0), ("older", 2)]);
        let diff = TreeDiff::diff(&ChecksumIndex::new(), remote);

        // Delete-set still lists everything
        assert_eq!(diff.delete.len(), 4);

        let intents = diff.intents();
        assert_eq!(
            intents,
            vec![
                SyncIntent::from_index_key(IntentKind::Delete, "old/"),
                SyncIntent::delete("older"),
            ]
        );
    }

    #[test]
    fn test_intents_skip_delete_replaced_by_push() {
        // Remote has a file where the local tree now has a directory
        let local = index(&[("thing/", 0), ("thing/inner", 4)]);
        let remote = index(&[("thing", 9)]);

        let diff = TreeDiff::diff(&local, remote);
        assert_eq!(diff.delete, vec!["thing"]);

        let intents = diff.intents();
        assert!(intents.iter().all(|i| i.kind == IntentKind::Push));
        assert_eq!(intents.len(), 2);
    }

    #[test]
    fn test_intents_skip_children_of_replaced_directory() {
        // Remote has a populated directory where the local tree now has a file
        let local = index(&[("thing", 9)]);
        let remote = index(&[("thing/", 0), ("thing/inner/", 0), ("thing/inner/f", 1)]);

        let intents = TreeDiff::diff(&local, remote).intents();
        assert_eq!(intents, vec![SyncIntent::push_file("thing")]);
    }
}
