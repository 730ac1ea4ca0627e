//! Persisted per-user deck directory (§6 "Persisted state", §1 "Out of
//! scope: persistence of deck blobs to disk").
//!
//! The actual disk format is an external-collaborator concern the spec only
//! pins the *interface* of — upload/list/select/delete against an opaque,
//! content-addressed id. [`DeckStore`] is a small `tokio::fs`-backed
//! implementation good enough to drive §8 scenario 1 end to end; swapping it
//! for a real database-backed store would not touch `game-core` or the
//! `connection` dispatch that calls it.

use std::path::{Path, PathBuf};

use protocol::framer::{item_from_tokens, item_to_tokens, FramerToken};
use protocol::{shared_registry, DeckDirEntry, DeckFileInfo, DeckFolder, DeckList};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Serialize, Deserialize)]
struct StoredDeck {
    name: String,
    tokens: Vec<FramerToken>,
}

pub struct DeckStore {
    root: PathBuf,
}

impl DeckStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DeckStore { root: root.into() }
    }

    fn owner_dir(&self, owner: &str) -> PathBuf {
        self.root.join(sanitize(owner))
    }

    /// Persists `deck` under a fresh opaque id, returning that id (§8
    /// scenario 1: "expect `Response_DeckUpload(file)` with fresh file id").
    pub async fn upload(&self, owner: &str, name: &str, deck: &DeckList) -> std::io::Result<String> {
        let dir = self.owner_dir(owner);
        fs::create_dir_all(&dir).await?;
        let id = format!("{:016x}", rand::random::<u64>());
        let stored = StoredDeck {
            name: name.to_string(),
            tokens: item_to_tokens(&deck.to_item()),
        };
        let body = serde_json::to_vec(&stored).map_err(std::io::Error::other)?;
        fs::write(dir.join(format!("{id}.json")), body).await?;
        Ok(id)
    }

    /// Loads a previously uploaded deck back (§4.4 `deck_select` resolves
    /// the blob the handler looked up by id into a [`DeckList`]).
    pub async fn load(&self, owner: &str, id: &str) -> std::io::Result<DeckList> {
        let path = self.owner_dir(owner).join(format!("{}.json", sanitize(id)));
        let body = fs::read(&path).await?;
        let stored: StoredDeck = serde_json::from_slice(&body).map_err(std::io::Error::other)?;
        let item = item_from_tokens(stored.tokens, shared_registry()).map_err(std::io::Error::other)?;
        Ok(DeckList::from_item(&item))
    }

    pub async fn delete(&self, owner: &str, id: &str) -> std::io::Result<()> {
        fs::remove_file(self.owner_dir(owner).join(format!("{}.json", sanitize(id)))).await
    }

    pub async fn new_dir(&self, owner: &str, path: &str, name: &str) -> std::io::Result<()> {
        fs::create_dir_all(self.owner_dir(owner).join(sanitize(path)).join(sanitize(name))).await
    }

    /// Lists the directory tree at `path` within `owner`'s deck folder
    /// (empty `path` means the root) as a [`DeckDirEntry::Folder`] (§8
    /// scenario 1: "subsequent `Command_DeckList` returns a directory
    /// containing `F`").
    pub async fn list_dir(&self, owner: &str, path: &str) -> std::io::Result<DeckDirEntry> {
        let root = self.owner_dir(owner);
        fs::create_dir_all(&root).await?;
        let start = if path.is_empty() { root.clone() } else { root.join(sanitize(path)) };
        let name = if path.is_empty() { String::new() } else { path.to_string() };
        list_dir_inner(&start, name).await
    }
}

fn list_dir_inner(dir: &Path, name: String) -> std::pin::Pin<Box<dyn std::future::Future<Output = std::io::Result<DeckDirEntry>> + Send + '_>> {
    Box::pin(async move {
        let mut entries = Vec::new();
        let mut read = fs::read_dir(dir).await?;
        while let Some(entry) = read.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_type.is_dir() {
                entries.push(list_dir_inner(&path, file_name).await?);
            } else if let Some(id) = file_name.strip_suffix(".json") {
                let body = fs::read(&path).await?;
                let Ok(stored) = serde_json::from_slice::<StoredDeck>(&body) else {
                    continue;
                };
                entries.push(DeckDirEntry::File(DeckFileInfo {
                    id: id.to_string(),
                    name: stored.name,
                }));
            }
        }
        entries.sort_by(|a, b| entry_name(a).cmp(entry_name(b)));
        Ok(DeckDirEntry::Folder(DeckFolder { name, entries }))
    })
}

fn entry_name(entry: &DeckDirEntry) -> &str {
    match entry {
        DeckDirEntry::Folder(f) => &f.name,
        DeckDirEntry::File(f) => &f.name,
    }
}

/// Strips path separators out of anything that ends up as a path component
/// — deck/folder names and ids arrive from client commands and must never
/// be allowed to escape the owner's deck directory.
fn sanitize(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, '/' | '\\' | '.')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{DeckCardEntry, DeckZoneGroup};

    fn sample_deck() -> DeckList {
        DeckList {
            zones: vec![DeckZoneGroup {
                name: "main".into(),
                cards: vec![DeckCardEntry { name: "Plains".into(), number: 4 }],
            }],
        }
    }

    #[tokio::test]
    async fn upload_then_list_then_load_round_trips() {
        let dir = std::env::temp_dir().join(format!("deck_store_test_{}", rand::random::<u64>()));
        let store = DeckStore::new(&dir);
        let id = store.upload("alice", "mono_white", &sample_deck()).await.unwrap();

        let listing = store.list_dir("alice", "").await.unwrap();
        let DeckDirEntry::Folder(folder) = &listing else { panic!("expected folder") };
        assert!(folder.entries.iter().any(|e| matches!(e, DeckDirEntry::File(f) if f.id == id)));

        let loaded = store.load("alice", &id).await.unwrap();
        assert_eq!(loaded, sample_deck());

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn sanitize_blocks_path_traversal_in_ids() {
        let dir = std::env::temp_dir().join(format!("deck_store_test_{}", rand::random::<u64>()));
        let store = DeckStore::new(&dir);
        assert!(store.load("alice", "../../etc/passwd").await.is_err());
        let _ = fs::remove_dir_all(&dir).await;
    }
}
