use crossbeam_channel::Sender;
use ignore::{WalkBuilder, WalkState};
use std::collections::HashMap;
use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};

use crate::model::WeightedNode;
use crate::progress::Progress;
use std::thread::sleep;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum ScanMsg {
    Progress(Progress),
    /// Directory tree with weight = bytes and secondary = file count.
    Done(WeightedNode),
    Error(String),
}

/// Loads a weighted tree from a directory on disk.
pub struct Scanner {
    cancel: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
}

impl Scanner {
    pub fn new(cancel: Arc<AtomicBool>) -> Self {
        Self {
            cancel,
            paused: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_pause(cancel: Arc<AtomicBool>, paused: Arc<AtomicBool>) -> Self {
        Self { cancel, paused }
    }

    pub fn scan(&self, root: PathBuf, tx: Sender<ScanMsg>) {
        use parking_lot::Mutex;

        let cancel = self.cancel.clone();
        let paused = self.paused.clone();

        // Shared progress counters
        let discovered = Arc::new(AtomicU64::new(0));
        let scanned = Arc::new(AtomicU64::new(0));
        let bytes = Arc::new(Mutex::new(0u64));

        // Collected files for final tree assembly
        let files: Arc<Mutex<Vec<(PathBuf, u64)>>> = Arc::new(Mutex::new(Vec::with_capacity(4096)));

        let mut builder = WalkBuilder::new(&root);
        builder
            .hidden(false)
            .git_global(false)
            .follow_links(false)
            .threads(num_cpus::get());

        let walker = builder.build_parallel();
        walker.run(|| {
            let paused = paused.clone();
            let cancel = cancel.clone();
            let tx = tx.clone();
            let discovered = discovered.clone();
            let scanned = scanned.clone();
            let bytes = bytes.clone();
            let files = files.clone();
            Box::new(move |entry| {
                while paused.load(Ordering::Relaxed) {
                    if cancel.load(Ordering::Relaxed) {
                        return WalkState::Quit;
                    }
                    sleep(Duration::from_millis(40));
                }
                if cancel.load(Ordering::Relaxed) {
                    return WalkState::Quit;
                }
                let ent = match entry {
                    Ok(ent) => ent,
                    Err(e) => {
                        tracing::warn!(error = %e, "scan error");
                        let _ = tx.send(ScanMsg::Error(e.to_string()));
                        return WalkState::Continue;
                    }
                };
                if !ent.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                    return WalkState::Continue;
                }
                discovered.fetch_add(1, Ordering::Relaxed);
                // Unreadable metadata still counts as scanned, with no size.
                let size = ent.metadata().map(|md| md.len()).ok();
                scanned.fetch_add(1, Ordering::Relaxed);
                let mut b = bytes.lock();
                if let Some(size) = size {
                    *b = b.saturating_add(size);
                    files.lock().push((ent.path().to_path_buf(), size));
                }
                let _ = tx.send(ScanMsg::Progress(Progress {
                    scanned: scanned.load(Ordering::Relaxed),
                    discovered: discovered.load(Ordering::Relaxed),
                    bytes: *b,
                }));
                WalkState::Continue
            })
        });

        let files = Arc::try_unwrap(files)
            .map(|m| m.into_inner())
            .unwrap_or_else(|arc| arc.lock().clone());
        let tree = build_tree(&root, files);
        tracing::debug!(nodes = tree.node_count(), bytes = tree.weight, "scan finished");
        let _ = tx.send(ScanMsg::Done(tree));
    }
}

#[derive(Default)]
struct PendingDir {
    name: String,
    dirs: Vec<usize>,
    files: Vec<WeightedNode>,
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_else(|| path.as_os_str().to_str().unwrap_or(""))
        .to_string()
}

fn build_tree(root: &Path, files: Vec<(PathBuf, u64)>) -> WeightedNode {
    let mut dirs: Vec<PendingDir> = Vec::with_capacity(256);
    let mut id_by_path: HashMap<PathBuf, usize> = HashMap::new();

    // Ensure a directory entry exists and is linked to its parent.
    fn ensure_dir(
        path: &Path,
        root: &Path,
        dirs: &mut Vec<PendingDir>,
        id_by_path: &mut HashMap<PathBuf, usize>,
    ) -> usize {
        if let Some(&id) = id_by_path.get(path) {
            return id;
        }
        let parent_id = if path == root {
            None
        } else {
            let parent = path.parent().unwrap_or(root);
            Some(ensure_dir(parent, root, dirs, id_by_path))
        };
        let id = dirs.len();
        dirs.push(PendingDir {
            name: display_name(path),
            ..PendingDir::default()
        });
        id_by_path.insert(path.to_path_buf(), id);
        if let Some(pid) = parent_id {
            dirs[pid].dirs.push(id);
        }
        id
    }

    let root_id = ensure_dir(root, root, &mut dirs, &mut id_by_path);
    for (path, size) in files {
        let parent = path.parent().unwrap_or(root);
        let pid = ensure_dir(parent, root, &mut dirs, &mut id_by_path);
        let mut leaf = WeightedNode::leaf(display_name(&path), size);
        leaf.secondary = 1;
        dirs[pid].files.push(leaf);
    }
    assemble(root_id, &mut dirs)
}

fn assemble(id: usize, dirs: &mut [PendingDir]) -> WeightedNode {
    let subdirs = std::mem::take(&mut dirs[id].dirs);
    let mut children: Vec<WeightedNode> = subdirs.into_iter().map(|d| assemble(d, dirs)).collect();
    children.append(&mut dirs[id].files);
    let weight = children.iter().fold(0u64, |acc, c| acc.saturating_add(c.weight));
    let secondary = children.iter().fold(0i64, |acc, c| acc.saturating_add(c.secondary));
    WeightedNode {
        name: std::mem::take(&mut dirs[id].name),
        weight,
        secondary,
        children,
        ..WeightedNode::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_directories() {
        let root = PathBuf::from("/data");
        let files = vec![
            (root.join("a/x.bin"), 10),
            (root.join("a/b/y.bin"), 5),
            (root.join("z.txt"), 1),
        ];
        let tree = build_tree(&root, files);
        assert_eq!(tree.name, "data");
        assert_eq!((tree.weight, tree.secondary), (16, 3));
        let a = tree.children.iter().find(|c| c.name == "a").unwrap();
        assert_eq!((a.weight, a.secondary), (15, 2));
        assert!(tree.check_invariants());
    }

    #[test]
    fn scans_a_real_directory() {
        let dir = std::env::temp_dir().join(format!("treemap-scan-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("one.txt"), b"hello").unwrap();
        std::fs::write(dir.join("sub/two.txt"), b"abc").unwrap();

        let (tx, rx) = crossbeam_channel::unbounded();
        Scanner::new(Arc::new(AtomicBool::new(false))).scan(dir.clone(), tx);
        let tree = rx
            .iter()
            .find_map(|m| match m {
                ScanMsg::Done(t) => Some(t),
                _ => None,
            })
            .unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(tree.weight, 8);
        assert_eq!(tree.secondary, 2);
        let sub = tree.children.iter().find(|c| c.name == "sub").unwrap();
        assert_eq!(sub.children[0].name, "two.txt");
    }
}
