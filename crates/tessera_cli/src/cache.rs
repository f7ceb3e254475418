//! `tessera cache`: inspect and maintain the on-disk cache.

use std::error::Error;
use std::time::Duration;

use tessera_cache::CacheStore;

use crate::{CacheAction, CacheArgs, GlobalArgs};

/// Runs the `tessera cache` command.
pub fn run(args: &CacheArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => tessera_config::load_config(&args.project)?.cache.root,
    };
    let store = CacheStore::new(root);

    match &args.action {
        CacheAction::List => {
            for entry in store.entries()? {
                let state = if entry.finalized { "complete" } else { "incomplete" };
                println!("{}  {:<10}  {}", entry.key, state, entry.dir.display());
            }
        }
        CacheAction::Remove { key } => {
            if !store.remove(key)? {
                eprintln!("error: no cache entry {key}");
                return Ok(1);
            }
        }
        CacheAction::Prune { min_age } => {
            let removed = store.prune_incomplete(Duration::from_secs(*min_age))?;
            if !global.quiet {
                eprintln!("     Removed {removed} incomplete entries");
            }
        }
        CacheAction::Clean => {
            let removed = store.clean()?;
            if !global.quiet {
                eprintln!("     Removed {removed} entries from {}", store.root().display());
            }
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use tessera_cache::CacheKey;

    const KEY: &str = "000102030405060708090a0b0c0d0e0f/f0e0d0c0b0a090807060504030201000";

    fn args(root: PathBuf, action: CacheAction) -> CacheArgs {
        CacheArgs {
            project: PathBuf::from("."),
            root: Some(root),
            action,
        }
    }

    #[test]
    fn prune_removes_unfinalized_entries() {
        let dir = tempfile::tempdir().unwrap();
        let key: CacheKey = KEY.parse().unwrap();
        let entry = dir.path().join(key.relative_path());
        std::fs::create_dir_all(&entry).unwrap();

        let global = GlobalArgs { quiet: true };
        run(&args(dir.path().to_path_buf(), CacheAction::Prune { min_age: 3600 }), &global).unwrap();
        assert!(entry.exists());
        run(&args(dir.path().to_path_buf(), CacheAction::Prune { min_age: 0 }), &global).unwrap();
        assert!(!entry.exists());
    }

    #[test]
    fn removing_unknown_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let action = CacheAction::Remove {
            key: KEY.parse().unwrap(),
        };
        let code = run(&args(dir.path().to_path_buf(), action), &GlobalArgs { quiet: true }).unwrap();
        assert_eq!(code, 1);
    }
}
