// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use path_clean::clean;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "lucky-draw.config.yaml";

pub type FindInParent = fn(&Path, &str) -> Option<PathBuf>;

/// Walk up from `path` looking for `filename`.
pub fn find_in_parent(path: &Path, filename: &str) -> Option<PathBuf> {
    path.ancestors()
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.exists())
}

/// Where the configuration should be read from.
///
/// An explicit file wins (relative paths are taken from `cwd`), then the nearest
/// `filename` in `cwd` or one of its parents, then `default_config_dir`.
pub fn resolve_config_path(
    find_in_parent: FindInParent,
    cwd: &Path,
    default_config_dir: &Path,
    filename: &str,
    cli_file: Option<&Path>,
) -> PathBuf {
    if let Some(cli_file) = cli_file {
        if cli_file.is_absolute() {
            return cli_file.to_path_buf();
        }
        return clean(cwd.join(cli_file));
    }

    if let Some(found) = find_in_parent(cwd, filename) {
        return found;
    }

    clean(default_config_dir.join(filename))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    fn not_found(_: &Path, _: &str) -> Option<PathBuf> {
        None
    }

    fn found(_: &Path, _: &str) -> Option<PathBuf> {
        Some(PathBuf::from("/work/lucky-draw.config.yaml"))
    }

    #[test]
    fn resolution_order() {
        let cwd = Path::new("/work/app");
        let defaults = Path::new("/home/me/.config/lucky-draw");

        assert_eq!(
            resolve_config_path(not_found, cwd, defaults, DEFAULT_CONFIG_NAME, None),
            PathBuf::from("/home/me/.config/lucky-draw/lucky-draw.config.yaml")
        );
        assert_eq!(
            resolve_config_path(found, cwd, defaults, DEFAULT_CONFIG_NAME, None),
            PathBuf::from("/work/lucky-draw.config.yaml")
        );
        assert_eq!(
            resolve_config_path(
                found,
                cwd,
                defaults,
                DEFAULT_CONFIG_NAME,
                Some(Path::new("../conf/draw.yaml"))
            ),
            PathBuf::from("/work/conf/draw.yaml")
        );
        assert_eq!(
            resolve_config_path(
                found,
                cwd,
                defaults,
                DEFAULT_CONFIG_NAME,
                Some(Path::new("/etc/draw.yaml"))
            ),
            PathBuf::from("/etc/draw.yaml")
        );
    }

    #[test]
    fn finds_file_in_an_ancestor() -> Result<()> {
        let root = tempdir()?;
        let nested = root.path().join("a").join("b");
        fs::create_dir_all(&nested)?;
        fs::write(root.path().join(DEFAULT_CONFIG_NAME), "chains: []\n")?;

        assert_eq!(
            find_in_parent(&nested, DEFAULT_CONFIG_NAME),
            Some(root.path().join(DEFAULT_CONFIG_NAME))
        );
        assert_eq!(find_in_parent(&nested, "missing.yaml"), None);
        Ok(())
    }
}
