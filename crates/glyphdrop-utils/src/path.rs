use std::{
    env,
    path::{Path, PathBuf},
};

fn env_dir(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .filter(|path| path.is_absolute())
}

/// Returns the user's home directory from `HOME`, if set to an absolute path.
pub fn home_dir() -> Option<PathBuf> {
    env_dir("HOME")
}

/// Returns `$XDG_CONFIG_HOME`, falling back to `$HOME/.config`.
pub fn xdg_config_home() -> Option<PathBuf> {
    env_dir("XDG_CONFIG_HOME").or_else(|| home_dir().map(|home| home.join(".config")))
}

/// Returns `$XDG_CACHE_HOME`, falling back to `$HOME/.cache`.
pub fn xdg_cache_home() -> Option<PathBuf> {
    env_dir("XDG_CACHE_HOME").or_else(|| home_dir().map(|home| home.join(".cache")))
}

/// Expands a leading `~` or `$HOME` against `home`.
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use glyphdrop_utils::path::expand_home;
///
/// let home = Path::new("/home/user");
/// assert_eq!(expand_home("~/fonts", home), PathBuf::from("/home/user/fonts"));
/// assert_eq!(expand_home("/opt/fonts", home), PathBuf::from("/opt/fonts"));
/// ```
pub fn expand_home(path: &str, home: &Path) -> PathBuf {
    for prefix in ["~", "$HOME", "${HOME}"] {
        if path == prefix {
            return home.to_path_buf();
        }
        if let Some(rest) = path.strip_prefix(prefix) {
            if let Some(rest) = rest.strip_prefix('/') {
                return home.join(rest);
            }
        }
    }
    PathBuf::from(path)
}
