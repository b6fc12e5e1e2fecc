use std::{env, io, path::PathBuf};

use anyhow::Result;

/// Resolves the application directory, creating it if needed. An explicit
/// override takes priority over the platform default.
pub fn application_dir(overridden: Option<PathBuf>) -> Result<PathBuf> {
    let path = match overridden {
        Some(path) => path,
        None => {
            #[cfg(windows)]
            {
                let mut path = PathBuf::from(
                    env::var("APPDATA").expect("APPDATA should be present on Windows"),
                );
                path.push("habitline");
                path
            }
            #[cfg(target_os = "linux")]
            {
                let mut path = env::var("XDG_STATE_HOME")
                    .map(PathBuf::from)
                    .or_else(|_| {
                        env::var("HOME").map(|home| {
                            let mut path = PathBuf::from(home);
                            path.push(".local/state");
                            path
                        })
                    })
                    .expect("Couldn't find neither XDG_STATE_HOME nor HOME");
                path.push("habitline");
                path
            }
        }
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
