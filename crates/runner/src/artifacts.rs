//! Output directory and result-log collection.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Create `dir` (and parents) if missing. Existing directories are reused.
pub fn ensure_output_dir(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    info!(path = %dir.display(), "output directory ready");
    Ok(())
}

/// Copy `<work_dir>/<name>` into `output_dir` and strip its execute bits.
///
/// Best effort: a missing log returns `None`, a failed copy is logged at
/// warn and also returns `None`.
pub fn collect_result_log(work_dir: &Path, output_dir: &Path, name: &str) -> Option<PathBuf> {
    let source = work_dir.join(name);
    if !source.is_file() {
        info!(path = %source.display(), "no result log to collect");
        return None;
    }

    let target = output_dir.join(name);
    match copy_without_exec(&source, &target) {
        Ok(()) => {
            info!(path = %target.display(), "result log collected");
            Some(target)
        }
        Err(e) => {
            warn!(
                source = %source.display(),
                target = %target.display(),
                error = %e,
                "failed to collect result log"
            );
            None
        }
    }
}

fn copy_without_exec(source: &Path, target: &Path) -> io::Result<()> {
    std::fs::copy(source, target)?;
    strip_exec_bits(target)
}

/// `chmod -x`, keeping read and write bits.
#[cfg(unix)]
fn strip_exec_bits(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() & !0o111);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn strip_exec_bits(_path: &Path) -> io::Result<()> {
    Ok(())
}
