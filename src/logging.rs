use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

static LOG_PATH: Mutex<Option<PathBuf>> = Mutex::new(None);

const MAX_LOG_BYTES: u64 = 2 * 1024 * 1024;

/// Writes every line to stderr and, when available, to the log file.
struct Tee {
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = self.file.as_mut() {
            let _ = file.write_all(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
        Ok(())
    }
}

/// Install the global logger. Safe to call more than once; later calls are no-ops.
pub fn init(data_dir: &Path) {
    let _ = std::fs::create_dir_all(data_dir);
    let log_path = data_dir.join("clipshare.log");

    rotate(&log_path, data_dir);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();
    let has_file = file.is_some();

    let env = env_logger::Env::default().default_filter_or("info");
    let installed = env_logger::Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {:<5} {}: {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(Tee { file })))
        .try_init()
        .is_ok();

    if !installed {
        return;
    }

    if has_file {
        if let Ok(mut guard) = LOG_PATH.lock() {
            *guard = Some(log_path.clone());
        }
    }

    log::info!("=== ClipShare v{} started ===", env!("CARGO_PKG_VERSION"));
    log::info!("OS: {}", std::env::consts::OS);
    log::info!("Arch: {}", std::env::consts::ARCH);
    if has_file {
        log::info!("Log file: {}", log_path.display());
    }
}

/// If the log is over 2MB, rename it to `.old` so the next open starts fresh.
fn rotate(log_path: &Path, data_dir: &Path) {
    if let Ok(meta) = std::fs::metadata(log_path) {
        if meta.len() > MAX_LOG_BYTES {
            let _ = std::fs::rename(log_path, data_dir.join("clipshare.old.log"));
        }
    }
}

pub fn log_path() -> Option<String> {
    LOG_PATH
        .lock()
        .ok()
        .and_then(|g| g.as_ref().map(|p| p.display().to_string()))
}
