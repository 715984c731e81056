use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{collector::ProcessNameResolver, report::printable};

pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const UNKNOWN_PROCESS: &str = "<unknown>";

// Resolve process names from the Linux process table
#[derive(Debug, Clone)]
pub struct ProcfsResolver {
    root: PathBuf,

    // Returned when the process is gone or not readable
    placeholder: String,
}

impl ProcfsResolver {
    pub fn new(placeholder: &str) -> Self {
        Self::with_root(Path::new(DEFAULT_PROC_ROOT), placeholder)
    }

    pub fn with_root(root: &Path, placeholder: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            placeholder: placeholder.to_string(),
        }
    }

    // First argument of the command line
    fn command(&self, pid: u32) -> Option<String> {
        let path = self.root.join(pid.to_string()).join("cmdline");

        let cmdline = fs::read(&path)
            .inspect_err(|err| debug!("Failed to read {path:?}: {err}"))
            .ok()?;

        cmdline
            .split(|&b| b == 0)
            .next()
            .filter(|arg| !arg.is_empty())
            .map(|arg| printable(&String::from_utf8_lossy(arg)))
    }

    // Short executable name, set for kernel threads too
    fn comm(&self, pid: u32) -> Option<String> {
        let path = self.root.join(pid.to_string()).join("comm");

        fs::read_to_string(&path)
            .ok()
            .map(|comm| printable(comm.trim()))
            .filter(|comm| !comm.is_empty())
    }
}

impl Default for ProcfsResolver {
    fn default() -> Self {
        Self::new(UNKNOWN_PROCESS)
    }
}

impl ProcessNameResolver for ProcfsResolver {
    fn process_name(&self, pid: u32) -> String {
        self.command(pid)
            .or_else(|| self.comm(pid))
            .unwrap_or_else(|| self.placeholder.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_process(root: &Path, pid: u32, cmdline: &[u8], comm: &str) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("cmdline"), cmdline).unwrap();
        fs::write(dir.join("comm"), comm).unwrap();
    }

    #[test]
    fn name_from_first_argument() {
        let root = tempfile::tempdir().unwrap();
        fake_process(
            root.path(),
            845093,
            b"/build/scratch/ring_allreduce\0--ranks\04\0",
            "ring_allreduce\n",
        );

        let resolver = ProcfsResolver::with_root(root.path(), UNKNOWN_PROCESS);

        assert_eq!(
            resolver.process_name(845093),
            "/build/scratch/ring_allreduce"
        );
    }

    #[test]
    fn empty_cmdline_falls_back_to_comm() {
        let root = tempfile::tempdir().unwrap();
        fake_process(root.path(), 12, b"", "kworker/0:1\n");

        let resolver = ProcfsResolver::with_root(root.path(), UNKNOWN_PROCESS);

        assert_eq!(resolver.process_name(12), "kworker/0:1");
    }

    #[test]
    fn control_characters_are_replaced() {
        let root = tempfile::tempdir().unwrap();
        fake_process(
            root.path(),
            31337,
            b"evil\n|    0   N/A  N/A         1      C   fake     99999MiB |\0",
            "evil\r\n",
        );
        fake_process(root.path(), 31338, b"", "bad\x1bname\n");

        let resolver = ProcfsResolver::with_root(root.path(), UNKNOWN_PROCESS);
        let name = resolver.process_name(31337);

        assert!(!name.contains('\n'));
        assert!(name.starts_with("evil?|    0"));
        assert!(name.ends_with("99999MiB |"));
        assert_eq!(resolver.process_name(31338), "bad?name");
    }

    #[test]
    fn missing_process_gives_placeholder() {
        let root = tempfile::tempdir().unwrap();

        let resolver = ProcfsResolver::with_root(root.path(), UNKNOWN_PROCESS);

        assert_eq!(resolver.process_name(4242), UNKNOWN_PROCESS);
    }

    #[test]
    fn custom_placeholder() {
        let root = tempfile::tempdir().unwrap();

        let resolver = ProcfsResolver::with_root(root.path(), "N/A");

        assert_eq!(resolver.process_name(1), "N/A");
    }
}
