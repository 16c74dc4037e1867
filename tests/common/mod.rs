#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// An isolated host: artifact directory, install prefix, one extra search
/// directory, an empty `PATH`, and a config file pointing at all of them.
pub struct TestEnv {
    pub dir: TempDir,
    pub source: PathBuf,
    pub prefix: PathBuf,
    pub search: PathBuf,
    pub config: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("builds");
        let prefix = dir.path().join("prefix");
        let search = dir.path().join("search");
        for d in [&source, &prefix, &search, &dir.path().join("path")] {
            fs::create_dir_all(d).unwrap();
        }

        let config = dir.path().join("config.toml");
        fs::write(
            &config,
            format!(
                "search_paths = [{:?}]\nprobe_timeout_secs = 5\n",
                search.display().to_string()
            ),
        )
        .unwrap();

        TestEnv {
            dir,
            source,
            prefix,
            search,
            config,
        }
    }

    /// Add a build artifact that reports `version`.
    pub fn with_build(self, name: &str, version: &str) -> Self {
        write_script(&self.source.join(name), version);
        self
    }

    /// Place an existing install of `ai` reporting `version` in `dir`.
    pub fn with_installed(self, dir: &Path, version: &str) -> Self {
        write_script(&dir.join("ai"), version);
        self
    }

    /// Put a shell-script `name` on the otherwise empty `PATH`.
    pub fn with_tool(self, name: &str, body: &str) -> Self {
        let path = self.dir.path().join("path").join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        self
    }

    pub fn installed_bin(&self) -> PathBuf {
        self.prefix.join("bin").join("ai")
    }

    /// Get a Command configured to run ai-installer in this environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = assert_cmd::cargo_bin_cmd!("ai-installer");
        cmd.env("AI_INSTALLER_CONFIG", &self.config);
        cmd.env("PATH", self.dir.path().join("path"));
        cmd.env_remove("AI_INSTALLER_LOG");
        // Ensure no color codes pollute test output
        cmd.env("NO_COLOR", "1");
        cmd.arg("--prefix").arg(&self.prefix);
        cmd
    }

    /// An install run from the fixture artifacts on a pinned x86_64 profile.
    pub fn install(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.arg("--source").arg(&self.source);
        cmd.args(["--arch", "x86_64"]);
        cmd
    }
}

/// A stand-in for the `ai` CLI: answers `version` and `install-deps`.
pub fn script_body(version: &str) -> String {
    format!(
        "#!/bin/sh\n\
         case \"$1\" in\n  \
           version) echo \"AI CLI v{version}\" ;;\n  \
           install-deps) echo \"installing deps $2\" ;;\n\
         esac\n"
    )
}

pub fn write_script(path: &Path, version: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, script_body(version)).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
