//! Build environment selected once per process.

/// How engines are built and named on the current platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Build program, run inside the source root.
    pub make_program: String,

    /// Arguments passed to `make_program`.
    pub make_args: Vec<String>,

    /// Suffix appended to executable names (`.exe` on Windows).
    pub exe_suffix: String,

    /// Name of the match tool archive in the asset index.
    pub match_tool_archive: String,
}

impl Platform {
    /// Resolve the configuration for the platform this binary was built for.
    pub fn detect() -> Self {
        if cfg!(windows) {
            Self::windows()
        } else {
            Self::posix()
        }
    }

    pub fn posix() -> Self {
        Self {
            make_program: "make".to_string(),
            make_args: ["build", "ARCH=x86-64-modern", "COMP=gcc"]
                .map(String::from)
                .to_vec(),
            exe_suffix: String::new(),
            match_tool_archive: "cutechess-cli-linux.zip".to_string(),
        }
    }

    pub fn windows() -> Self {
        Self {
            make_program: "mingw32-make".to_string(),
            make_args: ["build", "ARCH=x86-64-modern", "COMP=mingw"]
                .map(String::from)
                .to_vec(),
            exe_suffix: ".exe".to_string(),
            match_tool_archive: "cutechess-cli-win.zip".to_string(),
        }
    }

    /// Builder method to replace the build command.
    pub fn with_make_command(
        mut self,
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.make_program = program.into();
        self.make_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Name of an executable on this platform.
    pub fn exe_name(&self, stem: &str) -> String {
        format!("{}{}", stem, self.exe_suffix)
    }

    /// Binary produced by the build in the source root.
    pub fn engine_binary(&self) -> String {
        self.exe_name("stockfish")
    }
}
