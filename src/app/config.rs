//! Process-wide application configuration (ambient stack, grounded on the
//! teacher's `app::config::AppConfig`).

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub verbose: u8,
    pub working_dir: Option<std::path::PathBuf>,
    pub test_mode: bool,
}

impl AppConfig {
    pub fn new(verbose: u8) -> Self {
        Self {
            verbose,
            working_dir: None,
            test_mode: false,
        }
    }

    pub fn with_working_dir(mut self, dir: std::path::PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Tracing env-filter string for the configured verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "agent_pipeline_tracker=warn",
            1 => "agent_pipeline_tracker=info",
            2 => "agent_pipeline_tracker=debug",
            _ => "agent_pipeline_tracker=trace",
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(0)
    }
}
