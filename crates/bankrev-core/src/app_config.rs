use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// YAML file listing the organizations and localities to harvest.
    pub targets_path: PathBuf,
    /// Directory receiving `final_*` / `progress_*` output files.
    pub output_dir: PathBuf,
    /// ChromeDriver (or any W3C WebDriver) endpoint.
    pub webdriver_url: String,
    pub headless: bool,
    /// Budget for the rendering service to reach an expected state.
    pub wait_time_secs: u64,
    /// Testing aid: stop after this many branches per organization.
    pub max_branches_per_org: Option<usize>,
    pub branch_delay_ms: u64,
    pub locality_delay_ms: u64,
    pub organization_delay_ms: u64,
    /// Write a `progress_` checkpoint after each organization.
    pub progress_saves: bool,
}
