//! Identity of the simulated host.

use serde::{Deserialize, Serialize};

/// What `hostname`, `uname` and the prompt report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    /// Fully qualified name.
    pub hostname: String,
    pub short_name: String,
    pub domain_name: String,
    pub kernel_release: String,
    pub kernel_version: String,
    pub machine: String,
    /// `$0` of the simulated shell, used in diagnostics.
    pub shell_name: String,
}

impl HostInfo {
    /// Host named `fqdn`; short and domain names are split from it.
    pub fn new(fqdn: impl Into<String>) -> Self {
        let hostname = fqdn.into();
        let (short_name, domain_name) = match hostname.split_once('.') {
            Some((short, domain)) => (short.to_string(), domain.to_string()),
            None => (hostname.clone(), String::new()),
        };
        Self {
            hostname,
            short_name,
            domain_name,
            kernel_release: "6.1.0-18-amd64".to_string(),
            kernel_version: "#1 SMP PREEMPT_DYNAMIC Debian 6.1.76-1 (2024-02-01)".to_string(),
            machine: "x86_64".to_string(),
            shell_name: "-bash".to_string(),
        }
    }

    /// `$SHELL`-style name without the login dash.
    pub fn shell_path(&self) -> String {
        format!("/bin/{}", self.shell_name.trim_start_matches('-'))
    }
}

impl Default for HostInfo {
    fn default() -> Self {
        Self::new("localhost.localdomain")
    }
}
