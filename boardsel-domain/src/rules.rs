use crate::classify::IgnoreReason;
use boardsel_types::Architecture;
use std::collections::BTreeMap;

/// Static lookup tables the classifier and partitioner run against.
///
/// Built once per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    /// Port -> architecture bucket. Ports missing here are never partitioned.
    pub port_arch: BTreeMap<String, Architecture>,

    /// Exact paths that never influence board builds.
    pub ignore_files: Vec<String>,

    /// Path prefixes that never influence board builds.
    pub ignore_dirs: Vec<String>,

    /// Host-simulation port; changes under it never add boards.
    pub host_port: String,

    pub frozen_prefix: String,
    pub supervisor_prefix: String,
    pub web_workflow_static_dir: String,
}

impl Default for RuleSet {
    fn default() -> Self {
        let port_arch = [
            ("atmel-samd", Architecture::Arm),
            ("broadcom", Architecture::Aarch),
            ("cxd56", Architecture::Arm),
            ("espressif", Architecture::Espressif),
            ("litex", Architecture::Riscv),
            ("mimxrt10xx", Architecture::Arm),
            ("nrf", Architecture::Arm),
            ("raspberrypi", Architecture::Arm),
            ("stm", Architecture::Arm),
        ]
        .into_iter()
        .map(|(p, a)| (p.to_string(), a))
        .collect();

        Self {
            port_arch,
            ignore_files: vec![
                "tools/ci_set_matrix.py".to_string(),
                "tools/ci_check_duplicate_usb_vid_pid.py".to_string(),
            ],
            ignore_dirs: vec![
                "tests".to_string(),
                "docs".to_string(),
                ".devcontainer".to_string(),
            ],
            host_port: "unix".to_string(),
            frozen_prefix: "frozen".to_string(),
            supervisor_prefix: "supervisor".to_string(),
            web_workflow_static_dir: "supervisor/shared/web_workflow/static/".to_string(),
        }
    }
}

impl RuleSet {
    pub fn arch_for_port(&self, port: &str) -> Option<Architecture> {
        self.port_arch.get(port).copied()
    }

    pub fn ignore_reason(&self, path: &str) -> Option<IgnoreReason> {
        if self.ignore_files.iter().any(|f| f == path) {
            return Some(IgnoreReason::File);
        }
        if self.ignore_dirs.iter().any(|d| path.starts_with(d.as_str())) {
            return Some(IgnoreReason::Dir);
        }
        None
    }
}
