//! System status snapshot

use super::{SkillError, SkillGroup};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use sysinfo::{Disks, System};

pub fn group() -> SkillGroup {
    SkillGroup::new("monitoring").with_nullary("check_status", check_status)
}

/// Report CPU, memory, disk and process count; `summary` is what gets spoken
fn check_status() -> Result<Value, SkillError> {
    Ok(Snapshot::collect().report())
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryUsage {
    pub total: u64,
    pub used: u64,
    pub available: u64,
}

impl MemoryUsage {
    pub fn percent(&self) -> f64 {
        percent_of(self.used, self.total)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiskUsage {
    pub mount_point: PathBuf,
    pub total: u64,
    pub free: u64,
}

impl DiskUsage {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.free)
    }
}

/// One reading of the machine's load
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub cpu_percent: f32,
    pub memory: MemoryUsage,
    /// Disk holding the working directory, if any disk is visible
    pub disk: Option<DiskUsage>,
    pub processes: usize,
}

impl Snapshot {
    pub fn collect() -> Self {
        let mut system = System::new_all();
        // CPU usage is a delta between two refreshes
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu();

        let memory = MemoryUsage {
            total: system.total_memory(),
            used: system.used_memory(),
            available: system.available_memory(),
        };

        let disks = Disks::new_with_refreshed_list();
        let cwd = std::env::current_dir().unwrap_or_default();
        let mounts: Vec<DiskUsage> = disks
            .list()
            .iter()
            .map(|disk| DiskUsage {
                mount_point: disk.mount_point().to_path_buf(),
                total: disk.total_space(),
                free: disk.available_space(),
            })
            .collect();

        Self {
            cpu_percent: system.global_cpu_info().cpu_usage(),
            memory,
            disk: disk_for(&cwd, mounts),
            processes: system.processes().len(),
        }
    }

    /// `{"status": {...}, "summary": "..."}` as returned to the dispatcher
    pub fn report(&self) -> Value {
        let mut summary = format!(
            "CPU {:.0}% • RAM {:.0}% ({}/{})",
            self.cpu_percent,
            self.memory.percent(),
            format_bytes(self.memory.used),
            format_bytes(self.memory.total)
        );
        if let Some(disk) = &self.disk {
            summary.push_str(&format!(
                " • Disk {} {}/{} free {}",
                disk.mount_point.display(),
                format_bytes(disk.used()),
                format_bytes(disk.total),
                format_bytes(disk.free)
            ));
        }
        summary.push_str(&format!(" • {} processes", self.processes));

        let disk = self.disk.as_ref().map(|disk| {
            json!({
                "drive": disk.mount_point.display().to_string(),
                "total": format_bytes(disk.total),
                "used": format_bytes(disk.used()),
                "free": format_bytes(disk.free),
            })
        });

        json!({
            "status": {
                "cpu_percent": self.cpu_percent,
                "mem": {
                    "total": format_bytes(self.memory.total),
                    "used": format_bytes(self.memory.used),
                    "available": format_bytes(self.memory.available),
                    "percent": self.memory.percent(),
                },
                "disk": disk,
                "processes": self.processes,
            },
            "summary": summary,
        })
    }
}

/// The mount with the longest mount point containing `path`, else the first
fn disk_for(path: &Path, mounts: Vec<DiskUsage>) -> Option<DiskUsage> {
    let containing = mounts
        .iter()
        .filter(|disk| path.starts_with(&disk.mount_point))
        .max_by_key(|disk| disk.mount_point.components().count())
        .cloned();
    containing.or_else(|| mounts.into_iter().next())
}

fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if value < 1024.0 {
            return format!("{:.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} PB", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn disk(mount: &str, total: u64, free: u64) -> DiskUsage {
        DiskUsage {
            mount_point: PathBuf::from(mount),
            total,
            free,
        }
    }

    fn sample() -> Snapshot {
        Snapshot {
            cpu_percent: 12.4,
            memory: MemoryUsage {
                total: 16 * GIB,
                used: 4 * GIB,
                available: 12 * GIB,
            },
            disk: Some(disk("/", 500 * GIB, 200 * GIB)),
            processes: 312,
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512.0 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(8 * GIB), "8.0 GB");
    }

    #[test]
    fn test_report_summary() {
        let report = sample().report();
        assert_eq!(
            report["summary"],
            "CPU 12% • RAM 25% (4.0 GB/16.0 GB) • Disk / 300.0 GB/500.0 GB free 200.0 GB • 312 processes"
        );
    }

    #[test]
    fn test_report_status_fields() {
        let report = sample().report();
        let status = &report["status"];
        assert!((status["cpu_percent"].as_f64().unwrap() - 12.4).abs() < 0.01);
        assert_eq!(status["mem"]["used"], "4.0 GB");
        assert_eq!(status["mem"]["available"], "12.0 GB");
        assert_eq!(status["mem"]["percent"], 25.0);
        assert_eq!(status["disk"]["drive"], "/");
        assert_eq!(status["disk"]["free"], "200.0 GB");
        assert_eq!(status["processes"], 312);
    }

    #[test]
    fn test_report_without_disk() {
        let snapshot = Snapshot {
            disk: None,
            ..sample()
        };
        let report = snapshot.report();
        assert!(report["status"]["disk"].is_null());
        assert!(!report["summary"].as_str().unwrap().contains("Disk"));
    }

    #[test]
    fn test_disk_for_prefers_deepest_mount() {
        let mounts = vec![disk("/", 10, 5), disk("/home", 20, 10), disk("/boot", 1, 1)];
        let chosen = disk_for(Path::new("/home/halo/project"), mounts).unwrap();
        assert_eq!(chosen.mount_point, PathBuf::from("/home"));
    }

    #[test]
    fn test_disk_for_falls_back_to_first() {
        let mounts = vec![disk("/mnt/a", 10, 5), disk("/mnt/b", 20, 10)];
        let chosen = disk_for(Path::new("/elsewhere"), mounts).unwrap();
        assert_eq!(chosen.mount_point, PathBuf::from("/mnt/a"));
        assert_eq!(disk_for(Path::new("/"), Vec::new()), None);
    }

    #[test]
    fn test_check_status_reports_live_fields() {
        let report = check_status().unwrap();
        let status = &report["status"];
        assert!(status["cpu_percent"].is_number());
        assert!(status["processes"].as_u64().unwrap() >= 1);
        assert!(status["mem"]["total"].is_string());
        let summary = report["summary"].as_str().unwrap();
        assert!(summary.starts_with("CPU "));
        assert!(summary.contains("processes"));
    }
}
