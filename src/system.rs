use std::collections::HashMap;
use std::fs;
use std::net::UdpSocket;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use sysinfo::{Disks, System};
use tracing::debug;

use crate::config::Config;

pub struct DistroInfo {
    pub id: String,
    pub long_name: String,
    pub short_name: String,
}

pub struct Memory {
    pub total_mib: u64,
    pub used_mib: u64,
    pub free_mib: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub device: String,
    pub mount_point: String,
    pub label: Option<String>,
    pub fs_type: String,
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

/// Everything handed to the fetch script. Probes that fail leave their field
/// empty rather than failing the run.
pub struct SystemInfo {
    pub distro: DistroInfo,
    pub cpu_model: String,
    pub cpu_threads: usize,
    pub memory: Option<Memory>,
    pub partitions: Vec<Partition>,
    pub de_wm: String,
    pub user_shell: String,
    pub display_protocol: String,
    pub init_system: String,
    pub motherboard: String,
    pub libc: String,
    pub local_ipv4: String,
    pub monitors: Vec<String>,
    pub gpus: Vec<String>,
    pub show_fs_type: bool,
}

/// Runs `f`, printing how long it took when `report` is on.
fn timed<T>(report: bool, key: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let value = f();
    if report {
        println!("Setting '{}' took {} milliseconds", key, start.elapsed().as_millis());
    }
    value
}

impl SystemInfo {
    pub fn collect(config: &Config, distro: DistroInfo, report_time: bool) -> Self {
        let mut sys = System::new();

        let (cpu_model, cpu_threads) = timed(report_time, "CPU_*", || {
            sys.refresh_cpu();
            let model = sys
                .cpus()
                .first()
                .map(|c| c.brand().trim().to_string())
                .unwrap_or_default();
            (model, sys.cpus().len())
        });
        let memory = timed(report_time, "MEM_*", || {
            sys.refresh_memory();
            memory_from(sys.total_memory(), sys.available_memory())
        });
        let partitions = timed(report_time, "PARTITION_*", || {
            filter_partitions(mounted_partitions(), config)
        });
        let de_wm = timed(report_time, "DE_WM", || {
            sys.refresh_processes();
            let names: Vec<&str> = sys.processes().values().map(|p| p.name()).collect();
            desktop_environment(&names)
        });
        let user_shell = timed(report_time, "USER_SHELL", user_shell);
        let display_protocol = timed(report_time, "DISPLAY_PROTOCOL", || {
            display_protocol(std::env::var("XDG_SESSION_TYPE").ok().as_deref())
        });
        let init_system = timed(report_time, "INIT_SYSTEM", init_system);
        let motherboard = timed(report_time, "MOTHERBOARD", motherboard);
        let libc = timed(report_time, "LIBC", libc);
        let local_ipv4 = timed(report_time, "LOCAL_IPV4", || get_local_ip().unwrap_or_default());
        let monitors = timed(report_time, "MONITOR_*", monitors);
        let gpus = timed(report_time, "GPU_*", || hide_gpus(gpus(), &config.hidden_gpus));

        SystemInfo {
            distro,
            cpu_model,
            cpu_threads,
            memory,
            partitions,
            de_wm,
            user_shell,
            display_protocol,
            init_system,
            motherboard,
            libc,
            local_ipv4,
            monitors,
            gpus,
            show_fs_type: config.show_fs_type,
        }
    }

    /// Environment variables for the fetch script, in a stable order.
    pub fn to_env(&self) -> Vec<(String, String)> {
        let mut env = Vec::new();
        let mut set = |key: &str, value: String| env.push((key.to_string(), value));

        set("DISTRO_LONG_NAME", self.distro.long_name.clone());
        set("DISTRO_SHORT_NAME", self.distro.short_name.clone());
        set("CPU_MODEL", self.cpu_model.clone());
        set("CPU_THREADS", self.cpu_threads.to_string());
        if let Some(mem) = &self.memory {
            set("MEM_TOTAL", mem.total_mib.to_string());
            set("MEM_USED", mem.used_mib.to_string());
            set("MEM_FREE", mem.free_mib.to_string());
        }
        if !self.partitions.is_empty() {
            set("MOUNTED_PARTITIONS", self.partitions.len().to_string());
            for (i, part) in self.partitions.iter().enumerate() {
                let n = i + 1;
                set(&format!("PARTITION{}_DEVICE", n), part.device.clone());
                set(&format!("PARTITION{}_MOUNTPOINT", n), part.mount_point.clone());
                if let Some(label) = &part.label {
                    set(&format!("PARTITION{}_LABEL", n), label.clone());
                }
                if self.show_fs_type && !part.fs_type.is_empty() {
                    set(&format!("PARTITION{}_TYPE", n), part.fs_type.clone());
                }
                set(&format!("PARTITION{}_TOTAL_SIZE", n), format_bytes(part.total));
                set(&format!("PARTITION{}_USED_SIZE", n), format_bytes(part.used));
                set(&format!("PARTITION{}_FREE_SIZE", n), format_bytes(part.free));
            }
        }
        set("DE_WM", self.de_wm.clone());
        set("USER_SHELL", self.user_shell.clone());
        set("DISPLAY_PROTOCOL", self.display_protocol.clone());
        set("INIT_SYSTEM", self.init_system.clone());
        set("MOTHERBOARD", self.motherboard.clone());
        set("LIBC", self.libc.clone());
        set("LOCAL_IPV4", self.local_ipv4.clone());
        if !self.monitors.is_empty() {
            set("CONNECTED_MONITORS", self.monitors.len().to_string());
            for (i, monitor) in self.monitors.iter().enumerate() {
                set(&format!("MONITOR{}", i + 1), monitor.clone());
            }
        }
        if !self.gpus.is_empty() {
            set("CONNECTED_GPUS", self.gpus.len().to_string());
            for (i, gpu) in self.gpus.iter().enumerate() {
                set(&format!("GPU{}", i + 1), gpu.clone());
            }
        }
        env
    }
}

// KEY=value files like /etc/os-release, surrounding quotes dropped
pub fn parse_key_value(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            (key.to_string(), value.to_string())
        })
        .collect()
}

pub fn distro_info(name_override: &str) -> DistroInfo {
    let release = fs::read_to_string("/etc/os-release")
        .map(|content| parse_key_value(&content))
        .unwrap_or_else(|e| {
            debug!(error = %e, "no /etc/os-release");
            HashMap::new()
        });
    distro_from_release(&release, name_override)
}

fn distro_from_release(release: &HashMap<String, String>, name_override: &str) -> DistroInfo {
    let name_override = name_override.trim();

    if release.is_empty() {
        // no os-release, macOS and friends
        let os = os_info::get();
        let id = os.os_type().to_string().to_lowercase().replace(' ', "");
        if !name_override.is_empty() {
            return DistroInfo {
                id,
                long_name: name_override.to_string(),
                short_name: name_override.to_string(),
            };
        }
        return DistroInfo {
            id,
            long_name: format!("{} {}", os.os_type(), os.version()),
            short_name: os.os_type().to_string(),
        };
    }

    let pick = |key: &str| {
        if !name_override.is_empty() {
            return name_override.to_string();
        }
        release.get(key).cloned().unwrap_or_else(|| "Unknown".to_string())
    };
    DistroInfo {
        id: release.get("ID").cloned().unwrap_or_else(|| "unknown".to_string()),
        long_name: pick("PRETTY_NAME"),
        short_name: pick("NAME"),
    }
}

fn memory_from(total_bytes: u64, available_bytes: u64) -> Option<Memory> {
    if total_bytes == 0 {
        return None;
    }
    let total_mib = total_bytes / 1024 / 1024;
    let free_mib = available_bytes / 1024 / 1024;
    Some(Memory {
        total_mib,
        used_mib: total_mib.saturating_sub(free_mib),
        free_mib,
    })
}

fn mounted_partitions() -> Vec<Partition> {
    let labels = partition_labels();
    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter_map(|disk| {
            let device = disk.name().to_string_lossy().to_string();
            if !device.starts_with("/dev/") {
                return None;
            }
            let total = disk.total_space();
            let free = disk.available_space();
            let canonical = fs::canonicalize(&device).unwrap_or_else(|_| PathBuf::from(&device));
            Some(Partition {
                label: labels.get(&canonical).cloned(),
                device,
                mount_point: disk.mount_point().display().to_string(),
                fs_type: disk.file_system().to_string_lossy().to_string(),
                total,
                used: total.saturating_sub(free),
                free,
            })
        })
        .collect()
}

fn partition_labels() -> HashMap<PathBuf, String> {
    let Ok(entries) = fs::read_dir("/dev/disk/by-partlabel") else {
        return HashMap::new();
    };
    entries
        .flatten()
        .filter_map(|entry| {
            let target = fs::canonicalize(entry.path()).ok()?;
            Some((target, entry.file_name().to_string_lossy().to_string()))
        })
        .collect()
}

fn filter_partitions(partitions: Vec<Partition>, config: &Config) -> Vec<Partition> {
    partitions
        .into_iter()
        .filter(|p| {
            !config.hidden_partitions.contains(&p.device)
                && !config.hidden_partitions.contains(&p.mount_point)
                && !config.hidden_filesystems.contains(&p.fs_type)
        })
        .collect()
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut value = bytes as f64;
    for unit in UNITS {
        if value.abs() < 1024.0 {
            return format!("{:3.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} EiB", value)
}

// (process, label, version command, args, whitespace field holding the version)
const DESKTOPS: &[(&str, &str, Option<(&str, &[&str], usize)>)] = &[
    ("plasmashell", "KDE Plasma", Some(("plasmashell", &["--version"], 1))),
    ("gnome-session", "Gnome", Some(("gnome-shell", &["--version"], 2))),
    ("xfce4-session", "XFCE", Some(("xfce4-session", &["--version"], 1))),
    ("cinnamon", "Cinnamon", Some(("cinnamon", &["--version"], 1))),
    ("mate-panel", "MATE", Some(("mate-about", &["--version"], 3))),
    ("lxsession", "LXDE", None),
    ("sway", "Sway", Some(("sway", &["--version"], 2))),
    ("bspwm", "Bspwm", Some(("bspwm", &["-v"], 0))),
    ("icewm-session", "IceWM", Some(("icewm", &["--version"], 1))),
];

fn desktop_environment(process_names: &[&str]) -> String {
    let Some((_, label, version_cmd)) = DESKTOPS
        .iter()
        .find(|(process, _, _)| process_names.contains(process))
    else {
        return String::new();
    };
    match version_cmd.and_then(|(cmd, args, field)| command_field(cmd, args, field)) {
        Some(version) => format!("{} {}", label, version),
        None => label.to_string(),
    }
}

/// Nth whitespace separated field of the first line `cmd` prints.
fn command_field(cmd: &str, args: &[&str], field: usize) -> Option<String> {
    let output = Command::new(cmd).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    nth_field(&String::from_utf8_lossy(&output.stdout), field)
}

fn nth_field(stdout: &str, field: usize) -> Option<String> {
    stdout
        .lines()
        .next()?
        .split_whitespace()
        .nth(field)
        .map(|s| s.trim_end_matches(',').to_string())
}

fn user_shell() -> String {
    let username = whoami::username();
    let shell = fs::read_to_string("/etc/passwd")
        .ok()
        .and_then(|passwd| login_shell(&passwd, &username));
    let Some(shell) = shell else {
        return String::new();
    };
    let name = Path::new(&shell)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let version = match name.as_str() {
        "bash" => Command::new(&shell)
            .args(["-c", "echo $BASH_VERSION"])
            .output()
            .ok()
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string()),
        "zsh" => command_field(&shell, &["--version"], 1),
        "fish" => command_field(&shell, &["--version"], 2),
        _ => None,
    };
    shell_label(&name, version.as_deref())
}

fn login_shell(passwd: &str, username: &str) -> Option<String> {
    passwd
        .lines()
        .map(|line| line.split(':').collect::<Vec<_>>())
        .find(|fields| fields.len() >= 7 && fields[0] == username)
        .map(|fields| fields[6].to_string())
}

fn shell_label(name: &str, version: Option<&str>) -> String {
    let pretty = match name {
        "dash" => return "Dash".to_string(),
        "bash" => "Bash",
        "zsh" => "Zsh",
        "fish" => "Fish",
        _ => return "Unknown".to_string(),
    };
    match version {
        Some(v) if !v.is_empty() => format!("{} {}", pretty, v),
        _ => pretty.to_string(),
    }
}

fn display_protocol(session_type: Option<&str>) -> String {
    match session_type {
        Some("x11") => "X11".to_string(),
        Some("wayland") => "Wayland".to_string(),
        _ => String::new(),
    }
}

fn init_system() -> String {
    fs::read_to_string("/proc/1/comm")
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn motherboard() -> String {
    let read = |file: &str| {
        fs::read_to_string(Path::new("/sys/devices/virtual/dmi/id").join(file))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };
    let parts: Vec<String> = [read("board_vendor"), read("board_name")]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    parts.join(" ")
}

fn libc() -> String {
    // musl's ldd prints its banner on stderr and exits non-zero
    let output = match Command::new("ldd").arg("--version").output() {
        Ok(output) => output,
        Err(e) => {
            debug!(error = %e, "ldd not available");
            return String::new();
        }
    };
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    parse_libc(&text).unwrap_or_default()
}

fn parse_libc(ldd_version: &str) -> Option<String> {
    let first = ldd_version.lines().next()?;
    if first.starts_with("musl") {
        let version = ldd_version
            .lines()
            .find_map(|line| line.strip_prefix("Version "))
            .map(str::trim);
        return Some(match version {
            Some(v) => format!("musl {}", v),
            None => "musl".to_string(),
        });
    }
    if first.contains("GLIBC") || first.contains("GNU libc") {
        let version = first.split_whitespace().last()?;
        return Some(format!("glibc {}", version));
    }
    None
}

fn get_local_ip() -> Option<String> {
    // connecting a UDP socket sends nothing, it just picks the outbound interface
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|sock| {
            sock.connect("8.8.8.8:80")?;
            sock.local_addr()
        })
        .ok()
        .map(|addr| addr.ip().to_string())
}

/// Preferred mode of every connected DRM connector.
fn monitors() -> Vec<String> {
    let Ok(entries) = fs::read_dir("/sys/class/drm") else {
        return Vec::new();
    };
    let mut connectors: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("card") && n.contains('-'))
        })
        .collect();
    connectors.sort();
    connectors
        .iter()
        .filter(|p| {
            fs::read_to_string(p.join("status")).is_ok_and(|s| s.trim() == "connected")
        })
        .filter_map(|p| {
            let modes = fs::read_to_string(p.join("modes")).ok()?;
            modes.lines().next().map(|m| m.trim().to_string())
        })
        .filter(|m| !m.is_empty())
        .collect()
}

fn gpus() -> Vec<String> {
    if let Ok(output) = Command::new("lspci").output() {
        let found = parse_lspci(&String::from_utf8_lossy(&output.stdout));
        if !found.is_empty() {
            return found;
        }
    }

    // no lspci, fall back to raw PCI ids
    let Ok(entries) = fs::read_dir("/sys/bus/pci/devices") else {
        return Vec::new();
    };
    let mut devices: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
    devices.sort();
    devices
        .iter()
        .filter(|path| {
            fs::read_to_string(path.join("class")).is_ok_and(|c| c.trim().starts_with("0x03"))
        })
        .filter_map(|path| {
            let vendor = fs::read_to_string(path.join("vendor")).ok()?;
            let device = fs::read_to_string(path.join("device")).ok()?;
            Some(format!("PCI {}:{}", vendor.trim(), device.trim()))
        })
        .collect()
}

fn parse_lspci(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| {
            line.contains(" VGA compatible controller")
                || line.contains(" 3D controller")
                || line.contains(" Display controller")
        })
        .filter_map(|line| {
            // "00:02.0 VGA compatible controller: Intel Corporation ..."
            let (_, name) = line.split_once(": ")?;
            Some(name.trim().to_string())
        })
        .collect()
}

/// `hidden` holds 1-based GPU indices.
fn hide_gpus(gpus: Vec<String>, hidden: &[usize]) -> Vec<String> {
    gpus.into_iter()
        .enumerate()
        .filter(|(i, _)| !hidden.contains(&(i + 1)))
        .map(|(_, gpu)| gpu)
        .collect()
}
