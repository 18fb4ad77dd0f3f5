//! The platform half of the tag grammar: which platform tags a target
//! accepts, in priority order.
//!
//! Everything here is pure over explicit version and architecture inputs;
//! detecting those (glibc via the loader, musl via ldd, the macOS SDK, the
//! Android API level) is the platform probe's job.

use serde::{Deserialize, Serialize};

/// A target operating system, carrying the probe-detected versions the tag
/// grammar needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Os {
    /// A glibc Linux, with the detected glibc version.
    Manylinux {
        /// glibc major version.
        major: u16,
        /// glibc minor version.
        minor: u16,
    },
    /// A musl Linux, with the detected musl version.
    Musllinux {
        /// musl major version.
        major: u16,
        /// musl minor version.
        minor: u16,
    },
    /// macOS, with the reported product version.
    Macos {
        /// macOS major version.
        major: u16,
        /// macOS minor version.
        minor: u16,
    },
    /// Windows.
    Windows,
    /// iOS (PEP 730), device or simulator.
    Ios {
        /// iOS major version.
        major: u16,
        /// iOS minor version.
        minor: u16,
        /// Whether this targets the simulator SDK rather than a device.
        simulator: bool,
    },
    /// Android (PEP 738), with the API level.
    Android {
        /// The Android API level, e.g. `21`.
        api_level: u16,
    },
}

/// A target architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
    /// 64-bit ARM.
    Aarch64,
    /// 32-bit ARM (hard-float).
    Armv7L,
    /// Big-endian 64-bit PowerPC.
    Powerpc64,
    /// Little-endian 64-bit PowerPC.
    Powerpc64Le,
    /// 64-bit RISC-V.
    Riscv64,
    /// IBM z/Architecture.
    S390X,
    /// 32-bit x86.
    X86,
    /// 64-bit x86.
    X86_64,
}

impl std::fmt::Display for Arch {
    /// The Linux platform-tag spelling of the architecture.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Aarch64 => "aarch64",
            Self::Armv7L => "armv7l",
            Self::Powerpc64 => "ppc64",
            Self::Powerpc64Le => "ppc64le",
            Self::Riscv64 => "riscv64",
            Self::S390X => "s390x",
            Self::X86 => "i686",
            Self::X86_64 => "x86_64",
        })
    }
}

/// A target platform: operating system plus architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    os: Os,
    arch: Arch,
}

impl Platform {
    /// Create a platform from probe results.
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The operating system.
    pub fn os(&self) -> &Os {
        &self.os
    }

    /// The architecture.
    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// The platform tags this target accepts, most specific first.
    pub fn platform_tags(&self, manylinux: &dyn ManylinuxPolicy) -> Vec<String> {
        let arch = self.arch;
        match &self.os {
            Os::Manylinux { major, minor } => {
                let mut tags =
                    manylinux_platforms((*major, *minor), &arch.to_string(), manylinux);
                tags.push(format!("linux_{arch}"));
                tags
            }
            Os::Musllinux { major, minor } => {
                let mut tags = musllinux_platforms((*major, *minor), &arch.to_string());
                tags.push(format!("linux_{arch}"));
                tags
            }
            Os::Macos { major, minor } => {
                let arch = match arch {
                    Arch::Aarch64 => "arm64",
                    other => return mac_platforms((*major, *minor), &other.to_string()),
                };
                mac_platforms((*major, *minor), arch)
            }
            Os::Windows => windows_platforms(arch),
            Os::Ios {
                major,
                minor,
                simulator,
            } => {
                let arch = match arch {
                    Arch::Aarch64 => "arm64",
                    other => return ios_platforms((*major, *minor), &format!("{other}-{}", ios_sdk(*simulator))),
                };
                ios_platforms((*major, *minor), &format!("{arch}-{}", ios_sdk(*simulator)))
            }
            Os::Android { api_level } => {
                let abi = match arch {
                    Arch::Aarch64 => "arm64_v8a",
                    Arch::Armv7L => "armeabi_v7a",
                    Arch::X86 => "x86",
                    other => return android_platforms(*api_level, &other.to_string()),
                };
                android_platforms(*api_level, abi)
            }
        }
    }
}

fn ios_sdk(simulator: bool) -> &'static str {
    if simulator {
        "iphonesimulator"
    } else {
        "iphoneos"
    }
}

/// The read-only veto hook consulted once per manylinux tag, mirroring the
/// `_manylinux.manylinux_compatible(major, minor, arch)` module interface.
pub trait ManylinuxPolicy {
    /// Whether a `manylinux_<major>_<minor>_<arch>` tag may be offered.
    fn manylinux_compatible(&self, major: u16, minor: u16, arch: &str) -> bool;
}

/// The default policy: every tag the detected glibc version admits.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysCompatible;

impl ManylinuxPolicy for AlwaysCompatible {
    fn manylinux_compatible(&self, _major: u16, _minor: u16, _arch: &str) -> bool {
        true
    }
}

/// The binary formats a macOS wheel may use for the given deployment
/// target and CPU architecture, most specific first.
fn mac_binary_formats(version: (u16, u16), cpu_arch: &str) -> Vec<String> {
    let mut formats = vec![cpu_arch.to_string()];
    match cpu_arch {
        "x86_64" => {
            if version < (10, 4) {
                return Vec::new();
            }
            formats.extend(["intel", "fat64", "fat32"].map(String::from));
        }
        "i386" => {
            if version < (10, 4) {
                return Vec::new();
            }
            formats.extend(["intel", "fat32", "fat"].map(String::from));
        }
        "ppc64" => {
            if version > (10, 5) || version < (10, 4) {
                return Vec::new();
            }
            formats.push("fat64".to_string());
        }
        "ppc" => {
            if version > (10, 6) {
                return Vec::new();
            }
            formats.extend(["fat32", "fat"].map(String::from));
        }
        "universal2" => {
            formats.extend(["x86_64", "arm64", "intel", "fat64", "fat32"].map(String::from));
        }
        _ => {}
    }
    if matches!(cpu_arch, "arm64" | "x86_64") {
        formats.push("universal2".to_string());
    }
    if matches!(cpu_arch, "x86_64" | "i386" | "ppc64" | "ppc" | "intel") {
        formats.push("universal".to_string());
    }
    formats
}

/// The macOS platform tags for a deployment target and architecture,
/// newest to oldest.
///
/// Before macOS 11 the major version was always 10 and the yearly release
/// bumped the minor; from 11 on the major counts up and the tag's minor is
/// always 0. A `universal2` binary can reach back into the 10.x range even
/// on arm64 hosts.
pub fn mac_platforms(version: (u16, u16), arch: &str) -> Vec<String> {
    let mut tags = Vec::new();
    if (10, 0) <= version && version < (11, 0) {
        for minor in (0..=version.1).rev() {
            for format in mac_binary_formats((10, minor), arch) {
                tags.push(format!("macosx_10_{minor}_{format}"));
            }
        }
    }
    if version >= (11, 0) {
        for major in (11..=version.0).rev() {
            for format in mac_binary_formats((major, 0), arch) {
                tags.push(format!("macosx_{major}_0_{format}"));
            }
        }
        if arch == "x86_64" {
            for minor in (4..=16).rev() {
                for format in mac_binary_formats((10, minor), arch) {
                    tags.push(format!("macosx_10_{minor}_{format}"));
                }
            }
        } else {
            for minor in (4..=16).rev() {
                tags.push(format!("macosx_10_{minor}_universal2"));
            }
        }
    }
    tags
}

/// The `manylinux2014`/`manylinux2010`/`manylinux1` spellings of the glibc
/// versions they pinned.
fn legacy_manylinux_alias(major: u16, minor: u16) -> Option<&'static str> {
    match (major, minor) {
        (2, 17) => Some("manylinux2014"),
        (2, 12) => Some("manylinux2010"),
        (2, 5) => Some("manylinux1"),
        _ => None,
    }
}

/// The manylinux platform tags for a detected glibc version, newest to
/// oldest, each followed by its legacy alias where one exists. The policy
/// hook can veto individual tags.
///
/// The x86 architectures go back to glibc 2.5 (`manylinux1`); everything
/// else starts at glibc 2.17 (`manylinux2014`).
pub fn manylinux_platforms(
    glibc_version: (u16, u16),
    arch: &str,
    policy: &dyn ManylinuxPolicy,
) -> Vec<String> {
    let oldest_minor = if matches!(arch, "x86_64" | "i686") {
        5
    } else {
        17
    };
    let mut series = vec![glibc_version];
    for major in (3..=glibc_version.0).rev().skip(1) {
        // Hypothetical older major series; 50 bounds their minors safely.
        series.push((major, 50));
    }
    if glibc_version.0 > 2 {
        series.push((2, 50));
    }

    let mut tags = Vec::new();
    for (major, max_minor) in series {
        let floor = if major == 2 { oldest_minor } else { 0 };
        for minor in (floor..=max_minor).rev() {
            if policy.manylinux_compatible(major, minor, arch) {
                tags.push(format!("manylinux_{major}_{minor}_{arch}"));
                if let Some(alias) = legacy_manylinux_alias(major, minor) {
                    tags.push(format!("{alias}_{arch}"));
                }
            }
        }
    }
    tags
}

/// The musllinux platform tags for a detected musl version, newest to
/// oldest.
pub fn musllinux_platforms(musl_version: (u16, u16), arch: &str) -> Vec<String> {
    let (major, minor) = musl_version;
    (0..=minor)
        .rev()
        .map(|minor| format!("musllinux_{major}_{minor}_{arch}"))
        .collect()
}

/// The Windows platform tag for a machine architecture.
pub fn windows_platforms(arch: Arch) -> Vec<String> {
    vec![match arch {
        Arch::X86 => "win32".to_string(),
        Arch::X86_64 => "win_amd64".to_string(),
        Arch::Aarch64 => "win_arm64".to_string(),
        other => format!("win_{other}"),
    }]
}

/// The iOS platform tags for a deployment target and multiarch (e.g.
/// `arm64-iphoneos`), newest to oldest, down to iOS 12.0 (PEP 730). Older
/// majors enumerate minors up to 9 so no point release is missed.
pub fn ios_platforms(version: (u16, u16), multiarch: &str) -> Vec<String> {
    let multiarch = multiarch.replace('-', "_");
    let mut tags = Vec::new();
    for major in (12..=version.0).rev() {
        let newest_minor = if major < version.0 { 9 } else { version.1 };
        for minor in (0..=newest_minor).rev() {
            tags.push(format!("ios_{major}_{minor}_{multiarch}"));
        }
    }
    tags
}

/// The Android platform tags for an API level and ABI, newest to oldest,
/// down to API level 16 (PEP 738).
pub fn android_platforms(api_level: u16, abi: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut level = api_level;
    while level >= 16 {
        tags.push(format!("android_{level}_{abi}"));
        level -= 1;
    }
    tags
}
