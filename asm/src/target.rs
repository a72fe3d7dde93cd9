use std::{env::consts::OS, fmt::Display, str::FromStr};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingSystem {
    Linux,
    MacOs,
}

impl OperatingSystem {
    /// The os this binary was built for. Unknown hosts get the Linux conventions.
    pub fn host() -> Self {
        if OS == "macos" {
            OperatingSystem::MacOs
        } else {
            OperatingSystem::Linux
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown operating system \"{0}\", expected \"linux\" or \"macos\"")]
pub struct TargetParseError(pub String);

impl FromStr for OperatingSystem {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linux" => Ok(OperatingSystem::Linux),
            "macos" | "darwin" => Ok(OperatingSystem::MacOs),
            _ => Err(TargetParseError(s.to_owned())),
        }
    }
}

impl Display for OperatingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatingSystem::Linux => write!(f, "linux"),
            OperatingSystem::MacOs => write!(f, "macos"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Architecture {
    #[default]
    X86_64,
}

/// Everything the backend needs to know about the machine it generates code for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetContext {
    pub os: OperatingSystem,
    pub arch: Architecture,
}

impl TargetContext {
    pub fn new(os: OperatingSystem) -> Self {
        Self {
            os,
            arch: Architecture::X86_64,
        }
    }

    /// Number of the `exit` system call, loaded into rax before `syscall`.
    pub fn exit_syscall(&self) -> u64 {
        match self.os {
            OperatingSystem::Linux => 60,
            // BSD syscall class (2 << 24) | SYS_exit
            OperatingSystem::MacOs => 0x2000001,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_os() {
        assert_eq!("linux".parse::<OperatingSystem>(), Ok(OperatingSystem::Linux));
        assert_eq!("MacOS".parse::<OperatingSystem>(), Ok(OperatingSystem::MacOs));
        assert_eq!(
            "windows".parse::<OperatingSystem>(),
            Err(TargetParseError("windows".to_owned()))
        );
    }

    #[test]
    fn test_exit_syscall() {
        assert_eq!(TargetContext::new(OperatingSystem::Linux).exit_syscall(), 60);
        assert_eq!(
            TargetContext::new(OperatingSystem::MacOs).exit_syscall(),
            33554433
        );
    }
}
