//! Simulated security tools. Nothing here touches the network or computes a real hash.

pub mod hash_crack;
pub mod password;
pub mod port_scan;

pub use hash_crack::{CrackOutcome, HashCracker, HASH_TYPES, KNOWN_DIGEST, KNOWN_PLAINTEXT};
pub use password::{generate_password, CharClass, PasswordPolicy};
pub use port_scan::{parse_ports, PortScanner, PortVerdict, ScanReport, Verdict};
