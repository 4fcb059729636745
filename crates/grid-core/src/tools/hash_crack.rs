//! Simulated hash cracker: a scripted narrative around one hard-coded MD5 digest.
//!
//! No hashing happens here. The only comparison is a string equality against [`KNOWN_DIGEST`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::CrackSettings;
use crate::terminal::{Fragment, SurfaceId, TerminalWriter, Tone, WriteMode};

const SURFACE: SurfaceId = SurfaceId::HashCrack;

/// The one digest present in the "dictionary" (MD5 of `123456`).
pub const KNOWN_DIGEST: &str = "e10adc3949ba59abbe56e057f20f883e";
pub const KNOWN_PLAINTEXT: &str = "123456";
pub const SUPPORTED_TYPE: &str = "md5";

/// Hash types offered by the dashboard selector.
pub const HASH_TYPES: [&str; 3] = ["md5", "sha1", "sha256"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrackOutcome {
    Unsupported,
    NotFound,
    Recovered(String),
}

pub struct HashCracker {
    settings: CrackSettings,
}

impl HashCracker {
    pub fn new(settings: CrackSettings) -> Self {
        Self { settings }
    }

    pub async fn run<W>(&self, digest: &str, hash_type: &str, out: &mut W) -> CrackOutcome
    where
        W: TerminalWriter + Send,
    {
        out.clear_and_write(SURFACE, &format!("> Cracking {} hash: {}\n", hash_type, digest));

        if hash_type != SUPPORTED_TYPE {
            out.write(
                SURFACE,
                vec![Fragment::toned(
                    "> ERROR: This simulated tool can only crack MD5 hashes.\n",
                    Tone::Error,
                )],
                WriteMode::Append,
            );
            return CrackOutcome::Unsupported;
        }

        tracing::info!(hash_type, "simulated hash crack started");
        out.append(SURFACE, "> Analyzing hash...\n");
        pause(self.settings.analyze_ms).await;

        if digest != KNOWN_DIGEST {
            out.append(SURFACE, "> Brute-forcing... (This may take a while)\n");
            pause(self.settings.brute_force_ms).await;
            out.append(SURFACE, "> HASH NOT FOUND IN DICTIONARY.\n");
            return CrackOutcome::NotFound;
        }

        out.append(SURFACE, "> Hash found in common password dictionary!\n");
        pause(self.settings.found_ms).await;
        out.write(
            SURFACE,
            vec![
                Fragment::plain("> SUCCESS! HASH DECRYPTED: "),
                Fragment::toned(KNOWN_PLAINTEXT, Tone::Accent),
                Fragment::plain("\n"),
            ],
            WriteMode::Append,
        );
        CrackOutcome::Recovered(KNOWN_PLAINTEXT.to_string())
    }
}

async fn pause(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
