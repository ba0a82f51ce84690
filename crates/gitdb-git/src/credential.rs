//! SSH credential plumbing for git subprocesses.
//!
//! git itself only knows how to find keys on disk, so an [`SshKey`] is
//! written to private temp files for the lifetime of one subprocess and
//! passed to ssh through `GIT_SSH_COMMAND`. Host-key verification is turned
//! off for these connections.

use std::io::Write as _;
use std::process::Command;

use tempfile::TempPath;

use crate::error::GitError;
use crate::types::SshKey;

const PASSPHRASE_VAR: &str = "GITDB_SSH_PASSPHRASE";

/// Temp files and environment for one credentialed git invocation.
///
/// Dropping the session deletes the key material from disk.
pub struct SshSession {
    _key: TempPath,
    _askpass: Option<TempPath>,
    envs: Vec<(&'static str, String)>,
}

impl SshSession {
    pub fn prepare(auth: &SshKey) -> Result<Self, GitError> {
        let mut key = tempfile::Builder::new().prefix("gitdb-key-").tempfile()?;
        key.write_all(auth.private_key())?;
        if !auth.private_key().ends_with(b"\n") {
            key.write_all(b"\n")?;
        }
        key.flush()?;
        let key = key.into_temp_path();

        let ssh_command = format!(
            "ssh -i {} -o IdentitiesOnly=yes -o StrictHostKeyChecking=no \
             -o UserKnownHostsFile=/dev/null -o User={}",
            shell_quote(&key.to_string_lossy()),
            shell_quote(auth.user()),
        );
        let mut envs = vec![("GIT_SSH_COMMAND", ssh_command)];

        let askpass = if auth.passphrase().is_empty() {
            None
        } else {
            let script = askpass_script()?;
            envs.push(("SSH_ASKPASS", script.to_string_lossy().into_owned()));
            envs.push(("SSH_ASKPASS_REQUIRE", "force".to_owned()));
            envs.push((PASSPHRASE_VAR, auth.passphrase().to_owned()));
            Some(script)
        };

        Ok(Self {
            _key: key,
            _askpass: askpass,
            envs,
        })
    }

    pub fn apply(&self, cmd: &mut Command) {
        for (k, v) in &self.envs {
            cmd.env(k, v);
        }
    }
}

/// A tiny executable that prints the passphrase when ssh asks for it.
fn askpass_script() -> Result<TempPath, GitError> {
    let mut file = tempfile::Builder::new()
        .prefix("gitdb-askpass-")
        .suffix(".sh")
        .tempfile()?;
    writeln!(file, "#!/bin/sh\nprintf '%s\\n' \"${PASSPHRASE_VAR}\"")?;
    file.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o700))?;
    }

    // Close the handle before ssh executes the script.
    Ok(file.into_temp_path())
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
