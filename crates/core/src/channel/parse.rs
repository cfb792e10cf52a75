//! Classification of `sftp` client output.
//!
//! The `sftp` client reports most failures only as text on stderr and
//! frequently exits with status 0 anyway. All text matching against its
//! output lives here so the rest of the crate works with
//! [`ChannelError`] variants.

use super::error::ChannelError;

const PERMISSION_DENIED: &str = "Permission denied";
/// Failures of the local file or the client tools. These also mention
/// "No such file", so they are matched before the remote markers.
const LOCAL_MARKERS: &[&str] = &["local file", "open local", "sshpass:"];
/// Remote-side texts only; a bare "No such file" does not say which side.
const NOT_FOUND_MARKERS: &[&str] = &["Can't ls", "not found", "remote open"];
const FAILURE_MARKERS: &[&str] = &["Couldn't", "Connection closed", "Connection refused"];

/// Parses the output of an `ls -l <path>` batch command into a size.
pub fn parse_ls_output(path: &str, stdout: &str, stderr: &str) -> Result<u64, ChannelError> {
    if let Some(local) = local_failure(stderr) {
        return Err(local);
    }
    if NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m)) {
        return Err(ChannelError::not_found(path));
    }
    if stderr.contains(PERMISSION_DENIED) {
        return Err(ChannelError::permission_denied(summarize(stderr)));
    }

    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("sftp>"))
        .find_map(parse_listing_line)
        .ok_or_else(|| {
            ChannelError::unknown(format!(
                "no listing for {} (stdout: {:?}, stderr: {:?})",
                path,
                summarize(stdout),
                summarize(stderr)
            ))
        })
}

/// Classifies the output of a `get` or `put` batch session.
pub fn classify_copy_output(
    remote_path: &str,
    exit_success: bool,
    stderr: &str,
) -> Result<(), ChannelError> {
    if let Some(local) = local_failure(stderr) {
        return Err(local);
    }
    if stderr.contains(PERMISSION_DENIED) {
        return Err(ChannelError::permission_denied(summarize(stderr)));
    }
    if NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m)) {
        return Err(ChannelError::not_found(remote_path));
    }
    if FAILURE_MARKERS.iter().any(|m| stderr.contains(m)) {
        return Err(ChannelError::unknown(summarize(stderr)));
    }
    if !exit_success {
        return Err(ChannelError::unknown(format!(
            "sftp exited unsuccessfully: {}",
            summarize(stderr)
        )));
    }
    Ok(())
}

fn local_failure(stderr: &str) -> Option<ChannelError> {
    LOCAL_MARKERS
        .iter()
        .any(|m| stderr.contains(m))
        .then(|| ChannelError::local(summarize(stderr)))
}

/// Extracts the size column from one `ls -l` line.
///
/// `-rw-r--r--  1 owner group 5000 Jan  1 00:00 /ctr/file.qcow2`
fn parse_listing_line(line: &str) -> Option<u64> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 9 {
        return None;
    }
    let mode = fields[0];
    if mode.len() != 10 || !mode.starts_with(['-', 'l']) {
        return None;
    }
    fields[4].parse::<u64>().ok()
}

/// First non-empty line of a command output, for error details.
fn summarize(output: &str) -> String {
    output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .to_string()
}
