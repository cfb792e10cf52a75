//! Parsing of remote process listings.

/// Counts `ps -elf` lines whose command matches `pattern`.
///
/// The header line, blank lines, and the `grep`/`ssh`/`sshpass` lines
/// that a piped or wrapped listing can contain are never counted.
pub fn count_matching_processes(ps_output: &str, pattern: &str) -> usize {
    ps_output
        .lines()
        .filter(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with("F S ") || !line.contains(pattern) {
                return false;
            }
            !command_of(line)
                .split_whitespace()
                .next()
                .map(is_listing_noise)
                .unwrap_or(true)
        })
        .count()
}

/// `ps -elf` has 14 fields before CMD; shorter lines keep the whole line.
fn command_of(line: &str) -> &str {
    let mut rest = line;
    for _ in 0..14 {
        rest = rest.trim_start();
        match rest.find(char::is_whitespace) {
            Some(pos) => rest = &rest[pos..],
            None => return line,
        }
    }
    rest.trim_start()
}

fn is_listing_noise(program: &str) -> bool {
    let name = program.rsplit('/').next().unwrap_or(program);
    matches!(name, "grep" | "ssh" | "sshd:" | "sshpass" | "ps")
}
