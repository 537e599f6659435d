//! Directory listing line parsers

/// File name from an MLSD fact line such as
/// `type=file;size=1024;modify=20240301101500; kill_20240301.log`
///
/// Directory entries (`type=dir`, `cdir`, `pdir`) yield `None`.
pub fn mlsd_file_name(line: &str) -> Option<&str> {
    let (facts, name) = line.split_once(' ')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let is_dir = facts.split(';').any(|fact| {
        let Some((key, value)) = fact.split_once('=') else {
            return false;
        };
        key.eq_ignore_ascii_case("type")
            && matches!(value.to_ascii_lowercase().as_str(), "dir" | "cdir" | "pdir")
    });

    (!is_dir).then_some(name)
}

/// File name from a unix-style LIST line (last of nine columns)
///
/// Directories (mode starting with `d`) and unparsable lines yield `None`.
pub fn list_file_name(line: &str) -> Option<&str> {
    let mut rest = line.trim_start();
    let mut mode = "";
    for column in 0..8 {
        let end = rest.find(char::is_whitespace)?;
        if column == 0 {
            mode = &rest[..end];
        }
        rest = rest[end..].trim_start();
    }

    if mode.starts_with('d') {
        return None;
    }
    let name = rest.trim_end();
    (!name.is_empty()).then_some(name)
}

/// Name from an NLST entry, which some servers return with a path prefix
pub fn nlst_file_name(entry: &str) -> Option<&str> {
    let name = entry.trim().rsplit('/').next()?;
    (!name.is_empty()).then_some(name)
}
