//! Path helpers that work on plain strings.
//!
//! Build files come from Windows machines as often as not, so `std::path` is no
//! use here: on Unix it would treat `C:\Test\Test.csproj` as a single segment.
//! Both `\` and `/` count as separators everywhere in this module.

/// How path prefixes are compared.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PathMatch {
    CaseSensitive,
    /// ASCII case folding, matching the filesystems MSBuild projects live on.
    #[default]
    CaseInsensitive,
}

pub fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Everything before the last separator, or `""` for a bare file name.
///
/// A file directly under a rooted path keeps the root: `/App.csproj` gives `/`.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind(is_separator) {
        Some(0) => &path[..1],
        Some(idx) => &path[..idx],
        None => "",
    }
}

pub fn file_name(path: &str) -> &str {
    match path.rfind(is_separator) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Drive-qualified (`C:\`), UNC (`\\server`) or rooted (`/usr`) paths.
pub fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    if bytes.first().is_some_and(|b| is_separator(*b as char)) {
        return true;
    }
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && is_separator(bytes[2] as char)
}

/// Joins `relative` onto `base`, reusing the separator style of `base`.
///
/// `.` and `..` segments of `relative` are resolved lexically; `..` never
/// climbs above the first segment of `base`.
pub fn join(base: &str, relative: &str) -> String {
    if base.is_empty() {
        return relative.to_string();
    }
    let windows = base.contains('\\')
        || base.ends_with(':')
        || (!base.contains('/') && relative.contains('\\'));
    let sep = if windows { '\\' } else { '/' };

    let mut joined = base.trim_end_matches(is_separator).to_string();
    for segment in relative.split(is_separator) {
        match segment {
            "" | "." => {}
            ".." => {
                if let Some(idx) = joined.rfind(is_separator) {
                    joined.truncate(idx);
                }
            }
            _ => {
                joined.push(sep);
                joined.push_str(segment);
            }
        }
    }
    joined
}

/// True when `path` lies below `dir`, matching whole segments only.
///
/// `C:\TestOther\Qux.cs` is not under `C:\Test`. An empty `dir` contains
/// nothing; a bare root (`/`) contains every rooted path.
pub fn starts_with_dir(path: &str, dir: &str, matching: PathMatch) -> bool {
    if dir.is_empty() {
        return false;
    }
    let dir = dir.trim_end_matches(is_separator);
    if dir.is_empty() {
        return path
            .strip_prefix(is_separator)
            .is_some_and(|tail| !tail.is_empty());
    }
    let (Some(head), Some(rest)) = (path.get(..dir.len()), path.get(dir.len()..)) else {
        return false;
    };
    match rest.strip_prefix(is_separator) {
        Some(tail) if !tail.is_empty() => segments_equal(head, dir, matching),
        _ => false,
    }
}

fn segments_equal(a: &str, b: &str, matching: PathMatch) -> bool {
    a.len() == b.len()
        && a.chars().zip(b.chars()).all(|(x, y)| {
            if is_separator(x) && is_separator(y) {
                return true;
            }
            match matching {
                PathMatch::CaseSensitive => x == y,
                PathMatch::CaseInsensitive => x.eq_ignore_ascii_case(&y),
            }
        })
}
