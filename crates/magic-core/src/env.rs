//! `KEY=VALUE` environment lists as stored in an image config

/// Find `key`, returning its index and value. Entries without `=` never match.
pub fn get_env<'a>(env: &'a [String], key: &str) -> Option<(usize, &'a str)> {
    env.iter().enumerate().find_map(|(i, entry)| {
        let (k, v) = entry.split_once('=')?;
        (k == key).then_some((i, v))
    })
}

/// Set `key` to `value`, replacing the existing entry in place or appending
pub fn set_env(env: &mut Vec<String>, key: &str, value: &str) {
    let entry = format!("{}={}", key, value);
    match get_env(env, key).map(|(i, _)| i) {
        Some(i) => env[i] = entry,
        None => env.push(entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_get_env() {
        let list = env(&["PATH=/usr/bin", "MALFORMED", "EMPTY=", "X=a=b"]);
        assert_eq!(get_env(&list, "PATH"), Some((0, "/usr/bin")));
        assert_eq!(get_env(&list, "EMPTY"), Some((2, "")));
        assert_eq!(get_env(&list, "X"), Some((3, "a=b")));
        assert_eq!(get_env(&list, "MALFORMED"), None);
        assert_eq!(get_env(&list, "path"), None);
    }

    #[test]
    fn test_set_env_replaces_in_place() {
        let mut list = env(&["A=1", "B=2", "C=3"]);
        set_env(&mut list, "B", "20");
        assert_eq!(list, env(&["A=1", "B=20", "C=3"]));
    }

    #[test]
    fn test_set_env_appends_once() {
        let mut list = env(&["NOEQUALS"]);
        set_env(&mut list, "A", "1");
        set_env(&mut list, "A", "2");
        assert_eq!(list, env(&["NOEQUALS", "A=2"]));
    }
}
