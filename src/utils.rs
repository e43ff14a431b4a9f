use std::path::PathBuf;

/// `<home>/chronicle_gm/data`, where settings and the log file live.
pub fn get_data_dir() -> Option<PathBuf> {
    dir::home_dir().map(|home| home.join("chronicle_gm").join("data"))
}

/// Shows only the head and tail of a secret, for logs and prompts.
pub fn hide_api_key(key: &str) -> String {
    let head_len = 4;
    let tail_len = 3;

    if key.len() < head_len + tail_len + 3 || !key.is_ascii() {
        return "*".repeat(key.chars().count());
    }

    format!("{}...{}", &key[..head_len], &key[key.len() - tail_len..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_keys_keep_head_and_tail() {
        assert_eq!(hide_api_key("AIzaSyExampleKey123"), "AIza...123");
    }

    #[test]
    fn short_keys_are_fully_masked() {
        assert_eq!(hide_api_key("abc"), "***");
        assert_eq!(hide_api_key(""), "");
    }
}
