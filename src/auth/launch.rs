/// Startup switches carried in a launch query string such as
/// `?guest=true&logout=true`.
///
/// Only the literal value `true` enables a flag. When a parameter repeats,
/// the first occurrence wins. Unknown parameters are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchFlags {
    pub guest: bool,
    pub logout: bool,
}

impl LaunchFlags {
    pub fn from_query(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let mut guest: Option<bool> = None;
        let mut logout: Option<bool> = None;

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode(raw_key);
            let enabled = decode(raw_value) == "true";
            match key.as_str() {
                "guest" => {
                    guest.get_or_insert(enabled);
                }
                "logout" => {
                    logout.get_or_insert(enabled);
                }
                _ => {}
            }
        }

        LaunchFlags {
            guest: guest.unwrap_or(false),
            logout: logout.unwrap_or(false),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.guest && !self.logout
    }
}

fn decode(s: &str) -> String {
    let plus_as_space = s.replace('+', " ");
    urlencoding::decode(&plus_as_space)
        .map(|c| c.into_owned())
        .unwrap_or(plus_as_space)
}
