pub const RND: &str = "/rnd";
pub const HELP: &str = "/help";
pub const START: &str = "/start";

/// A classified chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    AddPage(String),
    Random,
    Help,
    Start,
    Unknown,
}

impl Command {
    /// Classify trimmed message text. URL-shaped text always wins.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        if is_add_cmd(text) {
            return Command::AddPage(text.to_string());
        }

        match text {
            RND => Command::Random,
            HELP => Command::Help,
            START => Command::Start,
            _ => Command::Unknown,
        }
    }
}

/// Absolute URL with a non-empty host.
fn is_add_cmd(text: &str) -> bool {
    url::Url::parse(text)
        .ok()
        .and_then(|u| u.host_str().map(|h| !h.is_empty()))
        .unwrap_or(false)
}
