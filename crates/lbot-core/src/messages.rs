//! User-facing reply texts.

pub const HELP: &str = "I save and keep your pages.\n\
To save page, send it to me.\n\
To get random page use /rnd.\n\
After /rnd the page will be removed from your list!!!";

pub fn hello() -> String {
    format!("Hi!\n\n{HELP}")
}

pub const UNKNOWN_COMMAND: &str = "Unknown command";
pub const NO_SAVED_PAGES: &str = "You have no saved pages";
pub const SAVED: &str = "Saved";
pub const ALREADY_EXISTS: &str = "The page is already in your list";
pub const NO_USERNAME: &str = "Set a Telegram username to save and get pages";
