//! Element name validation and on-disk marker conventions.
//!
//! Valid names:
//! - ASCII alphanumerics, dots (`.`), underscores (`_`) and hyphens (`-`)
//! - No path separators or other punctuation
//! - Not hidden: must not start with `.` or end with the reserved extension
//!
//! Hidden names are used for bookkeeping entries ([`DESCRIPTOR_FILE`],
//! [`RESERVED_MARKER`], ...) and are never shown as elements. The glossary,
//! table-of-contents and change-log names look hidden but are ordinary
//! document files.

/// Extension of the sibling entry that reserves a unit: `<unit>.rsvd`.
pub const RESERVED_EXT: &str = ".rsvd";

/// Marker entry created inside a directory to reserve a folder.
pub const RESERVED_MARKER: &str = ".rsvd";

/// Folder descriptor; its presence marks a genuine document folder.
pub const DESCRIPTOR_FILE: &str = ".dnfo";

/// Marker file at the root of every project.
pub const PROJECT_MARKER: &str = ".dipproject";

/// Prefix carried by disabled elements.
pub const DISABLED_PREFIX: &str = "dis.";

pub const GLOSSARY_NAME: &str = ".glossary";
pub const TOC_NAME: &str = ".toc";
pub const CHANGELOG_PREFIX: &str = ".changelog";

/// Extensions accepted when pasting report/schema attachments.
pub const ATTACHMENT_EXTENSIONS: [&str; 2] = [".report", ".xml"];

/// Validates an element name.
///
/// # Examples
/// ```
/// use dipkit::naming::{check_name, NameError};
///
/// assert!(check_name("010.txt").is_ok());
/// assert!(check_name("req-v2_final").is_ok());
/// assert!(check_name(".toc").is_ok());
///
/// assert_eq!(check_name(""), Err(NameError::Empty));
/// assert_eq!(check_name("a/b"), Err(NameError::InvalidChar('/')));
/// assert_eq!(check_name(".hidden"), Err(NameError::Hidden));
/// assert_eq!(check_name("old.rsvd"), Err(NameError::Hidden));
/// ```
pub fn check_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }

    if let Some(ch) = name.chars().find(|ch| !is_valid_name_char(*ch)) {
        return Err(NameError::InvalidChar(ch));
    }

    if is_special_name(name) {
        return Ok(());
    }

    if is_hidden(name) {
        return Err(NameError::Hidden);
    }

    Ok(())
}

fn is_valid_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' || ch == '-'
}

/// Glossary, table of contents and change logs.
pub fn is_special_name(name: &str) -> bool {
    name == GLOSSARY_NAME || name == TOC_NAME || name.starts_with(CHANGELOG_PREFIX)
}

/// True for bookkeeping entries that never become elements.
pub fn is_hidden(name: &str) -> bool {
    if is_special_name(name) {
        return false;
    }
    name.starts_with('.') || name.ends_with(RESERVED_EXT)
}

pub fn is_disabled(name: &str) -> bool {
    name.starts_with(DISABLED_PREFIX)
}

pub fn disabled_name(name: &str) -> String {
    format!("{}{}", DISABLED_PREFIX, name)
}

/// Strips the disable marker, if any.
pub fn enabled_name(name: &str) -> &str {
    name.strip_prefix(DISABLED_PREFIX).unwrap_or(name)
}

pub fn reserved_marker_name(name: &str) -> String {
    format!("{}{}", name, RESERVED_EXT)
}

/// For a `<unit>.rsvd` entry, the name of the reserved unit.
pub fn reserved_unit_name(entry: &str) -> Option<&str> {
    entry
        .strip_suffix(RESERVED_EXT)
        .filter(|stem| !stem.is_empty())
}

/// Case-insensitive extension check against [`ATTACHMENT_EXTENSIONS`].
pub fn has_attachment_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ATTACHMENT_EXTENSIONS
        .iter()
        .any(|ext| lower.len() > ext.len() && lower.ends_with(ext))
}

/// Error type for name validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Name is empty
    Empty,
    /// Name contains a character outside `[A-Za-z0-9._-]`
    InvalidChar(char),
    /// Name starts with `.` or ends with the reserved extension
    Hidden,
}

impl std::fmt::Display for NameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameError::Empty => write!(f, "name cannot be empty"),
            NameError::InvalidChar(ch) => write!(
                f,
                "name contains invalid character '{}' (only letters, digits, '.', '_' and '-' allowed)",
                ch
            ),
            NameError::Hidden => write!(f, "name would be hidden"),
        }
    }
}

impl std::error::Error for NameError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(check_name("req").is_ok());
        assert!(check_name("010.txt").is_ok());
        assert!(check_name("a-b_c.d").is_ok());
        assert!(check_name("dis.010.txt").is_ok());
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(check_name("a b"), Err(NameError::InvalidChar(' ')));
        assert_eq!(check_name("a\\b"), Err(NameError::InvalidChar('\\')));
        assert_eq!(check_name("ünit"), Err(NameError::InvalidChar('ü')));
        assert_eq!(check_name("x:y"), Err(NameError::InvalidChar(':')));
    }

    #[test]
    fn test_hidden_names() {
        assert_eq!(check_name(".git"), Err(NameError::Hidden));
        assert_eq!(check_name(".dnfo"), Err(NameError::Hidden));
        assert_eq!(check_name("010.txt.rsvd"), Err(NameError::Hidden));
    }

    #[test]
    fn test_special_names_pass() {
        assert!(check_name(".glossary").is_ok());
        assert!(check_name(".toc").is_ok());
        assert!(check_name(".changelog").is_ok());
        assert!(check_name(".changelog-2024").is_ok());
        assert!(!is_hidden(".toc"));
    }

    #[test]
    fn test_disabled_helpers() {
        assert!(is_disabled("dis.req"));
        assert!(!is_disabled("req"));
        assert_eq!(disabled_name("req"), "dis.req");
        assert_eq!(enabled_name("dis.req"), "req");
        assert_eq!(enabled_name("req"), "req");
    }

    #[test]
    fn test_reserved_helpers() {
        assert_eq!(reserved_marker_name("010.txt"), "010.txt.rsvd");
        assert_eq!(reserved_unit_name("010.txt.rsvd"), Some("010.txt"));
        assert_eq!(reserved_unit_name(".rsvd"), None);
        assert_eq!(reserved_unit_name("010.txt"), None);
    }

    #[test]
    fn test_attachment_extensions() {
        assert!(has_attachment_extension("summary.report"));
        assert!(has_attachment_extension("schema.XML"));
        assert!(!has_attachment_extension("notes.txt"));
        assert!(!has_attachment_extension(".xml"));
    }
}
