use serde::Serialize;

/// Open/closed state for a list of collapsible items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Accordion {
    pub items: Vec<String>,
    pub open: Vec<String>,
    pub allow_multiple: bool,
}

impl Accordion {
    pub fn new<I, S>(items: I, default_open: Option<&str>, allow_multiple: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        let open = default_open
            .filter(|id| items.iter().any(|item| item == *id))
            .map(|id| vec![id.to_string()])
            .unwrap_or_default();
        Self {
            items,
            open,
            allow_multiple,
        }
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.open.iter().any(|open| open == id)
    }

    /// Opens or closes `id`. Without `allow_multiple`, opening an item closes
    /// every other one. Unknown ids are ignored.
    pub fn toggle(&mut self, id: &str) {
        if !self.items.iter().any(|item| item == id) {
            return;
        }
        if self.is_open(id) {
            self.open.retain(|open| open != id);
        } else if self.allow_multiple {
            self.open.push(id.to_string());
        } else {
            self.open = vec![id.to_string()];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEMS: [&str; 3] = ["tone-style", "content", "skills"];

    #[test]
    fn test_default_open() {
        let accordion = Accordion::new(ITEMS, Some("tone-style"), false);
        assert!(accordion.is_open("tone-style"));
        assert!(!accordion.is_open("content"));
    }

    #[test]
    fn test_unknown_default_opens_nothing() {
        let accordion = Accordion::new(ITEMS, Some("nope"), false);
        assert!(accordion.open.is_empty());
    }

    #[test]
    fn test_single_mode_keeps_one_open() {
        let mut accordion = Accordion::new(ITEMS, Some("tone-style"), false);
        accordion.toggle("content");
        assert_eq!(accordion.open, vec!["content"]);
        accordion.toggle("content");
        assert!(accordion.open.is_empty());
    }

    #[test]
    fn test_multiple_mode_accumulates() {
        let mut accordion = Accordion::new(ITEMS, None, true);
        accordion.toggle("content");
        accordion.toggle("skills");
        assert!(accordion.is_open("content") && accordion.is_open("skills"));
        accordion.toggle("content");
        assert_eq!(accordion.open, vec!["skills"]);
    }

    #[test]
    fn test_toggle_unknown_is_noop() {
        let mut accordion = Accordion::new(ITEMS, None, true);
        accordion.toggle("missing");
        assert!(accordion.open.is_empty());
    }
}
