use std::borrow::Cow;
use std::collections::HashSet;
use unicode_categories::UnicodeCategories;

/// Converts heading text to canonical, unique, still human-readable anchor
/// ids. Keeps the anchors it has handed out, so use one per rendered
/// document.
///
/// ```
/// # use splitmark::Anchorizer;
/// let mut anchorizer = Anchorizer::new();
/// assert_eq!("stuff", anchorizer.anchorize("Stuff"));
/// assert_eq!("stuff-1", anchorizer.anchorize("Stuff"));
/// ```
#[derive(Debug, Default)]
pub struct Anchorizer(HashSet<String>);

impl Anchorizer {
    pub fn new() -> Self {
        Anchorizer(HashSet::new())
    }

    /// Lowercases, strips problem characters, turns spaces into dashes, and
    /// appends a numeric suffix when the result has been seen before.
    pub fn anchorize(&mut self, header: &str) -> String {
        fn is_permitted_char(&c: &char) -> bool {
            c == ' '
                || c == '-'
                || c.is_letter()
                || c.is_mark()
                || c.is_number()
                || c.is_punctuation_connector()
        }

        let mut id = header.to_lowercase();
        id = id
            .chars()
            .filter(is_permitted_char)
            .map(|c| if c == ' ' { '-' } else { c })
            .collect();

        let mut uniq = 0;
        id = loop {
            let anchor = if uniq == 0 {
                Cow::from(&id)
            } else {
                Cow::from(format!("{}-{}", id, uniq))
            };

            if !self.0.contains(&*anchor) {
                break anchor.into_owned();
            }

            uniq += 1;
        };
        self.0.insert(id.clone());
        id
    }
}
