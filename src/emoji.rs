//! `:alias:` resolution. The built-in table comes from the `emojis` crate;
//! a caller-supplied alias map is consulted first and may map to an image
//! URL for aliases with no Unicode rendering.

use rustc_hash::FxHashMap;

use crate::nodes::EmojiValue;

pub fn resolve(alias: &str, extra: &Option<FxHashMap<String, String>>) -> Option<EmojiValue> {
    if let Some(map) = extra {
        if let Some(value) = map.get(alias) {
            return Some(if looks_like_image(value) {
                EmojiValue::Image(value.clone())
            } else {
                EmojiValue::Unicode(value.clone())
            });
        }
    }

    emojis::get_by_shortcode(alias).map(|e| EmojiValue::Unicode(e.as_str().to_string()))
}

fn looks_like_image(value: &str) -> bool {
    value.contains('/') || value.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_and_custom() {
        assert_eq!(
            resolve("heart", &None),
            Some(EmojiValue::Unicode("\u{2764}\u{fe0f}".to_string()))
        );
        assert_eq!(resolve("no_such_alias_zzz", &None), None);

        let mut map = FxHashMap::default();
        map.insert("octocat".to_string(), "img/octocat.png".to_string());
        map.insert("shrug".to_string(), "🤷".to_string());
        let extra = Some(map);
        assert_eq!(
            resolve("octocat", &extra),
            Some(EmojiValue::Image("img/octocat.png".to_string()))
        );
        assert_eq!(
            resolve("shrug", &extra),
            Some(EmojiValue::Unicode("🤷".to_string()))
        );
    }
}
