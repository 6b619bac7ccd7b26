use anyhow::{Context, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Characters left as-is by JavaScript's `encodeURIComponent`. WhatsApp
/// expects `%20` for spaces in the `text` parameter, not `+`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Build a `https://wa.me/<digits>?text=<message>` link
///
/// Anything that is not a digit (`+`, spaces, a `whatsapp:` prefix) is
/// dropped from the target number.
pub fn whatsapp_deep_link(target_number: &str, message: &str) -> Result<Url> {
    let digits: String = target_number.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        anyhow::bail!("Target number has no digits: {:?}", target_number);
    }

    let mut url = Url::parse("https://wa.me/").context("Invalid deep link base")?;
    url.set_path(&digits);
    let text = utf8_percent_encode(message, URI_COMPONENT);
    url.set_query(Some(&format!("text={}", text)));
    Ok(url)
}
