use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::debug;
use url::{ParseError, Url};

/// Base used to check relative references.
///
/// Only used for validation, the reference itself is emitted as written.
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// Chars encoded in the fragment of a relative reference.
const FRAGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

/// Chars encoded in the query of a relative reference.
const QUERY: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'\'');

/// Chars encoded in the path of a relative reference.
const PATH: &AsciiSet = &QUERY.add(b'?').add(b'`').add(b'{').add(b'}');

/// Make `raw` safe to place in a `href` or `src` attribute.
///
/// Absolute urls are parsed and serialized again, which percent-encodes
/// anything that could break out of the attribute. Relative references
/// (`foo`, `../foo`, `/foo`, `//host/foo`) are percent-encoded as written,
/// dot segments included. Returns an empty string if `raw` is not a valid
/// url.
///
/// ```
/// use bb_html::safe_url;
///
/// assert_eq!(safe_url("<script>"), "%3Cscript%3E");
/// assert_eq!(safe_url("../a b"), "../a%20b");
/// assert_eq!(safe_url("http://[::1"), "");
/// ```
pub fn safe_url(raw: &str) -> String {
    let url = match Url::parse(raw) {
        Ok(v) => v.as_str().to_owned(),
        Err(ParseError::RelativeUrlWithoutBase) => match encode_relative(raw) {
            Some(v) => v,
            None => return String::new(),
        },
        Err(e) => {
            debug!("rejected url {raw:?}: {e}");
            return String::new();
        }
    };

    url.replace('\\', "%5C")
}

/// Percent-encode a relative reference without resolving it.
fn encode_relative(raw: &str) -> Option<String> {
    let base = Url::parse(RELATIVE_BASE).ok()?;
    if let Err(e) = base.join(raw) {
        debug!("rejected relative url {raw:?}: {e}");
        return None;
    }

    let raw = raw.trim_matches(|x: char| x <= ' ');
    let (rest, fragment) = match raw.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (raw, None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    // Backslashes act as slashes in http paths.
    let path = path.replace('\\', "/");
    let mut out = utf8_percent_encode(&path, PATH).to_string();
    if let Some(query) = query {
        out.push('?');
        out.extend(utf8_percent_encode(query, QUERY));
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.extend(utf8_percent_encode(fragment, FRAGMENT));
    }
    Some(out)
}
